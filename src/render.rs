use crate::map::{WorldMap, CAPITALS_LAYER, POPULATION_LAYER};
use crate::types::StyledRegion;
use anyhow::{Context, Result};
use geojson::{Feature, FeatureCollection};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

const LEAFLET_VERSION: &str = "1.9.4";

/// Renders the map as a standalone HTML page backed by Leaflet.
pub fn render_html(map: &WorldMap) -> Result<String> {
    let population = FeatureCollection {
        bbox: None,
        features: map.regions.iter().map(styled_feature).collect::<Result<_>>()?,
        foreign_members: None,
    };

    let center = script_json(&map.center)?;
    let tile_url = script_json(&map.tiles.url)?;
    let tile_options = script_json(&serde_json::json!({ "attribution": map.tiles.attribution }))?;
    let markers = script_json(&map.capitals)?;
    let regions = script_json(&population)?;
    let capitals_name = script_json(CAPITALS_LAYER)?;
    let population_name = script_json(POPULATION_LAYER)?;
    let zoom = map.zoom_start;

    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<link rel="stylesheet" href="https://unpkg.com/leaflet@{LEAFLET_VERSION}/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@{LEAFLET_VERSION}/dist/leaflet.js"></script>
<style>html, body, #map {{ width: 100%; height: 100%; margin: 0; padding: 0; }}</style>
</head>
<body>
<div id="map"></div>
<script>
var map = L.map("map").setView({center}, {zoom});
L.tileLayer({tile_url}, {tile_options}).addTo(map);

var capitals = L.featureGroup();
{markers}.forEach(function (m) {{
    L.marker(m.location).bindPopup(m.popup).addTo(capitals);
}});
capitals.addTo(map);

var population = L.featureGroup();
L.geoJSON({regions}, {{
    style: function (feature) {{ return feature.properties.style; }}
}}).addTo(population);
population.addTo(map);

var overlays = {{}};
overlays[{capitals_name}] = capitals;
overlays[{population_name}] = population;
L.control.layers(null, overlays).addTo(map);
</script>
</body>
</html>
"#
    ))
}

/// Copies the region style into `properties.style` for the page script.
fn styled_feature(region: &StyledRegion) -> Result<Feature> {
    let mut feature = region.feature.clone();
    let style = serde_json::to_value(&region.style)?;
    feature
        .properties
        .get_or_insert_with(Default::default)
        .insert("style".to_string(), style);
    Ok(feature)
}

/// JSON for embedding inside a `<script>` element.
fn script_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let json = serde_json::to_string(value).context("Failed to serialize map data")?;
    Ok(json.replace("</", "<\\/"))
}

/// Renders the whole page before touching the file system, so a failure
/// leaves no partial output behind.
pub fn save(map: &WorldMap, path: &Path) -> Result<()> {
    let html = render_html(map)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {:?}", parent))?;
    }
    info!("Saving map to {:?}", path);
    fs::write(path, html).with_context(|| format!("Failed to write map: {:?}", path))?;
    Ok(())
}
