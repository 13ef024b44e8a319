//! Assembly of the map model: start view, tile layer, capital markers and
//! population-colored regions.

use crate::capitals::parse_capitals;
use crate::classify::PopulationScale;
use crate::config::{AppConfig, TileConfig};
use crate::table::Table;
use crate::types::{Capital, Marker, StyledRegion};
use anyhow::{Context, Result};
use geojson::Feature;
use rayon::prelude::*;
use tracing::debug;

pub const CAPITALS_LAYER: &str = "Capitals";
pub const POPULATION_LAYER: &str = "Population";

#[derive(Debug, Clone)]
pub struct WorldMap {
    pub center: [f64; 2],
    pub zoom_start: u8,
    pub tiles: TileConfig,
    pub capitals: Vec<Marker>,
    pub regions: Vec<StyledRegion>,
}

/// Popup for a capital marker: a link to the city's Wikipedia search page.
/// The name is percent-encoded in the link and HTML-escaped in the text.
pub fn popup_html(city_name: &str) -> String {
    let query = urlencoding::encode(city_name);
    let name = escape_html(city_name);
    format!(
        r#"<a href="https://en.wikipedia.org/wiki/Special:Search/{query}" target="_blank">{name}</a>"#
    )
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// One marker per capital, in the order given.
pub fn capital_markers(capitals: &[Capital]) -> Vec<Marker> {
    capitals
        .iter()
        .map(|capital| Marker {
            location: [capital.latitude, capital.longitude],
            popup: popup_html(&capital.name),
        })
        .collect()
}

/// Classifies every feature. Fails if any feature's population cannot be
/// read; the error names that feature's index.
pub fn style_regions(features: Vec<Feature>, scale: &PopulationScale) -> Result<Vec<StyledRegion>> {
    features
        .into_par_iter()
        .enumerate()
        .map(|(index, feature)| {
            let style = scale
                .style_for(feature.properties.as_ref())
                .with_context(|| format!("Population feature #{}", index))?;
            Ok(StyledRegion { feature, style })
        })
        .collect()
}

pub fn build_world_map(config: &AppConfig, table: &Table, features: Vec<Feature>) -> Result<WorldMap> {
    let capitals = parse_capitals(table).context("Failed to read capitals")?;
    let markers = capital_markers(&capitals);
    debug!("Added {} layer with {} markers", CAPITALS_LAYER, markers.len());

    let regions = style_regions(features, &config.scale)?;
    debug!("Added {} layer with {} regions", POPULATION_LAYER, regions.len());

    Ok(WorldMap {
        center: [config.starting_point_latitude, config.starting_point_longitude],
        zoom_start: config.zoom_start,
        tiles: config.tiles.clone(),
        capitals: markers,
        regions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn feature(population: serde_json::Value) -> Feature {
        let mut properties = Map::new();
        properties.insert("POP2005".to_string(), population);
        Feature {
            bbox: None,
            geometry: None,
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }

    #[test]
    fn popup_links_to_search() {
        assert_eq!(
            popup_html("Riga"),
            r#"<a href="https://en.wikipedia.org/wiki/Special:Search/Riga" target="_blank">Riga</a>"#
        );
    }

    #[test]
    fn popup_escapes_markup() {
        let popup = popup_html("<b>Tom & Jerry</b>");
        assert!(popup.contains("&lt;b&gt;Tom &amp; Jerry&lt;/b&gt;"));
        assert!(!popup.contains("<b>"));
    }

    #[test]
    fn popup_link_encodes_name() {
        let popup = popup_html("Saint John's/Antigua?#1");

        assert!(popup.contains(
            r#"href="https://en.wikipedia.org/wiki/Special:Search/Saint%20John%27s%2FAntigua%3F%231""#
        ));
        assert!(popup.contains(">Saint John&#39;s/Antigua?#1</a>"));
    }

    #[test]
    fn markers_keep_capital_order() {
        let capitals = vec![
            Capital { name: "Riga".into(), latitude: 56.949649, longitude: 24.105186 },
            Capital { name: "Vilnius".into(), latitude: 54.687156, longitude: 25.279651 },
        ];

        let markers = capital_markers(&capitals);

        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].location, [56.949649, 24.105186]);
        assert!(markers[1].popup.contains("Vilnius"));
    }

    #[test]
    fn regions_are_styled_in_order() {
        let features = (0..50).map(|i| feature(json!(i * 1_000_000))).collect();

        let regions = style_regions(features, &PopulationScale::default()).unwrap();

        assert_eq!(regions.len(), 50);
        assert_eq!(regions[0].style.fill_color, "grey");
        assert_eq!(regions[1].style.fill_color, "blue");
        assert_eq!(regions[5].style.fill_color, "green");
        assert_eq!(regions[49].style.fill_color, "yellow");
    }

    #[test]
    fn any_bad_region_is_named_in_error() {
        let features = vec![feature(json!(10)), feature(json!(-1)), feature(json!("n/a"))];

        let err = format!("{:#}", style_regions(features, &PopulationScale::default()).unwrap_err());

        assert!(err.contains("#1") || err.contains("#2"), "{}", err);
    }

    #[test]
    fn bad_region_fails_whole_layer() {
        let features = vec![feature(json!(10)), feature(json!("n/a"))];

        let err = style_regions(features, &PopulationScale::default()).unwrap_err();

        assert!(format!("{:#}", err).contains("#1"));
    }
}
