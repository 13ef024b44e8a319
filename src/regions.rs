//! Loading of the population polygons (GeoJSON or Shapefile).

use anyhow::{anyhow, Context, Result};
use geo::MultiPolygon;
use geojson::{Feature, GeoJson, Geometry};
use serde_json::{Map, Number, Value};
use shapefile::dbase::FieldValue;
use shapefile::{Reader, Shape};
use std::fs;
use std::path::Path;
use tracing::info;

/// Loads every feature of a polygon dataset, dispatching on the file
/// extension.
pub fn load_regions(path: &Path) -> Result<Vec<Feature>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .ok_or_else(|| anyhow!("Population file has no extension: {:?}", path))?;

    let features = match extension.as_str() {
        "json" | "geojson" => load_geojson(path)?,
        "shp" => load_shapefile(path)?,
        _ => return Err(anyhow!("Unsupported population format: {}", extension)),
    };

    info!("Loaded {} population features", features.len());
    Ok(features)
}

fn load_geojson(path: &Path) -> Result<Vec<Feature>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to open GeoJSON file: {:?}", path))?;
    parse_geojson(&text).with_context(|| format!("Failed to parse GeoJSON file: {:?}", path))
}

/// Parses a FeatureCollection. A leading byte order mark is ignored.
pub fn parse_geojson(text: &str) -> Result<Vec<Feature>> {
    let geojson: GeoJson = text.trim_start_matches('\u{feff}').parse()?;
    match geojson {
        GeoJson::FeatureCollection(fc) => Ok(fc.features),
        _ => Err(anyhow!("GeoJSON must be a FeatureCollection")),
    }
}

fn load_shapefile(path: &Path) -> Result<Vec<Feature>> {
    let mut reader = Reader::from_path(path)
        .with_context(|| format!("Failed to open Shapefile: {:?}", path))?;

    let mut features = Vec::new();
    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result?;

        let geometry = match shape {
            Shape::Polygon(polygon) => Some(polygon_geometry(polygon.try_into())?),
            Shape::PolygonM(polygon) => Some(polygon_geometry(polygon.try_into())?),
            Shape::PolygonZ(polygon) => Some(polygon_geometry(polygon.try_into())?),
            _ => None,
        };

        let properties: Map<String, Value> = record
            .into_iter()
            .map(|(name, value)| (name, field_to_json(value)))
            .collect();

        features.push(Feature {
            bbox: None,
            geometry,
            id: None,
            properties: Some(properties),
            foreign_members: None,
        });
    }

    Ok(features)
}

fn polygon_geometry<E: std::fmt::Debug>(converted: Result<MultiPolygon<f64>, E>) -> Result<Geometry> {
    let polygon = converted.map_err(|e| anyhow!("Failed to convert polygon: {:?}", e))?;
    Ok(Geometry::new(geojson::Value::from(&polygon)))
}

fn field_to_json(value: FieldValue) -> Value {
    let number = |n: f64| Number::from_f64(n).map_or(Value::Null, Value::Number);
    match value {
        FieldValue::Character(Some(s)) => Value::String(s.trim_end().to_string()),
        FieldValue::Memo(s) => Value::String(s),
        FieldValue::Numeric(Some(n)) | FieldValue::Double(n) | FieldValue::Currency(n) => number(n),
        FieldValue::Float(Some(f)) => number(f64::from(f)),
        FieldValue::Integer(i) => Value::from(i),
        FieldValue::Logical(Some(b)) => Value::Bool(b),
        FieldValue::Date(Some(d)) => {
            Value::String(format!("{:04}-{:02}-{:02}", d.year(), d.month(), d.day()))
        }
        _ => Value::Null,
    }
}
