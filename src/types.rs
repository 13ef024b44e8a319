use geojson::Feature;
use serde::Serialize;

/// A capital city and where to put its marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Capital {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Style applied to one population polygon. Serialises to the Leaflet
/// path-options shape, e.g. `{"fillColor": "blue"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionStyle {
    #[serde(rename = "fillColor")]
    pub fill_color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub location: [f64; 2],
    pub popup: String,
}

#[derive(Debug, Clone)]
pub struct StyledRegion {
    pub feature: Feature,
    pub style: RegionStyle,
}
