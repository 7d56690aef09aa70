use crate::dataset::{normalize_category, Dataset};
use crate::error::AppResult;
use crate::models::{DensityLevel, Marker, MarkerLayer};

pub const MAP_CENTER: [f64; 2] = [21.4225, 39.8262];
pub const MAP_ZOOM: u8 = 12;
pub const MARKER_RADIUS: u8 = 7;
const UNKNOWN_COLOR: &str = "gray";

pub fn density_color(level: Option<DensityLevel>) -> &'static str {
    match level {
        Some(DensityLevel::High) => "red",
        Some(DensityLevel::Medium) => "orange",
        Some(DensityLevel::Low) => "green",
        None => UNKNOWN_COLOR,
    }
}

pub fn density_severity(level: Option<DensityLevel>) -> u8 {
    match level {
        Some(DensityLevel::High) => 3,
        Some(DensityLevel::Medium) => 2,
        Some(DensityLevel::Low) => 1,
        None => 0,
    }
}

/// Colour-coded markers for every record with coordinates and a density.
///
/// Fails only when the dataset never had the geospatial columns.
pub fn build_markers(dataset: &Dataset) -> AppResult<Vec<Marker>> {
    dataset.require_geo_columns()?;

    let markers: Vec<Marker> = dataset
        .records
        .iter()
        .filter_map(|record| {
            let latitude = record.latitude?;
            let longitude = record.longitude?;
            let density = record.crowd_density.as_deref().and_then(normalize_category)?;
            let level = DensityLevel::from_label(&density);
            Some(Marker {
                latitude,
                longitude,
                color: density_color(level),
                severity: density_severity(level),
                label: format!("Density: {density}"),
            })
        })
        .collect();

    tracing::debug!(
        records = dataset.records.len(),
        markers = markers.len(),
        "markers prepared"
    );
    Ok(markers)
}

pub fn marker_layer(dataset: &Dataset) -> AppResult<MarkerLayer> {
    Ok(MarkerLayer {
        center: MAP_CENTER,
        zoom: MAP_ZOOM,
        radius: MARKER_RADIUS,
        markers: build_markers(dataset)?,
    })
}

/// `[lat, lon, weight]` triples for a heat layer, weighted by density severity.
pub fn heat_points(markers: &[Marker]) -> Vec<[f64; 3]> {
    markers
        .iter()
        .map(|m| [m.latitude, m.longitude, f64::from(m.severity)])
        .collect()
}
