use indicatif::ParallelProgressIterator;
use rayon::prelude::*;

use crate::geofile::feature::Feature;

use super::{
    footprint::{flatten_exterior_rings, BuildingPoint},
    height::{resolve_building_height, HeightParams},
};

/// Extract the footprint points of all polygonal features.
///
/// Features are processed in parallel, the result keeps the input order: features first, then the order of
/// points within each feature. Features without a Polygon or MultiPolygon geometry contribute no points.
pub fn extract_building_points(features: &[Feature], params: &HeightParams) -> Vec<BuildingPoint> {
    let num_buildings = features
        .iter()
        .filter(|feature| feature.is_polygonal())
        .count();
    if num_buildings != features.len() {
        log::info!(
            "Out of {} features, {} have a Polygon or MultiPolygon geometry.",
            features.len(),
            num_buildings
        )
    }

    features
        .par_iter()
        .progress_count(features.len() as u64)
        .flat_map_iter(|feature| extract_feature_points(feature, params))
        .collect()
}

/// Points of a single feature, or nothing if the feature is not a building footprint.
pub fn extract_feature_points(feature: &Feature, params: &HeightParams) -> Vec<BuildingPoint> {
    match &feature.geometry {
        Some(geometry) if feature.is_polygonal() => {
            let height = resolve_building_height(&feature.attributes, params);
            flatten_exterior_rings(geometry, height)
        }
        _ => Vec::new(),
    }
}
