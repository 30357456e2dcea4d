use anyhow::{anyhow, Context};
use serde_json::Value as JsonValue;
use std::{fs, path::Path};

use super::feature::{Feature, FeatureMap};

/// Read all features of a GeoJSON document. Accepts a FeatureCollection or a single Feature.
///
/// Only a document that is not JSON, or not a JSON object, is an error. Features with a missing or unparseable
/// geometry are kept with `geometry: None`, features with missing properties get an empty attribute map.
pub fn read_features_from_geojson(filepath: &Path) -> anyhow::Result<Vec<Feature>> {
    let contents = fs::read_to_string(filepath)
        .with_context(|| format!("Reading GeoJSON file {:?}", filepath))?;
    parse_features_from_str(&contents)
        .with_context(|| format!("Parsing GeoJSON file {:?}", filepath))
}

pub fn parse_features_from_str(contents: &str) -> anyhow::Result<Vec<Feature>> {
    let document: JsonValue = serde_json::from_str(contents)?;
    let mut document = match document {
        JsonValue::Object(object) => object,
        other => {
            return Err(anyhow!(
                "Expected a GeoJSON object at top level, found {}",
                json_type_name(&other)
            ))
        }
    };

    if document.get("type").and_then(JsonValue::as_str) == Some("Feature") {
        return Ok(vec![feature_from_json_object(document)]);
    }

    let features = match document.remove("features") {
        Some(JsonValue::Array(features)) => features,
        Some(other) => {
            return Err(anyhow!(
                "Expected 'features' to be an array, found {}",
                json_type_name(&other)
            ))
        }
        None => {
            log::warn!("GeoJSON document has no 'features' member, no features read.");
            return Ok(Vec::new());
        }
    };

    let num_entries = features.len();
    let features: Vec<Feature> = features
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match value {
            JsonValue::Object(object) => Some(feature_from_json_object(object)),
            other => {
                log::warn!(
                    "Skipping feature {}, expected an object but found {}",
                    index,
                    json_type_name(&other)
                );
                None
            }
        })
        .collect();
    if features.len() != num_entries {
        log::warn!(
            "Out of {} entries in 'features', only {} were objects.",
            num_entries,
            features.len()
        )
    }
    Ok(features)
}

fn feature_from_json_object(mut object: FeatureMap) -> Feature {
    let geometry = match object.remove("geometry") {
        None | Some(JsonValue::Null) => None,
        Some(mut geometry) => {
            drop_invalid_polygon_positions(&mut geometry);
            match geojson::Geometry::from_json_value(geometry) {
                Ok(geometry) => Some(geometry.value),
                Err(err) => {
                    log::warn!("Ignoring invalid geometry: {}", err);
                    None
                }
            }
        }
    };
    let attributes = match object.remove("properties") {
        Some(JsonValue::Object(properties)) => properties,
        _ => FeatureMap::new(),
    };
    Feature::new_with_attributes(geometry, attributes)
}

/// Remove the malformed positions of a Polygon or MultiPolygon so that one bad vertex does not invalidate the
/// whole footprint. A position keeps its leading numeric ordinates and is dropped if fewer than two remain,
/// rings which are not arrays are dropped. Other geometry types are left to the GeoJSON parser as is.
fn drop_invalid_polygon_positions(geometry: &mut JsonValue) {
    let ring_nesting = match geometry.get("type").and_then(JsonValue::as_str) {
        Some("Polygon") => 1,
        Some("MultiPolygon") => 2,
        _ => return,
    };
    if let Some(coordinates) = geometry.get_mut("coordinates") {
        retain_valid_positions(coordinates, ring_nesting);
    }
}

/// `nesting` is the number of array levels above the positions, 0 meaning `value` is a ring.
fn retain_valid_positions(value: &mut JsonValue, nesting: usize) {
    let items = match value {
        JsonValue::Array(items) => items,
        _ => return,
    };
    if nesting == 0 {
        let num_positions = items.len();
        items.retain_mut(truncate_to_numeric_ordinates);
        if items.len() != num_positions {
            log::debug!(
                "Dropped {} of {} positions without two numeric ordinates",
                num_positions - items.len(),
                num_positions
            );
        }
    } else {
        items.retain(JsonValue::is_array);
        for item in items.iter_mut() {
            retain_valid_positions(item, nesting - 1);
        }
    }
}

/// Cut a position down to its leading numbers. Returns whether it still has a longitude and latitude.
fn truncate_to_numeric_ordinates(position: &mut JsonValue) -> bool {
    match position {
        JsonValue::Array(ordinates) => {
            let num_numeric = ordinates
                .iter()
                .take_while(|ordinate| ordinate.is_number())
                .count();
            ordinates.truncate(num_numeric);
            num_numeric >= 2
        }
        _ => false,
    }
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
