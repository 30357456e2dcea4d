use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::geofile::feature::FeatureMap;

/// Attribute holding the building height in meters.
pub const HEIGHT_KEY: &str = "height";
/// Attribute holding the number of storeys above ground.
pub const LEVELS_KEY: &str = "building:levels";

/// Parameters for deriving a height when a building does not state one.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct HeightParams {
    /// Height of one storey, multiplied with the `building:levels` attribute.
    pub storey_height_m: f64,
    /// Height used when neither `height` nor `building:levels` is usable.
    pub default_height_m: f64,
}

impl Default for HeightParams {
    fn default() -> Self {
        Self {
            storey_height_m: 3.0,
            default_height_m: 3.0,
        }
    }
}

/// Determine the height of a building from its attributes.
///
/// Precedence:
/// 1. a numeric `height` attribute, as is.
/// 2. a numeric `building:levels` attribute, times `params.storey_height_m`.
/// 3. `params.default_height_m`.
///
/// Values which are not numeric fall through to the next rule, see `numeric_attribute`.
pub fn resolve_building_height(attributes: &FeatureMap, params: &HeightParams) -> f64 {
    if let Some(height) = numeric_attribute(attributes, HEIGHT_KEY) {
        return height;
    }
    if let Some(levels) = numeric_attribute(attributes, LEVELS_KEY) {
        return levels * params.storey_height_m;
    }
    params.default_height_m
}

/// Read an attribute as a finite number. JSON numbers are taken as is, strings are parsed after trimming
/// whitespace. Anything else, including strings with units like "12 m", yields `None`.
///
/// Booleans and non-finite values ("nan", "inf") are rejected on purpose so that they fall through to the
/// next height rule instead of ending up in the table.
pub fn numeric_attribute(attributes: &FeatureMap, key: &str) -> Option<f64> {
    let value = match attributes.get(key)? {
        JsonValue::Number(number) => number.as_f64(),
        JsonValue::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    value.is_finite().then_some(value)
}
