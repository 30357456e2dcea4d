/// Attributes of a feature, keyed by property name. Values keep their JSON type, e.g. OSM tags are strings while
/// other exporters write numbers.
pub type FeatureMap = geojson::JsonObject;

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// `None` when the feature has no geometry, or its geometry could not be parsed.
    pub geometry: Option<geojson::Value>,
    pub attributes: FeatureMap,
}

impl Feature {
    pub fn new_with_attributes(geometry: Option<geojson::Value>, attributes: FeatureMap) -> Self {
        Self {
            geometry,
            attributes,
        }
    }

    /// Whether the geometry is a Polygon or MultiPolygon, i.e. the feature can describe a building footprint.
    pub fn is_polygonal(&self) -> bool {
        matches!(
            self.geometry,
            Some(geojson::Value::Polygon(_)) | Some(geojson::Value::MultiPolygon(_))
        )
    }
}
