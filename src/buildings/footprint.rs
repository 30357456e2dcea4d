use serde::Serialize;

/// A vertex of a building footprint, tagged with the height of the building it belongs to.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct BuildingPoint {
    longitude: f64,
    latitude: f64,
    #[serde(rename = "height_meters")]
    height: f64,
}

impl BuildingPoint {
    pub fn new(longitude: f64, latitude: f64, height: f64) -> Self {
        Self {
            longitude,
            latitude,
            height,
        }
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn height(&self) -> f64 {
        self.height
    }
}

impl From<&BuildingPoint> for geo::Point {
    fn from(point: &BuildingPoint) -> Self {
        geo::Point::new(point.longitude, point.latitude)
    }
}

/// Flatten the exterior rings of a Polygon or MultiPolygon into points with the given height.
///
/// Interior rings (holes) are ignored. MultiPolygon members are visited in order. Positions with less than two
/// ordinates are skipped, a third ordinate (altitude) is ignored. Other geometry types yield no points.
pub fn flatten_exterior_rings(geometry: &geojson::Value, height: f64) -> Vec<BuildingPoint> {
    match geometry {
        geojson::Value::Polygon(rings) => exterior_ring_points(rings, height).collect(),
        geojson::Value::MultiPolygon(polygons) => polygons
            .iter()
            .flat_map(|rings| exterior_ring_points(rings, height))
            .collect(),
        _ => Vec::new(),
    }
}

fn exterior_ring_points(
    rings: &[geojson::LineStringType],
    height: f64,
) -> impl Iterator<Item = BuildingPoint> + '_ {
    rings
        .first()
        .into_iter()
        .flatten()
        .filter_map(move |position| match position.as_slice() {
            [longitude, latitude, ..] => Some(BuildingPoint::new(*longitude, *latitude, height)),
            _ => None,
        })
}
