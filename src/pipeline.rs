use std::{fmt, path::PathBuf};

use crate::{
    buildings::extraction::extract_building_points,
    config::Config,
    geofile::geojson::read_features_from_geojson,
    preview::scatter::{render_preview, PreviewKind},
    table::csv_table::write_building_points_to_csv,
};

/// Outcome of one conversion run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessSummary {
    pub num_points: usize,
    pub csv_path: PathBuf,
    /// Path and kind of the preview, if one was written.
    pub preview: Option<(PathBuf, PreviewKind)>,
}

impl fmt::Display for ProcessSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Processed {} building points. Results saved to {}",
            self.num_points,
            self.csv_path.display()
        )
    }
}

/// Read the GeoJSON input, write the building points as CSV and optionally render the preview.
///
/// Reading the input and writing the CSV are fatal on failure. A failing preview is logged and reported as no
/// preview in the summary.
pub fn process_geojson(config: &Config, with_preview: bool) -> anyhow::Result<ProcessSummary> {
    log::info!("Reading features from {:?}", config.input_geojson_path);
    let features = read_features_from_geojson(&config.input_geojson_path)?;
    log::info!("Read {} features", features.len());

    let points = extract_building_points(&features, &config.height);
    log::info!("Extracted {} building points", points.len());

    log::info!("Writing building points to {:?}", config.output_csv_path);
    write_building_points_to_csv(&points, &config.output_csv_path)?;

    let preview = match (&config.preview, with_preview) {
        (Some(preview_config), true) => {
            match render_preview(&points, &preview_config.output_path, &preview_config.options()) {
                Ok(PreviewKind::Skipped) => None,
                Ok(kind) => Some((preview_config.output_path.clone(), kind)),
                Err(err) => {
                    log::error!("Could not create visualization: {:?}", err);
                    None
                }
            }
        }
        _ => None,
    };

    Ok(ProcessSummary {
        num_points: points.len(),
        csv_path: config.output_csv_path.clone(),
        preview,
    })
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use rstest::rstest;
    use testdir::testdir;

    use crate::{
        buildings::height::HeightParams,
        config::{Config, PreviewConfig},
        preview::scatter::{PreviewKind, PreviewMode},
    };

    use super::{process_geojson, ProcessSummary};

    const EXPORT: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"building": "yes", "height": "12"},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[13.40, 52.52], [13.41, 52.52], [13.41, 52.53], [13.40, 52.53], [13.40, 52.52]]]
                }
            },
            {
                "type": "Feature",
                "properties": {"building": "apartments", "building:levels": "4"},
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [
                        [[[13.42, 52.52], [13.43, 52.52], [13.43, 52.53], [13.42, 52.52]]],
                        [[[13.44, 52.54], [13.45, 52.54], [13.45, 52.55], [13.44, 52.54]]]
                    ]
                }
            },
            {
                "type": "Feature",
                "properties": {"amenity": "bench"},
                "geometry": {"type": "Point", "coordinates": [13.40, 52.52]}
            },
            {
                "type": "Feature",
                "properties": {"building": "shed"},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[13.46, 52.56], [13.47, 52.56], [13.47, 52.57], [13.46, 52.56]]]
                }
            }
        ]
    }"#;

    fn config_in(dir: &Path, preview_mode: Option<PreviewMode>) -> Config {
        let input_geojson_path = dir.join("export.geojson");
        std::fs::write(&input_geojson_path, EXPORT).unwrap();
        Config {
            input_geojson_path,
            output_csv_path: dir.join("output").join("buildings.csv"),
            preview: preview_mode.map(|mode| PreviewConfig {
                output_path: dir.join("output").join("preview.png"),
                mode,
                width: Some(300),
                height: Some(240),
            }),
            height: HeightParams::default(),
        }
    }

    fn read_csv(filepath: &Path) -> Vec<(f64, f64, f64)> {
        let mut reader = csv::Reader::from_path(filepath).unwrap();
        assert_eq!(
            vec!["longitude", "latitude", "height_meters"],
            reader.headers().unwrap().iter().collect::<Vec<&str>>()
        );
        reader
            .deserialize()
            .map(|row| row.unwrap())
            .collect()
    }

    #[test]
    fn test_process_geojson() {
        let test_dir = testdir!();
        let config = config_in(&test_dir, None);

        let summary = process_geojson(&config, true).unwrap();

        assert_eq!(5 + 4 + 4 + 4, summary.num_points);
        assert_eq!(None, summary.preview);

        let rows = read_csv(&config.output_csv_path);
        assert_eq!(summary.num_points, rows.len());
        assert_eq!((13.40, 52.52, 12.0), rows[0]);
        assert!(rows[0..5].iter().all(|row| row.2 == 12.0));
        assert!(rows[5..13].iter().all(|row| row.2 == 12.0));
        assert!(rows[13..].iter().all(|row| row.2 == 3.0));
        assert_eq!((13.44, 52.54, 12.0), rows[9]);
    }

    #[test]
    fn test_summary_message() {
        let summary = ProcessSummary {
            num_points: 17,
            csv_path: Path::new("output").join("buildings.csv"),
            preview: None,
        };
        assert_eq!(
            format!(
                "Processed 17 building points. Results saved to {}",
                Path::new("output").join("buildings.csv").display()
            ),
            summary.to_string()
        );
    }

    #[rstest]
    #[case(PreviewMode::ThreeD, PreviewKind::ThreeD)]
    #[case(PreviewMode::TwoD, PreviewKind::TwoD)]
    fn test_process_geojson_with_preview(
        #[case] mode: PreviewMode,
        #[case] expected_kind: PreviewKind,
    ) {
        let test_dir = testdir!();
        let config = config_in(&test_dir, Some(mode));

        let summary = process_geojson(&config, true).unwrap();

        let (preview_path, kind) = summary.preview.unwrap();
        assert_eq!(expected_kind, kind);
        assert!(preview_path.exists());
    }

    #[test]
    fn test_preview_can_be_disabled() {
        let test_dir = testdir!();
        let config = config_in(&test_dir, Some(PreviewMode::ThreeD));

        let summary = process_geojson(&config, false).unwrap();

        assert_eq!(None, summary.preview);
        assert!(!config.preview.unwrap().output_path.exists());
    }

    #[test]
    fn test_failing_preview_is_not_fatal() {
        let test_dir = testdir!();
        let mut config = config_in(&test_dir, Some(PreviewMode::ThreeD));
        if let Some(preview) = config.preview.as_mut() {
            preview.width = Some(2);
            preview.height = Some(2);
        }

        let summary = process_geojson(&config, true).unwrap();

        assert_eq!(None, summary.preview);
        assert!(config.output_csv_path.exists());
    }

    #[test]
    fn test_malformed_input_is_fatal() {
        let test_dir = testdir!();
        let config = config_in(&test_dir, None);
        std::fs::write(&config.input_geojson_path, "{\"type\": \"FeatureCollection\", ").unwrap();

        assert!(process_geojson(&config, true).is_err());
        assert!(!config.output_csv_path.exists());
    }
}
