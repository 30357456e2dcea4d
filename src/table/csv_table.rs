use anyhow::Context;
use std::{fs, path::Path};

use crate::buildings::footprint::BuildingPoint;

pub const CSV_HEADER: [&str; 3] = ["longitude", "latitude", "height_meters"];

/// Write building points as CSV with one `longitude,latitude,height_meters` row per point. The header is written
/// even if there are no points. Missing parent directories are created.
pub fn write_building_points_to_csv(
    points: &[BuildingPoint],
    output_filepath: &Path,
) -> anyhow::Result<()> {
    if let Some(parent) = output_filepath.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Creating output directory {:?}", parent))?;
        }
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(output_filepath)
        .with_context(|| format!("Creating CSV file {:?}", output_filepath))?;
    writer.write_record(CSV_HEADER)?;
    for point in points {
        writer.serialize(point)?;
    }
    writer.flush()?;
    log::debug!("Wrote {} rows to {:?}", points.len(), output_filepath);
    Ok(())
}

#[cfg(test)]
mod tests {
    use testdir::testdir;

    use crate::buildings::footprint::BuildingPoint;

    use super::write_building_points_to_csv;

    fn read_rows(filepath: &std::path::Path) -> Vec<Vec<String>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(filepath)
            .unwrap();
        reader
            .records()
            .map(|row| row.unwrap().iter().map(|value| value.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_write_building_points_to_csv() {
        let test_dir = testdir!();
        let filepath = test_dir.join("buildings.csv");
        let points = vec![
            BuildingPoint::new(13.4049, 52.52, 12.0),
            BuildingPoint::new(-0.1276, 51.5072, 3.0),
        ];

        write_building_points_to_csv(&points, &filepath).unwrap();

        let rows = read_rows(&filepath);
        assert_eq!(
            vec![
                vec!["longitude", "latitude", "height_meters"],
                vec!["13.4049", "52.52", "12.0"],
                vec!["-0.1276", "51.5072", "3.0"],
            ],
            rows
        );
    }

    #[test]
    fn test_header_is_written_without_points() {
        let test_dir = testdir!();
        let filepath = test_dir.join("empty.csv");

        write_building_points_to_csv(&[], &filepath).unwrap();

        assert_eq!(
            "longitude,latitude,height_meters\n",
            std::fs::read_to_string(&filepath).unwrap()
        );
    }

    #[test]
    fn test_missing_output_directory_is_created() {
        let test_dir = testdir!();
        let filepath = test_dir.join("output").join("nested").join("buildings.csv");

        write_building_points_to_csv(&[BuildingPoint::new(1.0, 2.0, 3.0)], &filepath).unwrap();

        assert_eq!(2, read_rows(&filepath).len());
    }
}
