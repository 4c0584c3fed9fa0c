//! Unlabeled feature CSV reader for batch prediction.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use riskforest_rf::{FeatureVector, NUMERIC_FEATURES};
use tracing::{info, instrument};

use crate::IoError;
use crate::domain::{AssetId, FeatureTable};
use crate::reader::{csv_error, header_index, open_csv, parse_finite};

const ASSET_ID: &str = "asset_id";

/// Reads feature rows to predict from a CSV file.
///
/// Expected CSV format:
/// - Header row required; column order is free and unknown columns are ignored
/// - An optional `asset_id` column; rows with no ID are named `row-<n>`
/// - Any subset of the ten numeric feature columns; absent columns read as 0
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::InvalidValue`] | A present feature cell is empty, unparseable or non-finite |
/// | [`IoError::DuplicateAssetId`] | Same explicit asset ID appears twice |
pub struct FeatureReader {
    path: PathBuf,
}

impl FeatureReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Read and validate the CSV file.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<FeatureTable, IoError> {
        let path = self.path.as_path();
        let mut rdr = open_csv(path)?;
        let index = header_index(&mut rdr, path)?;

        let id_col = index.get(ASSET_ID).copied();
        let numeric: Vec<(&str, usize)> = NUMERIC_FEATURES
            .iter()
            .filter_map(|&name| index.get(name).map(|&col| (name, col)))
            .collect();

        let mut asset_ids = Vec::new();
        let mut rows = Vec::new();
        let mut seen: HashMap<String, usize> = HashMap::new();

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| csv_error(path, e))?;

            // Only explicit IDs must be unique; generated names may repeat one.
            let asset_id = match id_col.and_then(|col| record.get(col)) {
                Some(id) if !id.is_empty() => {
                    if let Some(&first_row) = seen.get(id) {
                        return Err(IoError::DuplicateAssetId {
                            path: path.to_path_buf(),
                            asset_id: id.to_string(),
                            first_row,
                            second_row: row_index,
                        });
                    }
                    seen.insert(id.to_string(), row_index);
                    AssetId::new(id.to_string())
                }
                _ => AssetId::for_row(row_index),
            };

            let mut features = FeatureVector::new();
            for &(name, col) in &numeric {
                let raw = record.get(col).unwrap_or("");
                features.insert(name, parse_finite(path, row_index, name, raw)?);
            }

            asset_ids.push(asset_id);
            rows.push(features);
        }

        info!(
            n_rows = rows.len(),
            n_feature_columns = numeric.len(),
            has_asset_ids = id_col.is_some(),
            "feature table loaded"
        );

        Ok(FeatureTable::new(asset_ids, rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn reads_ids_and_subset_of_features() {
        let csv = "asset_id,asset_age_months,manufacturer_rating,location\nPUMP-1,12,5,north\nPUMP-2,180,2,south\n";
        let f = write_csv(csv);
        let table = FeatureReader::new(f.path()).read().unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.asset_ids()[1].as_str(), "PUMP-2");
        let row = &table.rows()[0];
        assert_eq!(row.len(), 2);
        assert!((row.value("asset_age_months") - 12.0).abs() < f64::EPSILON);
        // Absent columns read as 0 at inference time.
        assert_eq!(row.value("humidity_level_avg"), 0.0);
    }

    #[test]
    fn rows_without_ids_are_numbered() {
        let csv = "asset_id,asset_age_months\nA7,10\n,20\n";
        let f = write_csv(csv);
        let table = FeatureReader::new(f.path()).read().unwrap();
        assert_eq!(table.asset_ids()[0].as_str(), "A7");
        assert_eq!(table.asset_ids()[1].as_str(), "row-2");

        let f = write_csv("asset_age_months\n1\n2\n3\n");
        let table = FeatureReader::new(f.path()).read().unwrap();
        let ids: Vec<&str> = table.asset_ids().iter().map(AssetId::as_str).collect();
        assert_eq!(ids, vec!["row-1", "row-2", "row-3"]);
    }

    #[test]
    fn duplicate_asset_id_error() {
        let f = write_csv("asset_id,asset_age_months\nB1,1\nB1,2\n");
        let err = FeatureReader::new(f.path()).read().unwrap_err();
        assert!(matches!(
            err,
            IoError::DuplicateAssetId { first_row: 0, second_row: 1, .. }
        ));
    }

    #[test]
    fn generated_id_may_match_explicit_id() {
        let f = write_csv("asset_id,asset_age_months\nrow-2,10\n,20\n");
        let table = FeatureReader::new(f.path()).read().unwrap();
        let ids: Vec<&str> = table.asset_ids().iter().map(AssetId::as_str).collect();
        assert_eq!(ids, vec!["row-2", "row-2"]);
        assert!((table.rows()[1].value("asset_age_months") - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unparseable_feature_error() {
        let f = write_csv("asset_id,days_since_last_maintenance\nB1,soon\n");
        let err = FeatureReader::new(f.path()).read().unwrap_err();
        match err {
            IoError::InvalidValue { column, raw, .. } => {
                assert_eq!(column, "days_since_last_maintenance");
                assert_eq!(raw, "soon");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn header_only_gives_empty_table() {
        let f = write_csv("asset_id,asset_age_months\n");
        assert!(FeatureReader::new(f.path()).read().unwrap().is_empty());
    }
}
