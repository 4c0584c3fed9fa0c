//! Labeled training CSV reader with full input validation.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use riskforest_rf::{
    CATEGORICAL_FEATURES, CategoricalAttributes, FeatureVector, NUMERIC_FEATURES, RiskLevel,
    Sample, Target,
};
use tracing::{debug, info, instrument};

use crate::IoError;

const FAILURE_PROBABILITY: &str = "failure_probability";
const RISK_LEVEL: &str = "risk_level";
const DAYS_TO_FAILURE: &str = "estimated_days_to_failure";

/// Open `path` as a headed CSV file.
pub(crate) fn open_csv(path: &Path) -> Result<csv::Reader<File>, IoError> {
    let file = File::open(path).map_err(|e| IoError::FileNotFound {
        path: path.to_path_buf(),
        source: e,
    })?;
    // flexible(true) lets short rows through so the missing cell is reported
    // by column name instead of as a low-level CsvParse error.
    Ok(csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file))
}

pub(crate) fn csv_error(path: &Path, e: csv::Error) -> IoError {
    IoError::CsvParse {
        path: path.to_path_buf(),
        offset: e.position().map_or(0, |p| p.byte()),
        source: e,
    }
}

/// Map each header name to its first column position.
pub(crate) fn header_index(
    rdr: &mut csv::Reader<File>,
    path: &Path,
) -> Result<HashMap<String, usize>, IoError> {
    let header = rdr.headers().map_err(|e| csv_error(path, e))?;
    let mut index = HashMap::with_capacity(header.len());
    for (i, name) in header.iter().enumerate() {
        index.entry(name.to_string()).or_insert(i);
    }
    debug!(n_columns = header.len(), "read CSV header");
    Ok(index)
}

fn require(index: &HashMap<String, usize>, path: &Path, column: &str) -> Result<usize, IoError> {
    index
        .get(column)
        .copied()
        .ok_or_else(|| IoError::MissingColumn {
            path: path.to_path_buf(),
            column: column.to_string(),
        })
}

/// Parse one cell as a finite float.
pub(crate) fn parse_finite(
    path: &Path,
    row_index: usize,
    column: &str,
    raw: &str,
) -> Result<f64, IoError> {
    let invalid = |reason| IoError::InvalidValue {
        path: path.to_path_buf(),
        row_index,
        column: column.to_string(),
        raw: raw.to_string(),
        reason,
    };
    if raw.is_empty() {
        return Err(invalid("empty cell"));
    }
    let value: f64 = raw.parse().map_err(|_| invalid("not a number"))?;
    if !value.is_finite() {
        return Err(invalid("not finite"));
    }
    Ok(value)
}

/// Reads labeled maintenance records from a CSV file.
///
/// Expected CSV format:
/// - Header row required; column order is free and extra columns are ignored
/// - The ten numeric feature columns, `asset_type`, `last_repair_severity`,
///   `installation_quality`, `failure_probability`, `risk_level` and
///   `estimated_days_to_failure` must all be present
/// - A header with no data rows is an empty, valid training set
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::MissingColumn`] | A required column is absent from the header |
/// | [`IoError::InvalidValue`] | Cell is empty, unparseable, non-finite or out of range |
pub struct SampleReader {
    path: PathBuf,
}

impl SampleReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Read and validate the CSV file.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<Vec<Sample>, IoError> {
        let path = self.path.as_path();
        let mut rdr = open_csv(path)?;
        let index = header_index(&mut rdr, path)?;

        let numeric: Vec<(&str, usize)> = NUMERIC_FEATURES
            .iter()
            .map(|&name| require(&index, path, name).map(|col| (name, col)))
            .collect::<Result<_, _>>()?;
        let categorical: Vec<usize> = CATEGORICAL_FEATURES
            .iter()
            .map(|&name| require(&index, path, name))
            .collect::<Result<_, _>>()?;
        let probability_col = require(&index, path, FAILURE_PROBABILITY)?;
        let risk_col = require(&index, path, RISK_LEVEL)?;
        let days_col = require(&index, path, DAYS_TO_FAILURE)?;

        let mut samples = Vec::new();

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| csv_error(path, e))?;
            let cell = |col: usize| record.get(col).unwrap_or("");
            let invalid = |column: &str, raw: &str, reason| IoError::InvalidValue {
                path: path.to_path_buf(),
                row_index,
                column: column.to_string(),
                raw: raw.to_string(),
                reason,
            };

            let mut features = FeatureVector::new();
            for &(name, col) in &numeric {
                features.insert(name, parse_finite(path, row_index, name, cell(col))?);
            }

            let mut labels = [String::new(), String::new(), String::new()];
            for (label, (&name, &col)) in labels
                .iter_mut()
                .zip(CATEGORICAL_FEATURES.iter().zip(&categorical))
            {
                let raw = cell(col);
                if raw.is_empty() {
                    return Err(invalid(name, raw, "empty cell"));
                }
                *label = raw.to_string();
            }
            let [asset_type, last_repair_severity, installation_quality] = labels;
            let attributes = CategoricalAttributes {
                asset_type,
                last_repair_severity,
                installation_quality,
            };

            let raw = cell(probability_col);
            let failure_probability = parse_finite(path, row_index, FAILURE_PROBABILITY, raw)?;
            if !(0.0..=1.0).contains(&failure_probability) {
                return Err(invalid(FAILURE_PROBABILITY, raw, "outside [0, 1]"));
            }

            let raw = cell(risk_col);
            let risk_level: RiskLevel = raw
                .parse()
                .map_err(|_| invalid(RISK_LEVEL, raw, "expected low, medium or high"))?;

            let raw = cell(days_col);
            let days = parse_finite(path, row_index, DAYS_TO_FAILURE, raw)?;
            if days < 0.0 || days.fract() != 0.0 || days > f64::from(u32::MAX) {
                return Err(invalid(DAYS_TO_FAILURE, raw, "expected a non-negative integer"));
            }

            let target = Target {
                risk_level,
                failure_probability,
                estimated_days_to_failure: days as u32,
            };
            samples.push(Sample::new(features, target).with_categorical(attributes));
        }

        info!(n_samples = samples.len(), "training dataset loaded");

        Ok(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "asset_type,asset_age_months,days_since_last_maintenance,total_maintenance_count,avg_monthly_usage_hours,last_repair_severity,ambient_temperature_avg,humidity_level_avg,power_outage_events_last_year,manufacturer_rating,installation_quality,building_age_years,seasonal_load_factor,failure_probability,risk_level,estimated_days_to_failure";

    fn write_csv(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    fn row(risk: &str, probability: &str, days: &str) -> String {
        format!("hvac,24,60,3,110.5,minor,22.1,40,1,4,good,15,1.1,{probability},{risk},{days}")
    }

    #[test]
    fn read_valid_samples() {
        let csv = format!(
            "{HEADER}\n{}\n{}\n",
            row("low", "0.12", "320"),
            row("high", "0.91", "14")
        );
        let f = write_csv(&csv);
        let samples = SampleReader::new(f.path()).read().unwrap();
        assert_eq!(samples.len(), 2);
        let s = &samples[1];
        assert_eq!(s.target.risk_level, RiskLevel::High);
        assert!((s.target.failure_probability - 0.91).abs() < f64::EPSILON);
        assert_eq!(s.target.estimated_days_to_failure, 14);
        assert!((s.features.value("avg_monthly_usage_hours") - 110.5).abs() < f64::EPSILON);
        assert_eq!(s.features.len(), 10);
        assert_eq!(s.categorical.asset_type, "hvac");
        assert_eq!(s.categorical.installation_quality, "good");
    }

    #[test]
    fn column_order_is_free_and_extras_ignored() {
        let mut cols: Vec<&str> = HEADER.split(',').collect();
        cols.reverse();
        let mut values: Vec<String> = row("medium", "0.5", "100")
            .split(',')
            .map(String::from)
            .collect();
        values.reverse();
        let csv = format!("notes,{}\nignored,{}\n", cols.join(","), values.join(","));
        let f = write_csv(&csv);
        let samples = SampleReader::new(f.path()).read().unwrap();
        assert_eq!(samples[0].target.risk_level, RiskLevel::Medium);
        assert!((samples[0].features.value("asset_age_months") - 24.0).abs() < f64::EPSILON);
    }

    #[test]
    fn header_only_is_empty_dataset() {
        let f = write_csv(&format!("{HEADER}\n"));
        assert!(SampleReader::new(f.path()).read().unwrap().is_empty());
    }

    #[test]
    fn missing_column_error() {
        let header = HEADER.replace(",humidity_level_avg", "");
        let f = write_csv(&format!("{header}\n"));
        let err = SampleReader::new(f.path()).read().unwrap_err();
        match err {
            IoError::MissingColumn { column, .. } => assert_eq!(column, "humidity_level_avg"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_risk_level_error() {
        let f = write_csv(&format!("{HEADER}\n{}\n", row("severe", "0.5", "10")));
        let err = SampleReader::new(f.path()).read().unwrap_err();
        assert!(matches!(
            err,
            IoError::InvalidValue { row_index: 0, ref column, .. } if column == "risk_level"
        ));
    }

    #[test]
    fn probability_out_of_range_error() {
        let f = write_csv(&format!(
            "{HEADER}\n{}\n{}\n",
            row("low", "0.1", "300"),
            row("low", "1.2", "300")
        ));
        let err = SampleReader::new(f.path()).read().unwrap_err();
        assert!(matches!(
            err,
            IoError::InvalidValue { row_index: 1, ref column, .. } if column == "failure_probability"
        ));
    }

    #[test]
    fn fractional_days_error() {
        let f = write_csv(&format!("{HEADER}\n{}\n", row("low", "0.1", "12.5")));
        let err = SampleReader::new(f.path()).read().unwrap_err();
        assert!(matches!(err, IoError::InvalidValue { .. }));
    }

    #[test]
    fn non_finite_feature_error() {
        let bad = row("low", "0.1", "300").replacen("24", "NaN", 1);
        let f = write_csv(&format!("{HEADER}\n{bad}\n"));
        let err = SampleReader::new(f.path()).read().unwrap_err();
        match err {
            IoError::InvalidValue { column, raw, .. } => {
                assert_eq!(column, "asset_age_months");
                assert_eq!(raw, "NaN");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn short_row_reports_missing_cell() {
        let f = write_csv(&format!("{HEADER}\nhvac,24,60\n"));
        let err = SampleReader::new(f.path()).read().unwrap_err();
        assert!(matches!(err, IoError::InvalidValue { reason: "empty cell", .. }));
    }

    #[test]
    fn missing_trailing_categorical_cells_error() {
        let header = "asset_age_months,days_since_last_maintenance,total_maintenance_count,avg_monthly_usage_hours,ambient_temperature_avg,humidity_level_avg,power_outage_events_last_year,manufacturer_rating,building_age_years,seasonal_load_factor,failure_probability,risk_level,estimated_days_to_failure,asset_type,last_repair_severity,installation_quality";
        let values = "12,30,1,200,25,50,0,5,2,0.8,0.1,low,300";

        for csv in [format!("{header}\n{values}\n"), format!("{header}\n{values},,,\n")] {
            let f = write_csv(&csv);
            let err = SampleReader::new(f.path()).read().unwrap_err();
            match err {
                IoError::InvalidValue { row_index, column, reason, .. } => {
                    assert_eq!(row_index, 0);
                    assert_eq!(column, "asset_type");
                    assert_eq!(reason, "empty cell");
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn empty_categorical_cell_error() {
        let bad = row("low", "0.1", "300").replacen("minor", "", 1);
        let f = write_csv(&format!("{HEADER}\n{bad}\n"));
        let err = SampleReader::new(f.path()).read().unwrap_err();
        assert!(matches!(
            err,
            IoError::InvalidValue { ref column, reason: "empty cell", .. }
                if column == "last_repair_severity"
        ));
    }

    #[test]
    fn file_not_found() {
        let err = SampleReader::new(Path::new("/nonexistent/train.csv")).read().unwrap_err();
        assert!(matches!(err, IoError::FileNotFound { .. }));
    }
}
