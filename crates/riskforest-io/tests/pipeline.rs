//! End-to-end integration tests: CSV -> train -> model JSON -> reload -> reports.

use std::fs;
use std::path::{Path, PathBuf};

use riskforest_io::{ExperimentName, FeatureReader, ReportWriter, SampleReader};
use riskforest_rf::{RandomForest, RandomForestConfig, RiskLevel};
use tempfile::TempDir;

/// Path to the test fixture directory.
fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn train_from_fixture() -> RandomForest {
    let samples = SampleReader::new(&fixture_path("train_assets.csv"))
        .read()
        .expect("fixture should parse");
    assert_eq!(samples.len(), 400);

    RandomForestConfig::new(30)
        .unwrap()
        .with_seed(42)
        .fit(&samples)
        .unwrap()
}

#[test]
fn train_save_reload_predict() {
    // 1. Train and score on the held-out fixture
    let forest = train_from_fixture();
    let test = SampleReader::new(&fixture_path("test_assets.csv"))
        .read()
        .unwrap();
    let evaluation = forest.evaluate(&test);
    let forest = forest.with_test_report(test.len(), evaluation.accuracy());
    assert_eq!(forest.metadata().tested_on, 100);
    let accuracy = forest.metadata().accuracy.unwrap();
    assert!((0.0..=100.0).contains(&accuracy));

    // 2. Save and reload the model document
    let dir = TempDir::new().unwrap();
    let model_path = dir.path().join("model.json");
    forest.save(&model_path).unwrap();
    let reloaded = RandomForest::load(&model_path).unwrap();
    assert_eq!(reloaded, forest);

    // 3. Predict the unlabeled fixture with both and compare
    let table = FeatureReader::new(&fixture_path("predict_assets.csv"))
        .read()
        .unwrap();
    let before = forest.predict_batch(table.rows());
    let after = reloaded.predict_batch(table.rows());
    assert_eq!(before, after);

    assert_eq!(after[0].risk_level, RiskLevel::Low, "HVAC-001 votes {:?}", after[0].votes);
    assert_eq!(after[1].risk_level, RiskLevel::High, "GEN-017 votes {:?}", after[1].votes);

    // 4. Write the prediction report and read it back
    let experiment = ExperimentName::new("pipeline".into()).unwrap();
    let writer = ReportWriter::new(dir.path(), experiment).unwrap();
    let report_path = writer.write_predictions(table.asset_ids(), &after).unwrap();
    assert_eq!(report_path, dir.path().join("pipeline_predict.json"));

    let content: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(content["experiment"], "pipeline");
    assert_eq!(content["n_assets"], 3);
    let predictions = content["predictions"].as_array().unwrap();
    let ids: Vec<&str> = predictions
        .iter()
        .map(|p| p["asset_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["HVAC-001", "GEN-017", "PUMP-104"]);
    for p in predictions {
        let votes = &p["votes"];
        let total = votes["low"].as_u64().unwrap()
            + votes["medium"].as_u64().unwrap()
            + votes["high"].as_u64().unwrap();
        assert_eq!(total, 30);
    }
}

#[test]
fn evaluation_report_round_trip() {
    let forest = train_from_fixture();
    let test = SampleReader::new(&fixture_path("test_assets.csv"))
        .read()
        .unwrap();
    let evaluation = forest.evaluate(&test);

    let dir = TempDir::new().unwrap();
    let experiment = ExperimentName::new("eval_rt".into()).unwrap();
    let writer = ReportWriter::new(dir.path(), experiment).unwrap();
    writer
        .write_evaluation(&evaluation, &forest.ranked_importances())
        .unwrap();

    let json_path = dir.path().join("eval_rt_evaluate.json");
    let content: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();

    assert_eq!(content["experiment"], "eval_rt");
    assert_eq!(content["n_samples"].as_u64().unwrap(), 100);

    // Confusion matrix is 3x3 with labels in class order and sums to n_samples
    let labels: Vec<&str> = content["confusion_matrix"]["labels"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(labels, vec!["low", "medium", "high"]);
    let rows = content["confusion_matrix"]["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 3);
    let total: u64 = rows
        .iter()
        .flat_map(|r| r.as_array().unwrap())
        .map(|v| v.as_u64().unwrap())
        .sum();
    assert_eq!(total, 100);

    // Class metrics in [0, 1]
    let classes = content["class_metrics"].as_array().unwrap();
    assert_eq!(classes.len(), 3);
    for class in classes {
        for key in ["precision", "recall", "f1"] {
            let v = class[key].as_f64().unwrap();
            assert!((0.0..=1.0).contains(&v), "{key} = {v}");
        }
    }

    // Feature ranks are 1-based and contiguous
    let features = content["feature_importances"].as_array().unwrap();
    assert!(!features.is_empty());
    for (i, f) in features.iter().enumerate() {
        assert_eq!(f["rank"].as_u64().unwrap(), (i + 1) as u64);
    }
}

#[test]
fn invalid_experiment_name_rejected() {
    assert!(ExperimentName::new("bad name!".into()).is_err());
}
