use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use riskforest_io::{ExperimentName, FeatureReader, ReportWriter, SampleReader};
use riskforest_rf::{
    FeatureVector, NUMERIC_FEATURES, RandomForest, RandomForestConfig, RankedFeature, RiskLevel,
    VoteDistribution,
};

/// Number of top-ranked features echoed in command summaries.
const TOP_FEATURES: usize = 5;

/// Fixed assets replayed by `verify`, feature values in `NUMERIC_FEATURES` order.
const REFERENCE_ASSETS: [(&str, [f64; 10], RiskLevel); 3] = [
    (
        "new HVAC, well maintained",
        [12.0, 30.0, 1.0, 200.0, 25.0, 50.0, 0.0, 5.0, 2.0, 0.8],
        RiskLevel::Low,
    ),
    (
        "old elevator, overdue maintenance",
        [180.0, 400.0, 25.0, 600.0, 30.0, 70.0, 3.0, 2.0, 20.0, 1.4],
        RiskLevel::High,
    ),
    (
        "middle-aged plumbing, moderate condition",
        [60.0, 120.0, 8.0, 300.0, 28.0, 60.0, 1.0, 3.0, 10.0, 1.1],
        RiskLevel::Medium,
    ),
];

#[derive(Parser)]
#[command(name = "riskforest")]
#[command(about = "Train, export and verify portable asset-failure risk forests")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for reproducibility
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Forest growth parameters.
#[derive(Args, Debug, Clone)]
struct ForestArgs {
    /// Number of trees in the forest
    #[arg(long, default_value_t = RandomForestConfig::DEFAULT_N_TREES)]
    n_trees: usize,

    /// Maximum tree depth (root is depth 0)
    #[arg(long, default_value_t = 5)]
    max_depth: usize,

    /// Minimum samples a node needs before it may split
    #[arg(long, default_value_t = 10)]
    min_samples_split: usize,

    /// Minimum information gain a split must reach
    #[arg(long, default_value_t = 0.001)]
    min_gain: f64,

    /// Number of features sampled at each split
    #[arg(long, default_value_t = 5)]
    max_features: usize,
}

#[derive(Subcommand)]
enum Command {
    /// Train a forest on labeled records and save the model document
    Train {
        /// Path to the labeled training CSV file
        #[arg(long)]
        train_data: PathBuf,

        /// Optional labeled CSV used to record held-out accuracy in the model
        #[arg(long)]
        test_data: Option<PathBuf>,

        /// Path of the model JSON document to write
        #[arg(long)]
        output: PathBuf,

        #[command(flatten)]
        forest: ForestArgs,
    },

    /// Predict risk levels for unlabeled assets
    Predict {
        /// Path to the model JSON document
        #[arg(long)]
        model: PathBuf,

        /// Path to the feature CSV file (optional asset_id column)
        #[arg(long)]
        input: PathBuf,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Score a model against labeled records
    Evaluate {
        /// Path to the model JSON document
        #[arg(long)]
        model: PathBuf,

        /// Path to the labeled CSV file
        #[arg(long)]
        data: PathBuf,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Validate a model document and check that it re-serializes identically
    Verify {
        /// Path to the model JSON document
        #[arg(long)]
        model: PathBuf,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct FeatureOutput {
    name: String,
    importance: f64,
    rank: usize,
}

#[derive(Serialize)]
struct TrainOutput {
    model: PathBuf,
    n_trees: usize,
    trained_on: usize,
    tested_on: usize,
    accuracy: Option<f64>,
    top_features: Vec<FeatureOutput>,
}

#[derive(Serialize)]
struct PredictOutput {
    experiment: String,
    n_assets: usize,
    risk_counts: VoteDistribution,
    report: PathBuf,
}

#[derive(Serialize)]
struct EvaluateOutput {
    experiment: String,
    n_samples: usize,
    accuracy: Option<f64>,
    report: PathBuf,
}

#[derive(Serialize)]
struct VerifyOutput {
    model: PathBuf,
    n_trees: usize,
    n_leaves: usize,
    max_depth: usize,
    trained_on: usize,
    tested_on: usize,
    accuracy: Option<f64>,
    byte_identical: bool,
    top_features: Vec<FeatureOutput>,
    reference_assets: Vec<ReferenceOutput>,
}

#[derive(Serialize)]
struct ReferenceOutput {
    name: &'static str,
    expected: RiskLevel,
    predicted: RiskLevel,
    passed: bool,
    failure_probability: f64,
    estimated_days_to_failure: u32,
    votes: VoteDistribution,
}

/// Predict each reference asset and compare with its expected level.
fn check_reference_assets(forest: &RandomForest) -> Vec<ReferenceOutput> {
    REFERENCE_ASSETS
        .iter()
        .map(|&(name, values, expected)| {
            let features: FeatureVector = NUMERIC_FEATURES.iter().copied().zip(values).collect();
            let prediction = forest.predict(&features);
            let passed = prediction.risk_level == expected;
            if passed {
                info!(asset = name, predicted = %prediction.risk_level, votes = ?prediction.votes, "reference asset PASS");
            } else {
                warn!(asset = name, %expected, predicted = %prediction.risk_level, votes = ?prediction.votes, "reference asset FAIL");
            }
            ReferenceOutput {
                name,
                expected,
                predicted: prediction.risk_level,
                passed,
                failure_probability: prediction.failure_probability,
                estimated_days_to_failure: prediction.estimated_days_to_failure,
                votes: prediction.votes,
            }
        })
        .collect()
}

fn top_features(ranked: Vec<RankedFeature>) -> Vec<FeatureOutput> {
    ranked
        .into_iter()
        .take(TOP_FEATURES)
        .map(|f| FeatureOutput {
            name: f.name,
            importance: f.importance,
            rank: f.rank,
        })
        .collect()
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Configure Rayon thread pool
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Train {
            train_data,
            test_data,
            output,
            forest,
        } => {
            // 1. Read training records
            let samples = SampleReader::new(&train_data)
                .read()
                .context("failed to read training CSV")?;

            // 2. Train
            let config = RandomForestConfig::new(forest.n_trees)?
                .with_max_depth(forest.max_depth)
                .with_min_samples_split(forest.min_samples_split)
                .with_min_gain(forest.min_gain)
                .with_max_features(forest.max_features)
                .with_seed(cli.seed);
            let mut model = config.fit(&samples).context("training failed")?;

            // 3. Optionally score on held-out records
            if let Some(test_path) = test_data {
                let test = SampleReader::new(&test_path)
                    .read()
                    .context("failed to read test CSV")?;
                let evaluation = model.evaluate(&test);
                info!(accuracy = ?evaluation.accuracy(), n_test = test.len(), "held-out evaluation");
                model = model.with_test_report(test.len(), evaluation.accuracy());
            }

            // 4. Save model document
            model.save(&output).context("failed to save model")?;

            // 5. Print summary
            let metadata = model.metadata();
            let summary = TrainOutput {
                model: output,
                n_trees: model.n_trees(),
                trained_on: metadata.trained_on,
                tested_on: metadata.tested_on,
                accuracy: metadata.accuracy,
                top_features: top_features(model.ranked_importances()),
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }

        Command::Predict {
            model,
            input,
            experiment,
            output_dir,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;

            // 1. Load model
            let forest = RandomForest::load(&model).context("failed to load model")?;
            info!(n_trees = forest.n_trees(), "model loaded");

            // 2. Read feature rows
            let table = FeatureReader::new(&input)
                .read()
                .context("failed to read feature CSV")?;

            // 3. Predict
            let predictions = forest.predict_batch(table.rows());

            // 4. Write predictions JSON
            let writer = ReportWriter::new(&output_dir, experiment_name)?;
            let report = writer.write_predictions(table.asset_ids(), &predictions)?;

            // 5. Print summary
            let mut risk_counts = VoteDistribution::default();
            for p in &predictions {
                risk_counts.record(p.risk_level);
            }
            let summary = PredictOutput {
                experiment,
                n_assets: predictions.len(),
                risk_counts,
                report,
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }

        Command::Evaluate {
            model,
            data,
            experiment,
            output_dir,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;

            // 1. Load model and labeled records
            let forest = RandomForest::load(&model).context("failed to load model")?;
            let samples = SampleReader::new(&data)
                .read()
                .context("failed to read labeled CSV")?;

            // 2. Score
            let evaluation = forest.evaluate(&samples);
            info!("confusion matrix (rows actual, columns predicted)\n{}", evaluation.confusion_matrix);
            for m in &evaluation.class_metrics {
                info!(
                    class = %m.class,
                    precision = m.precision,
                    recall = m.recall,
                    f1 = m.f1,
                    support = m.support,
                    accuracy = ?m.accuracy,
                    "class metrics"
                );
            }

            // 3. Write evaluation JSON
            let writer = ReportWriter::new(&output_dir, experiment_name)?;
            let report = writer.write_evaluation(&evaluation, &forest.ranked_importances())?;

            // 4. Print summary
            let summary = EvaluateOutput {
                experiment,
                n_samples: evaluation.n_samples(),
                accuracy: evaluation.accuracy(),
                report,
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }

        Command::Verify { model } => {
            // 1. Load with full validation
            let forest = RandomForest::load(&model).context("model failed validation")?;

            // 2. Re-serialize twice: the second pass must reproduce the first
            let first = forest.to_json_string()?;
            let reparsed = RandomForest::from_json_str(&first)
                .context("re-serialized model failed to parse")?;
            let second = reparsed.to_json_string()?;
            anyhow::ensure!(first == second, "model re-serialization is not stable");

            let on_disk = std::fs::read_to_string(&model)
                .with_context(|| format!("failed to re-read {}", model.display()))?;
            let byte_identical = on_disk == first;
            if !byte_identical {
                warn!("model file differs from its canonical serialization");
            }

            // 3. Replay the reference assets
            let reference_assets = check_reference_assets(&forest);

            // 4. Print summary
            let metadata = forest.metadata();
            let summary = VerifyOutput {
                n_trees: forest.n_trees(),
                n_leaves: forest.trees().iter().map(|t| t.n_leaves()).sum(),
                max_depth: forest.trees().iter().map(|t| t.depth()).max().unwrap_or(0),
                trained_on: metadata.trained_on,
                tested_on: metadata.tested_on,
                accuracy: metadata.accuracy,
                byte_identical,
                top_features: top_features(forest.ranked_importances()),
                reference_assets,
                model,
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}
