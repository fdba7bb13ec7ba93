//! fastsvm Command Line Interface
//!
//! A command-line interface for training, evaluating, and using multiclass
//! kernel SVM models on CSV data.

use clap::{Args, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use fastsvm::api::{quick, SVMConfig, SVM, DEFAULT_LAMBDA_VALS};
use fastsvm::core::{Penalty, Result, SVMError};
use fastsvm::data::{gaussian_blobs, random_centers};
use fastsvm::kernel::KernelFunction;
use fastsvm::multiclass::Strategy;
use fastsvm::persistence::SerializableModel;
use fastsvm::validation::FoldPolicy;
use fastsvm::{CSVDataset, Dataset};
use log::{error, info, warn};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "fastsvm")]
#[command(about = "Multiclass kernel SVM trained by fast gradient descent")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a new SVM model
    Train(TrainArgs),
    /// Make predictions using a trained model
    Predict(PredictArgs),
    /// Evaluate a model on test data
    Evaluate(EvaluateArgs),
    /// Display model information
    Info(InfoArgs),
    /// Train on a random split and report the held-out error
    Split(SplitArgs),
    /// Write a synthetic Gaussian blob dataset
    Generate(GenerateArgs),
}

#[derive(Args)]
struct ModelArgs {
    /// Kernel function
    #[arg(short, long, default_value = "linear")]
    kernel: CliKernel,

    /// Kernel parameter as name=value (degree, sigma, gamma, alpha, beta)
    #[arg(short, long = "param", value_name = "NAME=VALUE")]
    params: Vec<String>,

    /// Regularization strength lambda
    #[arg(short, long, default_value = "3.0")]
    lambda: f64,

    /// Maximum solver iterations
    #[arg(short, long, default_value = "1000")]
    max_iterations: usize,

    /// Gradient norm tolerance
    #[arg(short, long, default_value = "0.001")]
    tolerance: f64,

    /// Multiclass strategy
    #[arg(short, long, default_value = "ovr")]
    strategy: CliStrategy,

    /// Cross-validation folds
    #[arg(short, long, default_value = "4")]
    folds: usize,

    /// Comma-separated lambda grid for cross-validation
    #[arg(long, value_delimiter = ',')]
    lambda_values: Option<Vec<f64>>,

    /// Select lambda by cross-validation
    #[arg(long)]
    optimal_lambda: bool,

    /// Regularization penalty (default: ridge for sigmoid, kernel otherwise)
    #[arg(long)]
    penalty: Option<CliPenalty>,

    /// Seed for fold shuffling and data splits
    #[arg(long, default_value = "0")]
    seed: u64,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliKernel {
    /// Linear kernel
    Linear,
    /// Polynomial kernel (requires degree)
    Poly,
    /// Gaussian RBF kernel (requires sigma or gamma)
    Rbf,
    /// Sigmoid kernel (requires alpha and beta)
    Sigmoid,
}

impl CliKernel {
    fn name(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Poly => "poly",
            Self::Rbf => "rbf",
            Self::Sigmoid => "sigmoid",
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliStrategy {
    /// Exactly two classes
    Binary,
    /// One-vs-one with majority vote
    Ovo,
    /// One-vs-rest with highest score
    Ovr,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliPenalty {
    /// lambda * beta' K beta
    Kernel,
    /// lambda * |beta|^2
    Ridge,
}

impl From<CliPenalty> for Penalty {
    fn from(cli_penalty: CliPenalty) -> Self {
        match cli_penalty {
            CliPenalty::Kernel => Penalty::Kernel,
            CliPenalty::Ridge => Penalty::Ridge,
        }
    }
}

impl From<CliStrategy> for Strategy {
    fn from(cli_strategy: CliStrategy) -> Self {
        match cli_strategy {
            CliStrategy::Binary => Strategy::Binary,
            CliStrategy::Ovo => Strategy::OneVsOne,
            CliStrategy::Ovr => Strategy::OneVsRest,
        }
    }
}

#[derive(Args)]
struct TrainArgs {
    /// Training data file (CSV, label in the last column)
    #[arg(long)]
    data: PathBuf,

    /// Output model file
    #[arg(short, long)]
    output: PathBuf,

    #[command(flatten)]
    model: ModelArgs,
}

#[derive(Args)]
struct PredictArgs {
    /// Trained model file
    #[arg(short, long)]
    model: PathBuf,

    /// Input data file
    #[arg(long)]
    data: PathBuf,

    /// Output predictions file (optional, prints to stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Input has no label column
    #[arg(long)]
    unlabeled: bool,
}

#[derive(Args)]
struct EvaluateArgs {
    /// Trained model file
    #[arg(short, long)]
    model: PathBuf,

    /// Test data file
    #[arg(long)]
    data: PathBuf,
}

#[derive(Args)]
struct InfoArgs {
    /// Model file
    model: PathBuf,
}

#[derive(Args)]
struct SplitArgs {
    /// Data file
    #[arg(long)]
    data: PathBuf,

    /// Fraction of samples used for training
    #[arg(short, long, default_value = "0.8")]
    ratio: f64,

    #[command(flatten)]
    model: ModelArgs,
}

#[derive(Args)]
struct GenerateArgs {
    /// Output CSV file
    #[arg(short, long)]
    output: PathBuf,

    /// Number of classes (one blob each)
    #[arg(long, default_value = "4")]
    classes: usize,

    /// Samples per class
    #[arg(long, default_value = "100")]
    per_class: usize,

    /// Feature dimension
    #[arg(long, default_value = "2")]
    dims: usize,

    /// Blob centers are drawn from [-spread, spread] in every dimension
    #[arg(long, default_value = "10.0")]
    spread: f64,

    /// Standard deviation of every blob
    #[arg(long, default_value = "1.0")]
    std: f64,

    /// Random seed
    #[arg(long, default_value = "0")]
    seed: u64,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let result = match cli.command {
        Commands::Train(args) => train_command(args),
        Commands::Predict(args) => predict_command(args),
        Commands::Evaluate(args) => evaluate_command(args),
        Commands::Info(args) => info_command(args),
        Commands::Split(args) => split_command(args),
        Commands::Generate(args) => generate_command(args),
    };

    if let Err(e) = result {
        error!("Error: {e}");
        process::exit(1);
    }
}

/// Parse `name=value` kernel parameters
fn parse_params(raw: &[String]) -> Result<BTreeMap<String, f64>> {
    raw.iter()
        .map(|entry| -> Result<(String, f64)> {
            let (name, value) = entry.split_once('=').ok_or_else(|| {
                SVMError::InvalidParameter(format!("Expected NAME=VALUE, got: {entry}"))
            })?;
            let value = value.trim().parse::<f64>().map_err(|_| {
                SVMError::InvalidParameter(format!("Invalid value for {name}: {value}"))
            })?;
            Ok((name.trim().to_string(), value))
        })
        .collect()
}

fn build_config(args: &ModelArgs) -> Result<SVMConfig> {
    let params = parse_params(&args.params)?;
    let kernel = KernelFunction::from_params(args.kernel.name(), &params)?;

    let mut config = SVMConfig::new(kernel);
    config.lambduh = args.lambda;
    config.solver.max_iterations = args.max_iterations;
    config.solver.tolerance = args.tolerance;
    if let Some(penalty) = args.penalty {
        config.solver.penalty = penalty.into();
    }
    config.classification_strategy = args.strategy.into();
    config.n_folds = args.folds;
    config.lambda_vals = args
        .lambda_values
        .clone()
        .unwrap_or_else(|| DEFAULT_LAMBDA_VALS.to_vec());
    config.use_optimal_lambda = args.optimal_lambda;
    config.fold_policy = FoldPolicy::Shuffled { seed: args.seed };
    config.validate()?;
    Ok(config)
}

fn train_command(args: TrainArgs) -> Result<()> {
    info!("Training SVM model...");
    info!("Data file: {:?}", args.data);

    let config = build_config(&args.model)?;
    info!(
        "Parameters: kernel={}, strategy={}, lambda={}, max_iter={}",
        config.kernel,
        config.classification_strategy,
        if config.use_optimal_lambda {
            "cross-validated".to_string()
        } else {
            config.lambduh.to_string()
        },
        config.solver.max_iterations
    );

    let dataset = CSVDataset::from_file(&args.data)?;
    info!(
        "Loaded {} samples with {} dimensions",
        dataset.len(),
        dataset.dim()
    );

    let mut svm = SVM::new(config)?;
    svm.fit_dataset(&dataset)?;

    info!("Training completed successfully");
    if let Some(lambda) = svm.lambduh() {
        info!("Lambda: {lambda}");
    }
    let unconverged = svm
        .solver_reports()
        .iter()
        .filter(|r| !r.converged())
        .count();
    if unconverged > 0 {
        warn!(
            "{unconverged} of {} classifiers did not reach the tolerance",
            svm.n_classifiers()
        );
    }

    let serializable = SerializableModel::from_svm(&svm)?;
    serializable.save_to_file(&args.output)?;
    info!("Model saved to: {:?}", args.output);

    // Quick evaluation on training data
    let error = svm.evaluate(&dataset)?;
    info!("Training error: {:.2}%", error * 100.0);

    Ok(())
}

fn load_model(path: &Path) -> Result<(SerializableModel, SVM)> {
    info!("Loading model from: {path:?}");
    let serializable = SerializableModel::load_from_file(path)?;
    let svm = serializable.to_svm()?;
    Ok((serializable, svm))
}

fn predict_command(args: PredictArgs) -> Result<()> {
    let (_, svm) = load_model(&args.model)?;

    info!("Loading prediction data from: {:?}", args.data);
    let features = if args.unlabeled {
        CSVDataset::features_from_file(&args.data)?
    } else {
        CSVDataset::from_file(&args.data)?.into_dense().into_parts().0
    };

    let predictions = svm.predict(features.view())?;
    info!("Predicted {} samples", predictions.len());

    // Output results
    if let Some(output_path) = args.output {
        let file = File::create(&output_path).map_err(SVMError::IoError)?;
        let mut writer = BufWriter::new(file);
        for label in &predictions {
            writeln!(writer, "{label}").map_err(SVMError::IoError)?;
        }
        writer.flush().map_err(SVMError::IoError)?;
        info!("Predictions saved to: {output_path:?}");
    } else {
        for label in &predictions {
            println!("{label}");
        }
    }

    Ok(())
}

fn evaluate_command(args: EvaluateArgs) -> Result<()> {
    let (serializable, svm) = load_model(&args.model)?;

    info!("Loading test data from: {:?}", args.data);
    let dataset = CSVDataset::from_file(&args.data)?;
    let error = svm.evaluate(&dataset)?;

    println!("=== Model Evaluation ===");
    serializable.print_summary();

    println!("\nTest Results:");
    println!("  Samples: {}", dataset.len());
    println!("  Misclassification Error: {error:.4}");
    println!("  Accuracy: {:.2}%", (1.0 - error) * 100.0);

    Ok(())
}

fn info_command(args: InfoArgs) -> Result<()> {
    // Rebuilding checks class and row indices before they are printed
    let (serializable, _) = load_model(&args.model)?;

    serializable.print_summary();

    println!("\nClassifier Details:");
    for (i, classifier) in serializable.classifiers.iter().enumerate() {
        let positive = serializable.classes[classifier.positive];
        let negative = classifier
            .negative
            .map_or_else(|| "rest".to_string(), |c| serializable.classes[c].to_string());
        let solver = classifier.solver.as_ref().map_or_else(String::new, |s| {
            format!(
                ", {:?} after {} iterations, objective {:.6}",
                s.termination, s.iterations, s.final_objective
            )
        });
        println!(
            "  #{i}: {positive} vs {negative} ({} training rows{solver})",
            classifier.indices.len()
        );
    }

    Ok(())
}

fn split_command(args: SplitArgs) -> Result<()> {
    info!("Holdout evaluation on {:?} with ratio {}", args.data, args.ratio);

    let config = build_config(&args.model)?;
    let dataset = CSVDataset::from_file(&args.data)?.into_dense();
    let (svm, error) = quick::holdout_error(&dataset, args.ratio, args.model.seed, config)?;

    println!("=== Holdout Evaluation Results ===");
    println!("Data file: {:?}", args.data);
    println!("Train/test ratio: {:.2}/{:.2}", args.ratio, 1.0 - args.ratio);
    println!("Kernel: {}", svm.config().kernel);
    println!("Strategy: {}", svm.config().classification_strategy);
    if let Some(lambda) = svm.lambduh() {
        println!("Lambda: {lambda}");
    }
    println!("Test error: {error:.4}");

    Ok(())
}

fn generate_command(args: GenerateArgs) -> Result<()> {
    let centers = random_centers(args.classes, args.dims, args.spread, args.seed)?;
    let dataset = gaussian_blobs(centers.view(), args.per_class, args.std, args.seed)?;
    dataset.write_csv(&args.output)?;
    info!(
        "Wrote {} samples of dimension {} to {:?}",
        dataset.len(),
        dataset.dim(),
        args.output
    );
    Ok(())
}
