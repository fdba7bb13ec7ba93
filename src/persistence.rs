//! Model serialization and persistence
//!
//! This module saves fitted SVM models as JSON and restores them for use
//! with the CLI application and other scenarios where model persistence is
//! needed. A model stores its training samples, since prediction evaluates
//! the kernel against them.

use crate::api::{SVMConfig, SVM};
use crate::binary::BinaryClassifier;
use crate::core::{ClassLabel, Result, SVMError, SolverReport, TerminationReason};
use crate::kernel::KernelMatrix;
use crate::multiclass::{MulticlassDecomposer, SubClassifier};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::Arc;

/// Serializable representation of a fitted SVM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializableModel {
    /// Configuration the model was built with
    pub config: SVMConfig,
    /// Sorted class labels
    pub classes: Vec<ClassLabel>,
    /// Regularization strength used for the final fit
    pub lambda: f64,
    /// Training samples, one row per sample
    pub samples: Vec<Vec<f64>>,
    pub classifiers: Vec<SerializableClassifier>,
    pub metadata: ModelMetadata,
}

/// One fitted binary sub-classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializableClassifier {
    /// Class index labelled +1
    pub positive: usize,
    /// Class index labelled -1, absent for one-vs-rest
    pub negative: Option<usize>,
    /// Training rows within `samples`
    pub indices: Vec<usize>,
    /// ±1 label per training row
    pub labels: Vec<f64>,
    /// Kernel coefficients per training row
    pub beta: Vec<f64>,
    pub solver: Option<SolverSummary>,
}

/// Solver diagnostics kept for reference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverSummary {
    pub iterations: usize,
    pub termination: TerminationReason,
    pub final_objective: f64,
    pub gradient_norm: f64,
}

/// Model metadata for tracking and validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Library version used to create the model
    pub library_version: String,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    pub n_samples: usize,
    pub n_features: usize,
    pub n_classifiers: usize,
    /// Whether λ was selected by cross-validation
    pub lambda_from_cv: bool,
}

impl From<&SolverReport> for SolverSummary {
    fn from(report: &SolverReport) -> Self {
        Self {
            iterations: report.iterations,
            termination: report.termination,
            final_objective: report.final_objective(),
            gradient_norm: report.gradient_norm,
        }
    }
}

impl SerializableModel {
    /// Capture a fitted model
    ///
    /// # Errors
    /// `ModelNotTrained` if `svm` has not been fitted.
    pub fn from_svm(svm: &SVM) -> Result<Self> {
        let decomposer = svm.decomposer()?;
        let context = decomposer.context();

        let classifiers = decomposer
            .members()
            .iter()
            .map(|member| -> Result<SerializableClassifier> {
                let classifier = member.classifier();
                Ok(SerializableClassifier {
                    positive: member.positive(),
                    negative: member.negative(),
                    indices: classifier.indices().to_vec(),
                    labels: classifier.labels().to_vec(),
                    beta: classifier.beta()?.to_vec(),
                    solver: classifier.report().map(SolverSummary::from),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            config: svm.config().clone(),
            classes: decomposer.classes().to_vec(),
            lambda: svm.lambduh().ok_or(SVMError::ModelNotTrained)?,
            samples: context
                .samples()
                .outer_iter()
                .map(|row| row.to_vec())
                .collect(),
            metadata: ModelMetadata {
                library_version: env!("CARGO_PKG_VERSION").to_string(),
                created_at: chrono::Utc::now().to_rfc3339(),
                n_samples: context.len(),
                n_features: context.dim(),
                n_classifiers: classifiers.len(),
                lambda_from_cv: svm.lambda_from_cv(),
            },
            classifiers,
        })
    }

    /// Rebuild a fitted `SVM` whose predictions match the saved one
    ///
    /// The Gram matrix is recomputed from the stored samples.
    pub fn to_svm(&self) -> Result<SVM> {
        self.config.validate()?;

        let n_features = self.samples.first().map_or(0, Vec::len);
        if self.samples.iter().any(|row| row.len() != n_features) {
            return Err(SVMError::SerializationError(
                "Stored samples have inconsistent dimensions".to_string(),
            ));
        }
        let flat: Vec<f64> = self.samples.iter().flatten().copied().collect();
        let samples = Array2::from_shape_vec((self.samples.len(), n_features), flat)
            .map_err(|e| SVMError::SerializationError(e.to_string()))?;
        let context = Arc::new(KernelMatrix::new(self.config.kernel, samples));

        let members = self
            .classifiers
            .iter()
            .map(|stored| -> Result<SubClassifier> {
                let classifier = BinaryClassifier::from_parts(
                    Arc::clone(&context),
                    stored.indices.clone(),
                    Array1::from(stored.labels.clone()),
                    self.lambda,
                    self.config.solver.clone(),
                    Array1::from(stored.beta.clone()),
                )?;
                Ok(SubClassifier::new(stored.positive, stored.negative, classifier))
            })
            .collect::<Result<Vec<_>>>()?;

        let decomposer = MulticlassDecomposer::from_parts(
            self.config.classification_strategy,
            context,
            self.classes.clone(),
            members,
        )?;
        SVM::from_parts(
            self.config.clone(),
            decomposer,
            self.lambda,
            self.metadata.lambda_from_cv,
        )
    }

    /// Save model to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path).map_err(SVMError::IoError)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| SVMError::SerializationError(e.to_string()))?;
        Ok(())
    }

    /// Load model from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path).map_err(SVMError::IoError)?;
        let reader = BufReader::new(file);
        let model = serde_json::from_reader(reader)
            .map_err(|e| SVMError::SerializationError(e.to_string()))?;
        Ok(model)
    }

    /// Print model summary
    pub fn print_summary(&self) {
        println!("=== SVM Model Summary ===");
        println!("Kernel: {}", self.config.kernel);
        println!("Strategy: {}", self.config.classification_strategy);
        println!("Classes: {:?}", self.classes);
        println!("Classifiers: {}", self.metadata.n_classifiers);
        println!(
            "Training Samples: {} ({} features)",
            self.metadata.n_samples, self.metadata.n_features
        );
        println!(
            "Lambda: {}{}",
            self.lambda,
            if self.metadata.lambda_from_cv {
                " (cross-validated)"
            } else {
                ""
            }
        );
        println!("Library Version: {}", self.metadata.library_version);
        println!("Created: {}", self.metadata.created_at);
        println!("Solver Parameters:");
        println!("  Max Iterations: {}", self.config.solver.max_iterations);
        println!("  Tolerance: {}", self.config.solver.tolerance);
        println!("  Penalty: {:?}", self.config.solver.penalty);

        let unconverged = self
            .classifiers
            .iter()
            .filter_map(|c| c.solver.as_ref())
            .filter(|s| s.termination != TerminationReason::Converged)
            .count();
        if unconverged > 0 {
            println!("  Unconverged Classifiers: {unconverged}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::KernelFunction;
    use crate::multiclass::Strategy;
    use ndarray::array;
    use tempfile::NamedTempFile;

    fn fitted(strategy: Strategy) -> (SVM, Array2<f64>) {
        let x = array![
            [0.0, 4.0],
            [0.5, 4.5],
            [4.0, -2.0],
            [4.5, -2.5],
            [-4.0, -2.0],
            [-4.5, -2.5]
        ];
        let y = vec![1, 1, 2, 2, 3, 3];
        let mut svm = SVM::builder(KernelFunction::rbf(1.5).unwrap())
            .with_lambda(0.05)
            .with_strategy(strategy)
            .build()
            .unwrap();
        svm.fit(x.view(), &y).unwrap();
        (svm, x)
    }

    #[test]
    fn test_model_round_trip_preserves_predictions() -> Result<()> {
        for strategy in [Strategy::OneVsRest, Strategy::OneVsOne] {
            let (svm, x) = fitted(strategy);
            let serializable = SerializableModel::from_svm(&svm)?;

            let temp_file = NamedTempFile::new().expect("Failed to create temp file");
            serializable.save_to_file(temp_file.path())?;
            let loaded = SerializableModel::load_from_file(temp_file.path())?;

            assert_eq!(loaded.classes, vec![1, 2, 3]);
            assert_eq!(loaded.metadata.n_classifiers, 3);
            assert_eq!(loaded.config, *svm.config());

            let restored = loaded.to_svm()?;
            let probe = array![[0.2, 4.1], [4.2, -2.2], [-4.1, -2.4], [1.0, 3.0]];
            assert_eq!(restored.predict(probe.view())?, svm.predict(probe.view())?);
            assert_eq!(restored.predict(x.view())?, vec![1, 1, 2, 2, 3, 3]);
            assert_eq!(restored.lambduh(), Some(0.05));
        }
        Ok(())
    }

    #[test]
    fn test_unfitted_model_cannot_be_saved() {
        let svm = SVM::builder(KernelFunction::linear()).build().unwrap();
        assert!(matches!(
            SerializableModel::from_svm(&svm),
            Err(SVMError::ModelNotTrained)
        ));
    }

    #[test]
    fn test_corrupt_model_rejected() {
        let (svm, _) = fitted(Strategy::OneVsRest);
        let mut model = SerializableModel::from_svm(&svm).unwrap();
        model.classifiers[0].beta.pop();
        assert!(matches!(model.to_svm(), Err(SVMError::InvalidInput(_))));

        let mut model = SerializableModel::from_svm(&svm).unwrap();
        model.samples[1].push(1.0);
        assert!(matches!(
            model.to_svm(),
            Err(SVMError::SerializationError(_))
        ));
    }

    #[test]
    fn test_load_invalid_json() {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        std::fs::write(temp_file.path(), "{ not json").unwrap();
        assert!(matches!(
            SerializableModel::load_from_file(temp_file.path()),
            Err(SVMError::SerializationError(_))
        ));
    }
}
