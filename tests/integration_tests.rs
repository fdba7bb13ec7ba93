//! Integration tests for the fastsvm library
//!
//! These tests verify end-to-end functionality across multiple modules
//! and validate real-world usage scenarios.

use approx::assert_abs_diff_eq;
use fastsvm::api::{quick, SVM, DEFAULT_LAMBDA_VALS};
use fastsvm::binary::{BinaryClassifier, BinaryTask};
use fastsvm::data::{gaussian_blobs, random_centers};
use fastsvm::kernel::{Kernel, KernelFunction, KernelMatrix};
use fastsvm::multiclass::Strategy;
use fastsvm::persistence::SerializableModel;
use fastsvm::validation::{CrossValidator, FoldPolicy};
use fastsvm::{CSVDataset, Dataset, Penalty, SVMError, SolverConfig};
use ndarray::{array, Array1, Array2};
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

/// Two well separated blobs, classes 0 and 1
fn two_blobs(seed: u64) -> fastsvm::DenseDataset {
    let centers = array![[-5.0, -5.0], [5.0, 5.0]];
    gaussian_blobs(centers.view(), 50, 1.0, seed).expect("Failed to generate blobs")
}

/// Linear binary fit on separated blobs reaches zero training error
#[test]
fn test_binary_linear_blobs() {
    let data = two_blobs(1);

    let mut svm = SVM::builder(KernelFunction::linear())
        .with_lambda(0.01)
        .with_strategy(Strategy::Binary)
        .build()
        .expect("Valid configuration");
    svm.fit_dataset(&data).expect("Training should succeed");

    assert_eq!(svm.classes(), &[0, 1]);
    assert_eq!(svm.n_classifiers(), 1);
    let error = svm.evaluate(&data).expect("Evaluation should succeed");
    assert_abs_diff_eq!(error, 0.0);

    // Fresh samples from the same blobs
    let test = two_blobs(2);
    assert!(svm.evaluate(&test).unwrap() < 0.02);
}

/// Sigmoid fits with its default penalty on the same blobs
#[test]
fn test_binary_sigmoid_blobs() {
    let data = two_blobs(1);
    let kernel = KernelFunction::sigmoid(0.01, -1.0).unwrap();

    let mut svm = SVM::builder(kernel)
        .with_lambda(0.01)
        .with_strategy(Strategy::Binary)
        .build()
        .unwrap();
    assert_eq!(svm.config().solver.penalty, Penalty::Ridge);
    svm.fit_dataset(&data).expect("Sigmoid training should succeed");

    assert!(svm.evaluate(&data).unwrap() <= 0.01);
    assert!(svm.evaluate(&two_blobs(2)).unwrap() <= 0.02);
}

/// Cross-validated rbf one-vs-rest on four blobs in 60 dimensions
#[test]
fn test_ovr_rbf_cross_validated_blobs() {
    let centers = random_centers(4, 60, 5.0, 7).unwrap();
    let data = gaussian_blobs(centers.view(), 100, 1.0, 8).unwrap();
    let lambda_vals = DEFAULT_LAMBDA_VALS.to_vec();

    let mut svm = SVM::builder(KernelFunction::rbf(15.0).unwrap())
        .with_strategy(Strategy::OneVsRest)
        .with_folds(3)
        .with_lambda_vals(lambda_vals.clone())
        .with_optimal_lambda(true)
        .build()
        .unwrap();

    let (train, test) = data.train_test_split(0.75, 3).unwrap();
    svm.fit_dataset(&train).expect("Training should succeed");

    let lambda = svm.lambduh().expect("Fitted model has a lambda");
    assert!(lambda_vals.contains(&lambda));
    assert!(svm.lambda_from_cv());
    assert_eq!(svm.n_classifiers(), 4);

    let cv = svm.cross_validation().expect("Cross-validation ran");
    assert_eq!(cv.best_lambda, lambda);
    assert_eq!(cv.mean_errors.len(), lambda_vals.len());
    assert_eq!(cv.table.len(), lambda_vals.len() * 3);

    let error = svm.evaluate(&test).unwrap();
    assert!(error < 0.05, "Held-out error too high: {error}");
}

#[test]
fn test_zero_folds_rejected() {
    let result = SVM::builder(KernelFunction::linear())
        .with_folds(0)
        .with_optimal_lambda(true)
        .build();
    assert!(matches!(result, Err(SVMError::InvalidConfiguration(_))));
}

#[test]
fn test_more_folds_than_samples_rejected() {
    let x = array![[0.0], [1.0], [2.0], [3.0]];
    let y = vec![0, 0, 1, 1];
    let mut svm = SVM::builder(KernelFunction::linear())
        .with_folds(5)
        .with_optimal_lambda(true)
        .build()
        .unwrap();
    assert!(matches!(
        svm.fit(x.view(), &y),
        Err(SVMError::InvalidConfiguration(_))
    ));
    assert!(!svm.is_fitted());
}

#[test]
fn test_binary_strategy_rejects_three_classes() {
    let x = array![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
    let y = vec![1, 2, 3];
    let mut svm = SVM::builder(KernelFunction::linear())
        .with_strategy(Strategy::Binary)
        .build()
        .unwrap();
    assert!(matches!(
        svm.fit(x.view(), &y),
        Err(SVMError::InvalidConfiguration(_))
    ));
}

#[test]
fn test_single_class_rejected() {
    let x = array![[0.0], [1.0]];
    let mut svm = SVM::builder(KernelFunction::linear()).build().unwrap();
    assert!(matches!(
        svm.fit(x.view(), &[4, 4]),
        Err(SVMError::InvalidInput(_))
    ));
}

#[test]
fn test_predict_is_idempotent() {
    let centers = array![[0.0, 6.0], [6.0, 0.0], [-6.0, -6.0]];
    let data = gaussian_blobs(centers.view(), 20, 1.0, 4).unwrap();
    let mut svm = SVM::builder(KernelFunction::rbf(3.0).unwrap())
        .with_lambda(0.1)
        .build()
        .unwrap();
    svm.fit_dataset(&data).unwrap();

    let probe = array![[0.5, 5.0], [5.5, 0.5], [-5.0, -6.5], [0.0, 0.0]];
    let first = svm.predict(probe.view()).unwrap();
    let second = svm.predict(probe.view()).unwrap();
    assert_eq!(first, second);
    assert_eq!(&first[..3], &[0, 1, 2]);
}

#[test]
fn test_classifier_counts_per_strategy() {
    let centers = array![[0.0, 8.0], [8.0, 0.0], [-8.0, 0.0], [0.0, -8.0]];
    let data = gaussian_blobs(centers.view(), 10, 0.5, 5).unwrap();

    for (strategy, expected) in [(Strategy::OneVsRest, 4), (Strategy::OneVsOne, 6)] {
        let mut svm = SVM::builder(KernelFunction::linear())
            .with_lambda(0.01)
            .with_strategy(strategy)
            .build()
            .unwrap();
        svm.fit_dataset(&data).unwrap();
        assert_eq!(svm.n_classifiers(), expected, "{strategy}");
        assert_eq!(svm.solver_reports().len(), expected);
        assert_eq!(svm.evaluate(&data).unwrap(), 0.0, "{strategy}");
    }
}

/// One fold trains and tests on everything, so the CV error is the
/// training error of a full fit
#[test]
fn test_single_fold_cv_equals_training_error() {
    let centers = array![[-1.0, 0.0], [1.0, 0.0]];
    let data = gaussian_blobs(centers.view(), 15, 1.0, 6).unwrap();
    let labels: Array1<f64> = data
        .labels()
        .iter()
        .map(|&c| if c == 1 { 1.0 } else { -1.0 })
        .collect();
    let context = Arc::new(KernelMatrix::new(
        KernelFunction::linear(),
        data.features().to_owned(),
    ));
    let config = SolverConfig::default();
    let lambda = 0.5;

    let task = BinaryTask::new(Arc::clone(&context), labels.clone(), config.clone()).unwrap();
    let cv = CrossValidator::new(1, vec![lambda], FoldPolicy::Sequential)
        .unwrap()
        .run(&task)
        .unwrap();

    let mut classifier = BinaryClassifier::new(
        context,
        (0..data.len()).collect(),
        labels.clone(),
        lambda,
        config,
    )
    .unwrap();
    classifier.fit().unwrap();
    let training_error = classifier
        .misclassification_error(data.features(), labels.view())
        .unwrap();

    assert_eq!(cv.table.len(), 1);
    assert_abs_diff_eq!(cv.best_error(), training_error, epsilon = 1e-12);
}

#[test]
fn test_kernel_matrices_symmetric() {
    let x = Array2::from_shape_fn((12, 3), |(i, j)| ((i * 7 + j * 3) % 5) as f64 - 2.0);
    let kernels = [
        KernelFunction::linear(),
        KernelFunction::polynomial(3).unwrap(),
        KernelFunction::rbf(1.5).unwrap(),
        KernelFunction::sigmoid(0.1, -0.5).unwrap(),
    ];
    for kernel in kernels {
        let matrix = KernelMatrix::new(kernel, x.clone());
        let gram = matrix.gram();
        for i in 0..x.nrows() {
            for j in 0..x.nrows() {
                assert_eq!(gram[[i, j]], gram[[j, i]], "{kernel}");
                assert_abs_diff_eq!(
                    gram[[i, j]],
                    kernel.compute(x.row(i), x.row(j)),
                    epsilon = 1e-9
                );
            }
        }
    }
}

#[test]
fn test_rbf_values_in_unit_interval() {
    let kernel = KernelFunction::rbf(0.7).unwrap();
    let x = Array2::from_shape_fn((8, 4), |(i, j)| (i as f64 - 3.5) * (j as f64 + 0.5));
    let gram = kernel.gram(x.view());
    assert!(gram.iter().all(|&v| v > 0.0 && v <= 1.0));
    for i in 0..x.nrows() {
        assert_abs_diff_eq!(gram[[i, i]], 1.0, epsilon = 1e-12);
    }
}

#[test]
fn test_csv_train_save_load_predict() {
    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    writeln!(temp_file, "f1,f2,label").unwrap();
    writeln!(temp_file, "3.0,0.5,10").unwrap();
    writeln!(temp_file, "2.8,0.1,10").unwrap();
    writeln!(temp_file, "3.2,-0.3,10").unwrap();
    writeln!(temp_file, "-3.0,0.2,20").unwrap();
    writeln!(temp_file, "-2.8,-0.1,20").unwrap();
    writeln!(temp_file, "-3.1,0.4,20").unwrap();
    writeln!(temp_file, "0.1,4.0,30").unwrap();
    writeln!(temp_file, "-0.2,3.7,30").unwrap();
    writeln!(temp_file, "0.3,4.4,30").unwrap();
    temp_file.flush().unwrap();

    let svm = quick::train_csv(temp_file.path(), KernelFunction::rbf(2.0).unwrap())
        .expect("CSV training should succeed");
    assert_eq!(svm.classes(), &[10, 20, 30]);

    let dataset = CSVDataset::from_file(temp_file.path()).unwrap();
    assert_eq!(svm.evaluate(&dataset).unwrap(), 0.0);

    let model_file = NamedTempFile::new().unwrap();
    SerializableModel::from_svm(&svm)
        .unwrap()
        .save_to_file(model_file.path())
        .unwrap();
    let restored = SerializableModel::load_from_file(model_file.path())
        .unwrap()
        .to_svm()
        .unwrap();

    let probe = array![[2.5, 0.0], [-2.5, 0.0], [0.0, 3.5], [0.7, 0.9]];
    assert_eq!(
        restored.predict(probe.view()).unwrap(),
        svm.predict(probe.view()).unwrap()
    );
}

#[test]
fn test_holdout_error_helper() {
    let data = two_blobs(9);
    let mut config = fastsvm::SVMConfig::new(KernelFunction::linear());
    config.lambduh = 0.01;
    let (svm, error) = quick::holdout_error(&data, 0.8, 1, config).unwrap();
    assert!(svm.is_fitted());
    assert!(error <= 0.05);
}

#[test]
fn test_feature_dimension_mismatch() {
    let data = two_blobs(3);
    let mut svm = SVM::builder(KernelFunction::linear()).build().unwrap();
    svm.fit_dataset(&data).unwrap();
    let wrong = array![[1.0, 2.0, 3.0]];
    assert!(matches!(
        svm.predict(wrong.view()),
        Err(SVMError::InvalidInput(_))
    ));
}
