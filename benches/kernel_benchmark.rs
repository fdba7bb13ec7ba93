use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fastsvm::binary::BinaryClassifier;
use fastsvm::data::{gaussian_blobs, random_centers};
use fastsvm::kernel::{KernelFunction, KernelMatrix};
use fastsvm::multiclass::Strategy;
use fastsvm::{Dataset, DenseDataset, SolverConfig, SVM};
use ndarray::Array1;
use std::sync::Arc;

fn blobs(n_classes: usize, per_class: usize, dims: usize) -> DenseDataset {
    let centers = random_centers(n_classes, dims, 5.0, 40).unwrap();
    gaussian_blobs(centers.view(), per_class, 1.0, 41).unwrap()
}

fn gram_bench(c: &mut Criterion) {
    let kernels = [
        KernelFunction::linear(),
        KernelFunction::polynomial(3).unwrap(),
        KernelFunction::rbf(15.0).unwrap(),
        KernelFunction::sigmoid(0.01, -1.0).unwrap(),
    ];
    let mut group = c.benchmark_group("gram_matrix");
    for n in [100, 400] {
        let data = blobs(2, n / 2, 60);
        for kernel in kernels {
            group.bench_with_input(BenchmarkId::new(kernel.name(), n), &data, |b, data| {
                b.iter(|| black_box(KernelMatrix::new(kernel, data.features().to_owned())))
            });
        }
    }
    group.finish();
}

fn binary_fit_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("binary_fit");
    for n in [100, 400] {
        let data = blobs(2, n / 2, 60);
        let labels: Array1<f64> = data
            .labels()
            .iter()
            .map(|&c| if c == 1 { 1.0 } else { -1.0 })
            .collect();
        let context = Arc::new(KernelMatrix::new(
            KernelFunction::rbf(15.0).unwrap(),
            data.features().to_owned(),
        ));
        let indices: Vec<usize> = (0..n).collect();

        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                let mut classifier = BinaryClassifier::new(
                    Arc::clone(&context),
                    indices.clone(),
                    labels.clone(),
                    0.01,
                    SolverConfig::default(),
                )
                .unwrap();
                classifier.fit().unwrap();
                black_box(classifier)
            })
        });
    }
    group.finish();
}

fn multiclass_fit_bench(c: &mut Criterion) {
    let data = blobs(4, 50, 60);
    let mut group = c.benchmark_group("multiclass_fit");
    group.sample_size(10);
    for strategy in [Strategy::OneVsRest, Strategy::OneVsOne] {
        group.bench_function(strategy.to_string(), |b| {
            b.iter(|| {
                let mut svm = SVM::builder(KernelFunction::rbf(15.0).unwrap())
                    .with_lambda(0.01)
                    .with_strategy(strategy)
                    .build()
                    .unwrap();
                svm.fit_dataset(&data).unwrap();
                black_box(svm)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, gram_bench, binary_fit_bench, multiclass_fit_bench);
criterion_main!(benches);
