use criterion::{black_box, criterion_group, criterion_main, Criterion};
use motionkit_core::{CartesianPosition, MotionRequest};
use motionkit_kinematics::{KinematicsRegistry, Segmenter};
use motionkit_settings::{DeltaSettings, KinematicsSettings, MachineConfig, MotionSettings};

fn delta_config() -> MachineConfig {
    MachineConfig {
        kinematics: KinematicsSettings::ParallelDelta(DeltaSettings::default()),
        ..MachineConfig::default()
    }
}

fn bench_delta_transforms(c: &mut Criterion) {
    let model = KinematicsRegistry::new().create(&delta_config()).unwrap();
    let target = CartesianPosition::new(vec![25.0, -12.0, -135.0]);
    let motors = model.inverse(&target).unwrap();

    c.bench_function("delta_inverse", |b| {
        b.iter(|| model.inverse(black_box(&target)))
    });
    c.bench_function("delta_forward", |b| {
        b.iter(|| model.forward(black_box(&motors), 3))
    });
}

fn bench_segmentation(c: &mut Criterion) {
    let model = KinematicsRegistry::new().create(&delta_config()).unwrap();
    let segmenter = Segmenter::from_settings(&MotionSettings::default()).unwrap();
    let start = CartesianPosition::new(vec![-30.0, -30.0, -120.0]);
    let request = MotionRequest::linear(CartesianPosition::new(vec![30.0, 30.0, -150.0]), 1200.0);

    c.bench_function("delta_segment_line", |b| {
        b.iter(|| segmenter.segment(&model, black_box(&start), black_box(&request)))
    });
}

criterion_group!(benches, bench_delta_transforms, bench_segmentation);
criterion_main!(benches);
