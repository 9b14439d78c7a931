//! Benchmarks for the per-piece pipeline.

use criterion::{criterion_group, criterion_main, Criterion};
use jigsaw_synth::assemble::assemble_piece;
use jigsaw_synth::prelude::*;

fn bench_assembly(c: &mut Criterion) {
    let section = TemplateSection::build(&TemplateOptions::default()).unwrap();
    let config = PieceConfig::default();
    let backend = MeshBackend::default();

    c.bench_function("assemble_piece", |b| {
        let mut sampler = ParameterSampler::new(0);
        b.iter(|| {
            let params = sampler.iteration_params(&config);
            assemble_piece(&section, &params, &config, &mut sampler, &backend).unwrap()
        });
    });

    c.bench_function("generate_labels", |b| {
        let generator = PieceGenerator::new(&section, &config, &backend, &PlanarUnwrap);
        let mut sampler = ParameterSampler::new(0);
        b.iter(|| {
            let mut scene = SceneState::default();
            generator
                .generate(&mut sampler, ImageSize::new(1920, 1080), &mut scene.material)
                .unwrap()
        });
    });
}

fn bench_finishing(c: &mut Criterion) {
    let section = TemplateSection::build(&TemplateOptions::default()).unwrap();
    let config = PieceConfig::default();
    let backend = MeshBackend::default();
    let generator = PieceGenerator::new(&section, &config, &backend, &PlanarUnwrap);
    let mut sampler = ParameterSampler::new(0);
    let mut scene = SceneState::default();
    let piece = generator
        .generate(&mut sampler, ImageSize::new(1024, 1024), &mut scene.material)
        .unwrap()
        .piece;

    let mut group = c.benchmark_group("evaluate_finish");
    group.sample_size(10);
    group.bench_function("parallel", |b| b.iter(|| piece.evaluate(&backend).unwrap()));
    let sequential = MeshBackend::new(jigsaw_synth::backend::BackendOptions::default().sequential());
    group.bench_function("sequential", |b| {
        b.iter(|| piece.evaluate(&sequential).unwrap())
    });
    group.finish();
}

criterion_group!(benches, bench_assembly, bench_finishing);
criterion_main!(benches);
