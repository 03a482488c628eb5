//! Benchmarks for the per-phase CPU work.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec2;

use heartburst::config::{FireworkConfig, ParticleConfig};
use heartburst::fireworks::{BurstKind, FireworkShow, RasterCanvas};
use heartburst::heart::{build_points, generate_anchors, HeartMetrics};
use heartburst::particles::ParticleField;
use heartburst::scatter::Scatter;
use heartburst::text::{BitmapFont, GlyphLayout, TextFrame, TextRasterizer};

fn bench_rasterize(c: &mut Criterion) {
    let mut group = c.benchmark_group("rasterize");
    let frame = TextFrame {
        size_hint: 720.0,
        visible_height: 182.25,
    };

    for step in [2u32, 3, 4] {
        group.bench_with_input(BenchmarkId::new("2026", step), &step, |b, &step| {
            let mut rasterizer = TextRasterizer::new(BitmapFont, step, 5600);
            b.iter(|| black_box(rasterizer.rasterize("2026", &GlyphLayout::Centered, &frame)))
        });
    }

    group.bench_function("measured_prefix", |b| {
        let mut rasterizer = TextRasterizer::new(BitmapFont, 3, 5600);
        let layout = GlyphLayout::Measured {
            layout_text: "HAPPY NEW YEAR!".into(),
        };
        b.iter(|| black_box(rasterizer.rasterize("HAPPY NEW", &layout, &frame)))
    });

    group.finish();
}

fn bench_heart(c: &mut Criterion) {
    let mut group = c.benchmark_group("heart");
    let metrics = HeartMetrics::compute(220.0, 45.0, 0.6);

    group.bench_function("build_points_4200", |b| {
        let mut rng = Scatter::seeded(1);
        b.iter(|| black_box(build_points(&metrics, 18.0, 4200, &mut rng)))
    });

    for count in [8usize, 24, 48] {
        group.bench_with_input(BenchmarkId::new("anchors", count), &count, |b, &count| {
            let mut rng = Scatter::seeded(2);
            b.iter(|| black_box(generate_anchors(&metrics, 18.0, count, &mut rng)))
        });
    }

    group.finish();
}

fn bench_particles(c: &mut Criterion) {
    let mut group = c.benchmark_group("particles");
    let config = ParticleConfig::default();

    group.bench_function("morph_5600", |b| {
        let mut field = ParticleField::new(&config, Scatter::seeded(3));
        let metrics = HeartMetrics::compute(220.0, 45.0, 0.6);
        let points = build_points(&metrics, 18.0, 5600, &mut Scatter::seeded(4));
        field.set_targets(&points, None);
        field.set_mode(heartburst::ParticleMode::Morphing);
        let mut now = 0.0;
        b.iter(|| {
            now += 16.0;
            field.update(black_box(1.0 / 60.0), now);
        })
    });

    group.finish();
}

fn bench_fireworks(c: &mut Criterion) {
    let mut group = c.benchmark_group("fireworks");
    let config = FireworkConfig::default();

    for kind in BurstKind::ALL {
        group.bench_with_input(BenchmarkId::new("tick", format!("{kind:?}")), &kind, |b, &kind| {
            let mut canvas = RasterCanvas::new(640.0, 360.0, 1.0);
            b.iter_batched(
                || {
                    let mut show = FireworkShow::new(&config, Scatter::seeded(5)).unwrap();
                    show.emit(kind, Vec2::new(320.0, 120.0));
                    show
                },
                |mut show| {
                    show.tick(1.0 / 60.0, 0.0, &mut canvas);
                    black_box(show.particles().len())
                },
                criterion::BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_rasterize, bench_heart, bench_particles, bench_fireworks);
criterion_main!(benches);
