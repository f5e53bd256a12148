// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the malwerk-rectify crate: the full rectification
// run on a synthetic camera frame, and texture encoding of its result.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;

use malwerk_core::PipelineConfig;
use malwerk_rectify::{Rectifier, ResourceLedger, ResourceScope, encode_texture};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A 640x480 frame: dark table with a slightly rotated pale page on it.
fn synthetic_frame() -> RgbaImage {
    let mut frame = RgbaImage::from_pixel(640, 480, Rgba([42, 40, 48, 255]));
    let page = [
        Point::new(110, 70),
        Point::new(530, 95),
        Point::new(515, 410),
        Point::new(95, 385),
    ];
    draw_polygon_mut(&mut frame, &page, Rgba([236, 234, 226, 255]));
    frame
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_rectify(c: &mut Criterion) {
    let frame = synthetic_frame();
    let rectifier = Rectifier::new(&PipelineConfig::default());
    let ledger = ResourceLedger::new();

    c.bench_function("rectify (640x480, rotated page)", |b| {
        b.iter(|| {
            let scope = ResourceScope::new(&ledger, "bench");
            let result = rectifier.run(&scope, black_box(&frame), |_| {});
            black_box(result.is_ok());
        });
    });
}

/// Blank frame: the no-page path including diagnostic downscaling.
fn bench_no_page(c: &mut Criterion) {
    let frame = RgbaImage::from_pixel(1280, 720, Rgba([190, 190, 186, 255]));
    let rectifier = Rectifier::new(&PipelineConfig::default());
    let ledger = ResourceLedger::new();

    c.bench_function("rectify (1280x720, blank wall)", |b| {
        b.iter(|| {
            let scope = ResourceScope::new(&ledger, "bench-blank");
            black_box(rectifier.run(&scope, black_box(&frame), |_| {}).is_err());
        });
    });
}

fn bench_encode_texture(c: &mut Criterion) {
    let page = RgbaImage::from_fn(1600, 1200, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255])
    });

    c.bench_function("encode_texture (1600x1200 -> 800x600 JPEG)", |b| {
        b.iter(|| {
            let texture = encode_texture(black_box(&page), 1024, 95);
            black_box(texture.map(|t| t.bytes.len()).unwrap_or_default());
        });
    });
}

criterion_group!(benches, bench_rectify, bench_no_page, bench_encode_texture);
criterion_main!(benches);
