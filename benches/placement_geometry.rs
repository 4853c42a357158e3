// Run with: cargo bench --bench placement_geometry

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use logoplace_core::{map_overlay_to_pdf, resize, select_page, Corner, PageSize, PixelRect};

fn benchmark_placement(c: &mut Criterion) {
    let pages: Vec<PixelRect> = (0..200)
        .map(|i| PixelRect::new(40.0, i as f64 * 1010.0, 780.0, 1000.0))
        .collect();
    let overlay = PixelRect::new(300.0, 150_600.0, 120.0, 80.0);

    c.bench_function("map_overlay_to_pdf", |b| {
        b.iter(|| {
            map_overlay_to_pdf(
                black_box(&overlay),
                black_box(&pages[149]),
                PageSize {
                    width: 612.0,
                    height: 792.0,
                },
            )
        })
    });

    c.bench_function("select_page_200_pages", |b| {
        b.iter(|| select_page(black_box(&overlay), black_box(&pages)))
    });

    c.bench_function("resize_all_corners", |b| {
        b.iter(|| {
            for corner in Corner::ALL {
                black_box(resize(corner, &overlay, black_box(-150.0), black_box(35.0), 8.0));
            }
        })
    });
}

criterion_group!(benches, benchmark_placement);
criterion_main!(benches);
