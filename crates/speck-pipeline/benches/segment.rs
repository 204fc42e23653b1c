use criterion::{Criterion, black_box, criterion_group, criterion_main};

use speck_pipeline::{BlobSegmenter, ForegroundMask, WindowSpec};

/// Horizontal stripes with periodic vertical bridges: many provisional
/// labels, a realistic amount of equivalence merging.
fn synthetic_mask(width: u32, height: u32) -> ForegroundMask {
    ForegroundMask::from_fn(width, height, |x, y| {
        let stripe = y % 12 < 3;
        let bridge = x % 64 < 2 && y % 12 < 8;
        stripe || bridge
    })
}

fn bench_segment(c: &mut Criterion) {
    let mask = synthetic_mask(1280, 1024);

    c.bench_function("segment_1280x1024_stripes", |b| {
        b.iter(|| {
            let mut segmenter =
                BlobSegmenter::new(black_box(mask.clone()), WindowSpec::full());
            segmenter.segment();
            black_box(segmenter.max_label())
        });
    });
}

criterion_group!(benches, bench_segment);
criterion_main!(benches);
