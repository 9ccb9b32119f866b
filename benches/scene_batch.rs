#![feature(test)]

extern crate test;

use mht::prelude::*;
use mht::test_stuff::{frame, PointGen2};
use test::Bencher;

#[bench]
fn bench_batch_0004x100(b: &mut Bencher) {
    bench_batch(4, 100, b);
}

#[bench]
fn bench_batch_0016x100(b: &mut Bencher) {
    bench_batch(16, 100, b);
}

fn bench_batch(scenes: u64, objects: usize, b: &mut Bencher) {
    let config = TrackerOptions::new()
        .prediction_threshold(1.0)
        .initial_threshold(4.0)
        .build()
        .unwrap();
    let mut batch = SceneBatch::new().unwrap();
    let mut generators = Vec::default();
    for scene in 0..scenes {
        batch.add_scene(scene, ExtendedCoordinateTracker::<2>::new(&config));
        generators.push(
            (0..objects)
                .map(|i| PointGen2::new(100.0 * i as f32, 0.0, 0.0, 1.0, 0.1))
                .collect::<Vec<_>>(),
        );
    }

    let mut t = 0;
    b.iter(|| {
        let mut records = BatchRecords::default();
        for (scene, g) in generators.iter_mut().enumerate() {
            records.insert(scene as u64, frame(g));
        }
        batch.add_measurements(&records, t).unwrap();
        t += 1;
    });
}
