//! Benchmarking the parallel window dispatcher against a serial
//! window iterator loop, for a few chunk sizes.
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use criterion::BenchmarkId;

use yayi_core::{Coordinate, Image, ParallelConfig, Window, WindowDispatcher};

const SIZE : [i64; 3] = [256, 256, 32];

fn criterion_benchmark_window_dispatch(c : &mut Criterion) {
    let mut image = Image::<f32>::with_size(Coordinate::from(SIZE)).unwrap();
    image.allocate_image().unwrap();
    let window = Window::new(Coordinate::from([16, 16, 4]), Coordinate::from([224, 224, 24])).unwrap();

    let mut dispatch_bench = c.benchmark_group("Window dispatch benchmarks");

    dispatch_bench.bench_with_input(
        BenchmarkId::new("Serial window iterator", 0),
        &window,
        |bench, window| {
            bench.iter(|| {
                let end = image.end_window(window).unwrap().cursor();
                let mut it = image.begin_window_mut(window).unwrap();
                while it != end {
                    let position = it.position();
                    *it.get_mut() = (position[0] + position[1] + position[2]) as f32;
                    it.increment();
                }
            })
        },
    );

    for rows in [1, 4, 16] {
        let dispatcher = WindowDispatcher::new(ParallelConfig::default().rows_per_chunk(rows)).unwrap();
        dispatch_bench.bench_with_input(
            BenchmarkId::new("Parallel dispatch, rows per chunk", rows),
            &window,
            |bench, window| {
                bench.iter(|| black_box(dispatcher.apply_window(&mut image, window, |position, pixel| {
                    *pixel = (position[0] + position[1] + position[2]) as f32;
                    Ok(())
                }).unwrap()))
            },
        );
    }

    dispatch_bench.finish();
}

criterion_group!(benches, criterion_benchmark_window_dispatch);
criterion_main!(benches);
