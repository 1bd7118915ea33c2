use cookie_dispatch::{
    Cookie, CookieCell, CookieDispatcher, DispatchConfig, OffsetCookieReader, Request,
    ResponseBuffer,
};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use std::sync::Arc;
use std::thread;

const HEADER: [u8; 8] = [4, 11, 0, 56, 0, 0, 0, 1];

fn message(cookie: Cookie, payload_len: usize) -> Vec<u8> {
    let mut bytes = HEADER.to_vec();
    bytes.extend_from_slice(&cookie.as_u64().to_be_bytes());
    bytes.resize(bytes.len() + payload_len, 0xab);
    bytes
}

fn dispatcher() -> CookieDispatcher {
    CookieDispatcher::with_config(
        OffsetCookieReader::after_openflow_header(),
        &DispatchConfig::default().with_seed(42),
    )
}

/// Serve a reply to a persistent entry while the table holds `size` entries
fn bench_serve_hit(c: &mut Criterion) {
    let mut group = c.benchmark_group("serve_hit");

    for size in [1, 1_000, 100_000].iter() {
        group.bench_with_input(BenchmarkId::new("table_size", size), size, |b, &size| {
            let d = dispatcher();
            for _ in 1..size {
                let mut jar = CookieCell::default();
                d.handle_func(&mut jar, |_rw, _req| {});
            }
            let mut jar = CookieCell::default();
            let cookie = d.handle_func(&mut jar, |_rw, _req| {});
            let bytes = message(cookie, 64);

            b.iter(|| {
                let mut rw = ResponseBuffer::new();
                let mut req = Request::new(bytes.clone());
                d.serve(&mut rw, black_box(&mut req));
            });
        });
    }

    group.finish();
}

/// Unknown cookies are the common case for stray replies
fn bench_serve_miss(c: &mut Criterion) {
    let d = dispatcher();
    let bytes = message(Cookie::new(0x1234_5678), 64);

    c.bench_function("serve_miss", |b| {
        b.iter(|| {
            let mut rw = ResponseBuffer::new();
            let mut req = Request::new(bytes.clone());
            d.serve(&mut rw, black_box(&mut req));
        });
    });
}

/// Register a one-shot entry and consume it with its reply
fn bench_one_shot_cycle(c: &mut Criterion) {
    let d = dispatcher();

    c.bench_function("one_shot_cycle", |b| {
        b.iter(|| {
            let mut jar = CookieCell::default();
            let cookie = d.handle_func_once(&mut jar, |_rw, _req| {});
            let mut rw = ResponseBuffer::new();
            let mut req = Request::new(message(cookie, 0));
            d.serve(&mut rw, &mut req);
        });
    });
}

/// Registration and serving from several threads against one table
fn bench_concurrent_register_serve(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_register_serve");
    group.sample_size(10);

    for num_threads in [2, 4, 8].iter() {
        group.bench_with_input(
            BenchmarkId::new("threads", num_threads),
            num_threads,
            |b, &num_threads| {
                b.iter(|| {
                    let d = Arc::new(dispatcher());
                    let handles: Vec<_> = (0..num_threads)
                        .map(|_| {
                            let d = Arc::clone(&d);
                            thread::spawn(move || {
                                for _ in 0..1_000 {
                                    let mut jar = CookieCell::default();
                                    let cookie = d.handle_func_once(&mut jar, |_rw, _req| {});
                                    let mut rw = ResponseBuffer::new();
                                    d.serve(&mut rw, &mut Request::new(message(cookie, 16)));
                                }
                            })
                        })
                        .collect();

                    for handle in handles {
                        let _ = handle.join();
                    }
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_serve_hit,
    bench_serve_miss,
    bench_one_shot_cycle,
    bench_concurrent_register_serve
);
criterion_main!(benches);
