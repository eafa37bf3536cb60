//! Router benchmarks: forward matching by outcome, table size scaling, and
//! reverse routing.
//!
//! Run with: `cargo bench -p fratily-router`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fratily_core::{Action, FaultResult, Params};
use fratily_router::{MethodSet, RouteCollector, RouteData, Router};
use http::Method;

/// A shop-like table: `n` resources, each with a list, an item and a
/// nested review route.
fn shop(n: usize) -> Router {
    let mut collector = RouteCollector::new();
    let mut add = |name: String, pattern: String, methods: MethodSet| {
        let action = Action::new(name.clone(), [], |_| async { FaultResult::Ok(()) });
        collector
            .add_route(Some(&name), &pattern, methods, action, RouteData::new())
            .expect("benchmark routes are valid");
    };

    for i in 0..n {
        add(format!("r{i}.list"), format!("/shop/r{i}"), MethodSet::GET);
        add(
            format!("r{i}.item"),
            format!("/shop/r{i}/{{id}}"),
            MethodSet::GET.union(MethodSet::PUT),
        );
        add(
            format!("r{i}.review"),
            format!("/shop/r{i}/{{id}}/reviews/{{review}}"),
            MethodSet::GET,
        );
    }
    collector.build()
}

fn bench_outcomes(c: &mut Criterion) {
    let router = shop(100);
    let mut group = c.benchmark_group("match");

    let cases = [
        ("static", Method::GET, "/shop/r50"),
        ("param", Method::GET, "/shop/r50/991"),
        ("nested", Method::GET, "/shop/r50/991/reviews/3"),
        ("not_found", Method::GET, "/warehouse/r50"),
        ("method_not_allowed", Method::DELETE, "/shop/r50/991"),
    ];
    for (label, method, path) in cases {
        group.bench_function(label, |b| {
            b.iter(|| black_box(router.match_route(&method, black_box(path))));
        });
    }
    group.finish();
}

fn bench_table_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("table_size");

    for n in [10, 100, 1000] {
        let router = shop(n);
        let path = format!("/shop/r{}/42", n / 2);
        group.bench_with_input(BenchmarkId::from_parameter(n), &path, |b, path| {
            b.iter(|| black_box(router.match_route(&Method::GET, path)));
        });
    }
    group.finish();
}

fn bench_path_for(c: &mut Criterion) {
    let router = shop(100);
    let mut params = Params::new();
    params.push("id", "991");
    params.push("review", "3");

    c.bench_function("path_for", |b| {
        b.iter(|| black_box(router.path_for("r50.review", &params)));
    });
}

criterion_group!(benches, bench_outcomes, bench_table_size, bench_path_for);
criterion_main!(benches);
