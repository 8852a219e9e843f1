//! Routing benchmarks.
//!
//! Run with: `cargo bench -p rampart-router`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use http::Method;
use rampart_core::{handler_fn, ApiSpec, HandlerSet, Operation, RequestContext, ResourceNode};
use rampart_router::{compile, ResolveError, Router};

fn build_router(num_resources: usize) -> Router {
    let mut orgs = ResourceNode::new("/org/{orgId}");
    let mut spec = ApiSpec::new();

    for i in 0..num_resources {
        spec = spec.with_resource(
            ResourceNode::new(format!("/resource{i}"))
                .with_operation(Operation::new("get"))
                .with_child(ResourceNode::new("/{id}").with_operation(Operation::new("get"))),
        );
        orgs = orgs.with_child(
            ResourceNode::new(format!("/resource{i}/{{id}}")).with_operation(Operation::new("get")),
        );
    }
    spec = spec.with_resource(orgs);

    let resolver = |_: &str| -> Result<HandlerSet, ResolveError> {
        Ok(HandlerSet::new().get(handler_fn(|_ctx: &mut RequestContext| {
            Box::pin(async { Ok(()) })
        })))
    };

    match compile(&spec, "/api/v1", &resolver) {
        Ok(records) => Router::new(records),
        Err(error) => panic!("benchmark spec failed to compile: {error}"),
    }
}

fn bench_static_match(c: &mut Criterion) {
    let router = build_router(33);

    c.bench_function("static_match", |b| {
        b.iter(|| black_box(router.match_route(&Method::GET, "/api/v1/resource16")));
    });
}

fn bench_param_match(c: &mut Criterion) {
    let router = build_router(33);

    c.bench_function("param_match", |b| {
        b.iter(|| black_box(router.match_route(&Method::GET, "/api/v1/resource25/12345")));
    });
}

fn bench_nested_param_match(c: &mut Criterion) {
    let router = build_router(33);

    c.bench_function("nested_param_match", |b| {
        b.iter(|| {
            black_box(router.match_route(&Method::GET, "/api/v1/org/acme-corp/resource10/12345"))
        });
    });
}

fn bench_miss(c: &mut Criterion) {
    let router = build_router(33);

    c.bench_function("miss", |b| {
        b.iter(|| black_box(router.match_route(&Method::GET, "/api/v1/nonexistent/path")));
    });
}

fn bench_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("scaling");

    for num_resources in [10, 50, 100, 500] {
        let router = build_router(num_resources);
        let path = format!("/api/v1/resource{}/12345", num_resources - 1);

        group.bench_with_input(BenchmarkId::new("last_param_match", num_resources), &path, |b, path| {
            b.iter(|| black_box(router.match_route(&Method::GET, path)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_static_match,
    bench_param_match,
    bench_nested_param_match,
    bench_miss,
    bench_scaling
);
criterion_main!(benches);
