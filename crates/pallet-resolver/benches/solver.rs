//! Resolution benchmarks over a synthetic layered catalog.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use pallet_core::PackageSpecifier;
use pallet_repository::{Installation, MemoryRepository, Repository};
use pallet_resolver::{DependencyAnalyzer, DependencyResolver, TreeSolver};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Layered catalog: each package in layer n depends on two packages in
/// layer n+1, three versions per package.
fn build_catalog(layers: usize, width: usize) -> MemoryRepository {
    let repo = MemoryRepository::new("bench");
    for layer in 0..layers {
        for slot in 0..width {
            let name = format!("l{layer}p{slot}");
            let deps: Vec<(String, String)> = if layer + 1 < layers {
                [slot % width, (slot + 1) % width]
                    .iter()
                    .map(|next| (format!("l{}p{next}", layer + 1), "^1.0".to_string()))
                    .collect()
            } else {
                Vec::new()
            };
            for patch in 0..3 {
                let dep_refs: Vec<(&str, &str)> = deps
                    .iter()
                    .map(|(n, s)| (n.as_str(), s.as_str()))
                    .collect();
                repo.add_version(&name, &format!("1.{patch}.0"), &dep_refs);
            }
        }
    }
    repo
}

fn bench_resolution(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let repositories: Vec<Arc<dyn Repository>> = vec![Arc::new(build_catalog(4, 8))];
    let requests: Vec<PackageSpecifier> = (0..8)
        .map(|slot| PackageSpecifier::by_name(format!("l0p{slot}")))
        .collect();

    c.bench_function("incremental_resolve", |b| {
        b.iter(|| {
            runtime.block_on(DependencyResolver::resolve(
                &Installation::default(),
                black_box(&requests),
                &repositories,
                &CancellationToken::new(),
            ))
        });
    });

    let solver = TreeSolver::new(repositories.clone());
    c.bench_function("tree_solve", |b| {
        b.iter(|| {
            runtime.block_on(solver.solve(black_box(&requests), &CancellationToken::new()))
        });
    });
}

fn bench_analysis(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let repositories: Vec<Arc<dyn Repository>> = vec![Arc::new(build_catalog(4, 8))];
    let requests: Vec<PackageSpecifier> = (0..8)
        .map(|slot| PackageSpecifier::by_name(format!("l0p{slot}")))
        .collect();
    let resolver = runtime.block_on(DependencyResolver::resolve(
        &Installation::default(),
        &requests,
        &repositories,
        &CancellationToken::new(),
    ));
    let packages: Vec<_> = resolver.dependencies().into_iter().cloned().collect();

    c.bench_function("analyze_resolved_set", |b| {
        b.iter(|| DependencyAnalyzer::build(black_box(&packages)));
    });
}

criterion_group!(benches, bench_resolution, bench_analysis);
criterion_main!(benches);
