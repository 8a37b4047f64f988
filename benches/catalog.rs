// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vfxgraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use vfxgraph::catalog::VariantRegistry;
use vfxgraph::model::{AssetPath, GraphModel, GraphResource, GraphSession, Vec2};
use vfxgraph::ops::MutationController;
use vfxgraph::reflect::{builtin_modules, TypeResolver};
use vfxgraph::snapshot;
use vfxgraph::store::MemoryStore;

// Benchmark identity (keep stable):
// - Groups: `catalog.match`, `snapshot.export`.
// - Case IDs must remain stable across refactors so results stay comparable.

fn registry() -> Arc<VariantRegistry> {
    let registry = Arc::new(VariantRegistry::builtin(Arc::new(TypeResolver::new(
        builtin_modules(),
    ))));
    registry.validate_all().expect("catalog");
    registry
}

/// `nodes` operators alternating time/add, each add fed by the previous time node.
fn chain(registry: &Arc<VariantRegistry>, nodes: usize) -> GraphSession {
    let controller = MutationController::new(Arc::clone(registry), Arc::new(MemoryStore::new()));
    let resource = GraphResource::new(
        AssetPath::parse("Bench.vfx").expect("path"),
        GraphModel::default(),
    );
    let mut session = GraphSession::open(&resource).expect("session");
    session.sync_from_model();

    let time = registry.match_variant("operator.total_time").expect("time");
    let add = registry.match_variant("operator.add").expect("add");
    let mut previous = None;
    for idx in 0..nodes {
        let position = Vec2::new((idx % 20) as f32 * 150.0, (idx / 20) as f32 * 150.0);
        if idx % 2 == 0 {
            previous = Some(controller.add_node(&mut session, position, &time).expect("time"));
        } else {
            let target = controller.add_node(&mut session, position, &add).expect("add");
            let source = previous.take().expect("source");
            controller
                .connect(&mut session, source, "T", target, "A")
                .expect("connect");
        }
    }
    session
}

fn benches_catalog(c: &mut Criterion) {
    let registry = registry();
    let mut group = c.benchmark_group("catalog.match");
    for (case, input) in [
        ("identifier", "operator.multiply"),
        ("display_name", "Initialize Particle"),
        ("category_path", "block/Set Velocity"),
        ("ambiguous", "vector2"),
        ("not_found", "multiplyy"),
    ] {
        group.bench_function(case, |b| {
            b.iter(|| black_box(registry.match_variant(black_box(input)).is_ok()))
        });
    }
    group.finish();
}

fn benches_export(c: &mut Criterion) {
    let registry = registry();
    let mut group = c.benchmark_group("snapshot.export");
    for (case, nodes) in [("small", 10), ("medium", 200)] {
        let session = chain(&registry, nodes);
        group.throughput(Throughput::Elements(nodes as u64));
        group.bench_function(case, |b| {
            b.iter(|| black_box(snapshot::export(black_box(&session)).connections.len()))
        });
    }
    group.finish();
}

criterion_group!(benches, benches_catalog, benches_export);
criterion_main!(benches);
