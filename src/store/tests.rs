// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vfxgraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;
use std::fs;

use rstest::{fixture, rstest};
use tempfile::TempDir;

use super::*;
use crate::model::{GraphModel, NodeClass, NodeTemplate, Vec2};

struct FolderCtx {
    tmp: TempDir,
    store: AssetFolder,
}

#[fixture]
fn ctx() -> FolderCtx {
    let tmp = tempfile::tempdir().expect("tempdir");
    let store = AssetFolder::new(tmp.path().join("assets"));
    FolderCtx { tmp, store }
}

fn path(raw: &str) -> AssetPath {
    AssetPath::parse(raw).expect("asset path")
}

fn model_with_one_node() -> GraphModel {
    let mut model = GraphModel::default();
    model
        .insert_node(
            NodeTemplate {
                kind: "operator.add".to_owned(),
                type_name: "Vfx.Model.VfxOperator".to_owned(),
                class: NodeClass::Operator,
                name: "Add".to_owned(),
                enabled: true,
                settings: BTreeMap::new(),
                inputs: Vec::new(),
                outputs: Vec::new(),
            },
            Vec2::new(3.0, 4.0),
            None,
        )
        .expect("node");
    model
}

#[rstest]
fn folder_round_trips_nested_assets(ctx: FolderCtx) {
    let asset = path("Effects/Smoke/Smoke.vfx");
    assert!(!ctx.store.exists(&asset));
    assert!(ctx.store.load(&asset).expect_err("missing").is_not_found());

    let resource = GraphResource::new(asset.clone(), model_with_one_node());
    ctx.store.save(&resource).expect("save");
    assert!(ctx.store.exists(&asset));

    let loaded = ctx.store.load(&asset).expect("load");
    assert_eq!(loaded.model(), resource.model());
    assert!(!loaded.is_modified());

    let raw = fs::read_to_string(ctx.store.file_path(&asset)).expect("raw");
    assert!(raw.ends_with('\n'));
    assert!(raw.contains("\"format_version\": 1"));
}

#[rstest]
fn folder_save_leaves_no_temp_files(ctx: FolderCtx) {
    let asset = path("Spark.vfx");
    let store = ctx.store.clone().with_durability(WriteDurability::Durable);
    assert_eq!(store.durability(), WriteDurability::Durable);

    for _ in 0..3 {
        store
            .save(&GraphResource::new(asset.clone(), GraphModel::default()))
            .expect("save");
    }
    let names = fs::read_dir(store.root())
        .expect("read dir")
        .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["Spark.vfx".to_owned()]);
}

#[rstest]
fn folder_reports_corrupt_json(ctx: FolderCtx) {
    let asset = path("Broken.vfx");
    fs::create_dir_all(ctx.store.root()).expect("root");
    fs::write(ctx.store.file_path(&asset), "{ not json").expect("write");
    assert!(matches!(ctx.store.load(&asset), Err(StoreError::Json { .. })));
}

#[cfg(unix)]
#[rstest]
fn folder_refuses_to_write_through_symlinks(ctx: FolderCtx) {
    let outside = ctx.tmp.path().join("outside");
    fs::create_dir_all(&outside).expect("outside");
    fs::create_dir_all(ctx.store.root()).expect("root");
    std::os::unix::fs::symlink(&outside, ctx.store.root().join("Linked")).expect("symlink");

    let err = ctx
        .store
        .save(&GraphResource::new(path("Linked/Fx.vfx"), GraphModel::default()))
        .expect_err("symlink refused");
    assert!(matches!(err, StoreError::SymlinkRefused { .. }), "{err}");
    assert!(!outside.join("Fx.vfx").exists());
}

#[rstest]
fn folder_refresh_tolerates_missing_root(ctx: FolderCtx) {
    ctx.store.refresh().expect("missing root is fine");
    fs::create_dir_all(ctx.store.root()).expect("root");
    ctx.store.refresh().expect("directory root");
}

#[test]
fn memory_store_counts_writes_and_publishes_staged_assets() {
    let store = MemoryStore::new();
    let asset = path("Staged.vfx");
    store.stage(asset.clone(), GraphModel::default());
    assert!(store.load(&asset).expect_err("not yet visible").is_not_found());

    store.refresh().expect("refresh");
    assert_eq!(store.refresh_count(), 1);
    let resource = store.load(&asset).expect("visible after refresh");

    store.save(&resource).expect("save");
    store.save(&resource).expect("save");
    assert_eq!(store.write_count(), 2);
}
