// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vfxgraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::model::{AssetPath, GraphModel, GraphResource};

use super::{AssetStore, StoreError};

/// In-memory store that counts writes and refreshes.
///
/// Assets added with [`MemoryStore::stage`] stay invisible until the next refresh, like
/// files an import pipeline has not picked up yet.
#[derive(Debug, Default)]
pub struct MemoryStore {
    assets: Mutex<BTreeMap<AssetPath, GraphModel>>,
    staged: Mutex<BTreeMap<AssetPath, GraphModel>>,
    writes: AtomicUsize,
    refreshes: AtomicUsize,
}

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: AssetPath, model: GraphModel) {
        locked(&self.assets).insert(path, model);
    }

    pub fn stage(&self, path: AssetPath, model: GraphModel) {
        locked(&self.staged).insert(path, model);
    }

    pub fn model(&self, path: &AssetPath) -> Option<GraphModel> {
        locked(&self.assets).get(path).cloned()
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::Relaxed)
    }
}

impl AssetStore for MemoryStore {
    fn load(&self, path: &AssetPath) -> Result<GraphResource, StoreError> {
        locked(&self.assets)
            .get(path)
            .cloned()
            .map(|model| GraphResource::new(path.clone(), model))
            .ok_or_else(|| StoreError::NotFound { path: path.clone() })
    }

    fn save(&self, resource: &GraphResource) -> Result<(), StoreError> {
        locked(&self.assets).insert(resource.path().clone(), resource.model().clone());
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn refresh(&self) -> Result<(), StoreError> {
        let staged = std::mem::take(&mut *locked(&self.staged));
        locked(&self.assets).extend(staged);
        self.refreshes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn exists(&self, path: &AssetPath) -> bool {
        locked(&self.assets).contains_key(path)
    }
}
