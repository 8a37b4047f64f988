// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vfxgraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Opens graph assets as synced editing sessions.

use std::sync::Arc;

use tracing::{debug, info};

use crate::model::{AssetPath, AssetPathError, GraphModel, GraphResource, GraphSession};
use crate::store::{AssetStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("{path:?} does not name a graph asset: {source}")]
    NotAGraphAsset {
        path: String,
        source: AssetPathError,
    },
    #[error("graph asset {path} not found")]
    ResourceNotFound { path: AssetPath },
    #[error("invalid graph asset path: {0}")]
    InvalidPath(AssetPathError),
    #[error("graph asset {path} already exists")]
    AlreadyExists { path: AssetPath },
    #[error("graph asset {path} cannot be edited: {reason}")]
    SessionUnavailable { path: AssetPath, reason: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct ResourceAccessor {
    store: Arc<dyn AssetStore>,
}

impl ResourceAccessor {
    pub fn new(store: Arc<dyn AssetStore>) -> Self {
        Self { store }
    }

    /// Loads `path` and returns the resource with a light-applied, fully synced session.
    ///
    /// A store miss triggers one refresh and one retry before the asset is reported
    /// missing.
    pub fn load(&self, path: &str) -> Result<(GraphResource, GraphSession), AccessError> {
        let asset = AssetPath::parse(path).map_err(|source| AccessError::NotAGraphAsset {
            path: path.trim().to_owned(),
            source,
        })?;

        let resource = match self.store.load(&asset) {
            Ok(resource) => resource,
            Err(err) if err.is_not_found() => {
                debug!(path = %asset, "graph asset missing, refreshing store");
                self.store.refresh()?;
                self.store
                    .load(&asset)
                    .map_err(|err| self.classify(&asset, err))?
            }
            Err(err) => return Err(self.classify(&asset, err)),
        };

        let mut session =
            GraphSession::open(&resource).map_err(|err| AccessError::SessionUnavailable {
                path: asset.clone(),
                reason: err.to_string(),
            })?;
        session
            .light_apply()
            .map_err(|err| AccessError::SessionUnavailable {
                path: asset.clone(),
                reason: err.to_string(),
            })?;
        session.sync_from_model();

        info!(
            path = %asset,
            nodes = session.nodes().len(),
            links = session.edges().len(),
            "opened graph session"
        );
        Ok((resource, session))
    }

    /// Creates and persists an empty graph asset.
    pub fn create(&self, path: &str) -> Result<GraphResource, AccessError> {
        let asset = AssetPath::parse(path).map_err(AccessError::InvalidPath)?;
        if self.store.exists(&asset) {
            return Err(AccessError::AlreadyExists { path: asset });
        }
        let resource = GraphResource::new(asset, GraphModel::default());
        self.store.save(&resource)?;
        info!(path = %resource.path(), "created graph asset");
        Ok(resource)
    }

    fn classify(&self, asset: &AssetPath, err: StoreError) -> AccessError {
        match err {
            StoreError::NotFound { path } => AccessError::ResourceNotFound { path },
            StoreError::Json { source, .. } => AccessError::SessionUnavailable {
                path: asset.clone(),
                reason: source.to_string(),
            },
            other => AccessError::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;
    use crate::store::MemoryStore;

    struct Ctx {
        store: Arc<MemoryStore>,
        accessor: ResourceAccessor,
    }

    #[fixture]
    fn ctx() -> Ctx {
        let store = Arc::new(MemoryStore::new());
        let accessor = ResourceAccessor::new(store.clone());
        Ctx { store, accessor }
    }

    fn asset(raw: &str) -> AssetPath {
        AssetPath::parse(raw).expect("asset path")
    }

    #[rstest]
    fn load_returns_a_synced_session(ctx: Ctx) {
        ctx.accessor.create("Fx/Smoke.vfx").expect("create");
        let (resource, session) = ctx.accessor.load("Fx/Smoke.vfx").expect("load");
        assert_eq!(resource.path().as_str(), "Fx/Smoke.vfx");
        assert!(session.is_synced());
        assert_eq!(session.pending_writes(), 0);
        assert_eq!(ctx.store.refresh_count(), 0);
    }

    #[rstest]
    fn load_refreshes_once_before_giving_up(ctx: Ctx) {
        ctx.store.stage(asset("Late.vfx"), GraphModel::default());
        ctx.accessor.load("Late.vfx").expect("visible after refresh");
        assert_eq!(ctx.store.refresh_count(), 1);

        let err = ctx.accessor.load("Missing.vfx").expect_err("missing");
        assert!(matches!(err, AccessError::ResourceNotFound { .. }));
        assert_eq!(ctx.store.refresh_count(), 2);
    }

    #[rstest]
    fn load_rejects_non_graph_paths(ctx: Ctx) {
        let err = ctx.accessor.load("Materials/Smoke.mat").expect_err("wrong kind");
        assert!(matches!(err, AccessError::NotAGraphAsset { .. }));
        assert_eq!(ctx.store.refresh_count(), 0);
    }

    #[rstest]
    fn incompatible_models_make_the_session_unavailable(ctx: Ctx) {
        let mut model = GraphModel::default();
        model.format_version = 7;
        ctx.store.insert(asset("Old.vfx"), model);
        let err = ctx.accessor.load("Old.vfx").expect_err("unsupported");
        assert!(matches!(err, AccessError::SessionUnavailable { .. }), "{err}");
    }

    #[rstest]
    fn create_refuses_existing_assets(ctx: Ctx) {
        ctx.accessor.create("A.vfx").expect("first");
        assert!(matches!(
            ctx.accessor.create("A.vfx"),
            Err(AccessError::AlreadyExists { .. })
        ));
        assert!(matches!(
            ctx.accessor.create("A.txt"),
            Err(AccessError::InvalidPath(_))
        ));
        assert_eq!(ctx.store.write_count(), 1);
    }
}
