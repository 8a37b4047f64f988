// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vfxgraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Asset storage boundary.
//!
//! The adapter only ever talks to storage through [`AssetStore`]. [`AssetFolder`] keeps
//! graphs as JSON files under a root directory; [`MemoryStore`] keeps them in memory.

use std::fmt;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::model::{AssetPath, GraphResource};

mod folder;
mod memory;

pub use folder::AssetFolder;
pub use memory::MemoryStore;

pub trait AssetStore: Send + Sync {
    /// Loads the asset at `path`, or [`StoreError::NotFound`].
    fn load(&self, path: &AssetPath) -> Result<GraphResource, StoreError>;

    fn save(&self, resource: &GraphResource) -> Result<(), StoreError>;

    /// Re-scans the backing storage so assets written behind the store's back become
    /// visible.
    fn refresh(&self) -> Result<(), StoreError>;

    fn exists(&self, path: &AssetPath) -> bool;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteDurability {
    /// Writes a temp file and renames it into place without fsync.
    #[default]
    BestEffort,

    /// Also syncs the written file and its directory to stable storage where the
    /// platform allows it.
    Durable,
}

#[derive(Debug)]
pub enum StoreError {
    NotFound { path: AssetPath },
    Io { path: PathBuf, source: io::Error },
    Json { path: PathBuf, source: serde_json::Error },
    PathOutsideRoot { root: PathBuf, path: PathBuf },
    SymlinkRefused { path: PathBuf },
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { path } => write!(f, "graph asset {path} not found"),
            Self::Io { path, source } => write!(f, "io error at {path:?}: {source}"),
            Self::Json { path, source } => write!(f, "json error at {path:?}: {source}"),
            Self::PathOutsideRoot { root, path } => {
                write!(f, "path {path:?} is outside the asset root {root:?}")
            }
            Self::SymlinkRefused { path } => {
                write!(f, "refusing to write through symlink at {path:?}")
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests;
