// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vfxgraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::model::Vec2;
use crate::store::{AssetFolder, WriteDurability};

/// Runtime settings shared by every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Directory graph asset paths are resolved against.
    pub root: PathBuf,
    pub durability: WriteDurability,
    /// Offset applied when a node is duplicated without an explicit position.
    pub duplicate_offset: Vec2,
    /// New root nodes closer than this to an existing one are nudged along x.
    pub overlap_tolerance: f32,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            durability: WriteDurability::BestEffort,
            duplicate_offset: Vec2::new(50.0, 50.0),
            overlap_tolerance: 5.0,
        }
    }
}

impl AdapterConfig {
    pub fn folder_store(&self) -> AssetFolder {
        AssetFolder::new(self.root.clone()).with_durability(self.durability)
    }
}
