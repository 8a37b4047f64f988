// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vfxgraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::path::{Component, Path};

use super::graph::GraphModel;

pub const GRAPH_ASSET_EXTENSION: &str = "vfx";

/// A store-relative path to a graph asset (`Assets/Effects/Smoke.vfx`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetPath(String);

impl AssetPath {
    pub fn parse(raw: &str) -> Result<Self, AssetPathError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AssetPathError::Empty);
        }

        let normalized = trimmed.replace('\\', "/");
        let path = Path::new(&normalized);
        let has_extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(GRAPH_ASSET_EXTENSION));
        if !has_extension {
            return Err(AssetPathError::NotAGraphAsset(normalized));
        }

        for component in path.components() {
            match component {
                Component::Prefix(_) | Component::RootDir | Component::ParentDir => {
                    return Err(AssetPathError::NotRelative(normalized));
                }
                Component::CurDir | Component::Normal(_) => {}
            }
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }

    /// File name without the extension, used as the default graph title.
    pub fn stem(&self) -> &str {
        self.as_path()
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(&self.0)
    }
}

impl fmt::Display for AssetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetPathError {
    Empty,
    NotAGraphAsset(String),
    NotRelative(String),
}

impl fmt::Display for AssetPathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("asset path must not be empty"),
            Self::NotAGraphAsset(path) => {
                write!(f, "{path:?} is not a .{GRAPH_ASSET_EXTENSION} graph asset")
            }
            Self::NotRelative(path) => {
                write!(f, "{path:?} must be relative to the asset root")
            }
        }
    }
}

impl std::error::Error for AssetPathError {}

/// A loaded graph asset, owned by one request.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphResource {
    path: AssetPath,
    model: GraphModel,
    modified: bool,
}

impl GraphResource {
    pub fn new(path: AssetPath, model: GraphModel) -> Self {
        Self {
            path,
            model,
            modified: false,
        }
    }

    pub fn path(&self) -> &AssetPath {
        &self.path
    }

    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Replaces the persisted model with the session's state and flags the resource dirty.
    pub fn apply_model(&mut self, model: GraphModel) {
        self.model = model;
        self.modified = true;
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{AssetPath, AssetPathError};

    #[rstest]
    #[case("Assets/Smoke.vfx", "Assets/Smoke.vfx")]
    #[case("  Assets\\Fx\\Fire.VFX ", "Assets/Fx/Fire.VFX")]
    #[case("./Spark.vfx", "./Spark.vfx")]
    fn parse_accepts_relative_graph_paths(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(AssetPath::parse(raw).expect("path").as_str(), expected);
    }

    #[test]
    fn parse_rejects_other_kinds_and_escapes() {
        assert_eq!(AssetPath::parse(" "), Err(AssetPathError::Empty));
        assert!(matches!(
            AssetPath::parse("Assets/Smoke.shadergraph"),
            Err(AssetPathError::NotAGraphAsset(_))
        ));
        assert!(matches!(
            AssetPath::parse("../Smoke.vfx"),
            Err(AssetPathError::NotRelative(_))
        ));
        assert!(matches!(
            AssetPath::parse("/tmp/Smoke.vfx"),
            Err(AssetPathError::NotRelative(_))
        ));
    }

    #[test]
    fn stem_drops_extension() {
        assert_eq!(AssetPath::parse("Assets/Smoke.vfx").expect("path").stem(), "Smoke");
    }
}
