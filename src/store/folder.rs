// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vfxgraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::model::{AssetPath, GraphModel, GraphResource};

use super::{AssetStore, StoreError, WriteDurability};

/// Graph assets stored as pretty-printed JSON under a root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetFolder {
    root: PathBuf,
    durability: WriteDurability,
}

impl AssetFolder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            durability: WriteDurability::default(),
        }
    }

    pub fn with_durability(mut self, durability: WriteDurability) -> Self {
        self.durability = durability;
        self
    }

    pub fn durability(&self) -> WriteDurability {
        self.durability
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn file_path(&self, path: &AssetPath) -> PathBuf {
        self.root.join(path.as_path())
    }
}

impl AssetStore for AssetFolder {
    fn load(&self, path: &AssetPath) -> Result<GraphResource, StoreError> {
        let file = self.file_path(path);
        let raw = match fs::read_to_string(&file) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound { path: path.clone() })
            }
            Err(source) => return Err(StoreError::Io { path: file, source }),
        };
        let model: GraphModel =
            serde_json::from_str(&raw).map_err(|source| StoreError::Json {
                path: file.clone(),
                source,
            })?;
        Ok(GraphResource::new(path.clone(), model))
    }

    fn save(&self, resource: &GraphResource) -> Result<(), StoreError> {
        let file = self.file_path(resource.path());
        let mut contents =
            serde_json::to_vec_pretty(resource.model()).map_err(|source| StoreError::Json {
                path: file.clone(),
                source,
            })?;
        contents.push(b'\n');
        write_atomic(&self.root, &file, &contents, self.durability)?;
        debug!(path = %resource.path(), bytes = contents.len(), "wrote graph asset");
        Ok(())
    }

    fn refresh(&self) -> Result<(), StoreError> {
        // Reads always go to disk; refreshing only re-checks the root.
        match fs::metadata(&self.root) {
            Ok(md) if md.is_dir() => Ok(()),
            Ok(_) => Err(io_at(&self.root)(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "expected directory",
            ))),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(io_at(&self.root)(source)),
        }
    }

    fn exists(&self, path: &AssetPath) -> bool {
        fs::symlink_metadata(self.file_path(path)).is_ok_and(|md| md.is_file())
    }
}

fn io_at(path: &Path) -> impl FnOnce(io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// `path` relative to `root`, refusing anything that escapes it.
fn relative_to_root<'a>(root: &Path, path: &'a Path) -> Result<&'a Path, StoreError> {
    let outside = || StoreError::PathOutsideRoot {
        root: root.to_path_buf(),
        path: path.to_path_buf(),
    };
    let relative = path.strip_prefix(root).map_err(|_| outside())?;
    let escapes = relative.components().any(|component| {
        matches!(
            component,
            Component::Prefix(_) | Component::RootDir | Component::ParentDir
        )
    });
    if escapes || relative.as_os_str().is_empty() {
        return Err(outside());
    }
    Ok(relative)
}

/// Fails if `path` exists as a symlink. Returns whether anything exists at `path`.
fn refuse_symlink(path: &Path) -> Result<Option<fs::Metadata>, StoreError> {
    match fs::symlink_metadata(path) {
        Ok(md) if md.file_type().is_symlink() => Err(StoreError::SymlinkRefused {
            path: path.to_path_buf(),
        }),
        Ok(md) => Ok(Some(md)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(io_at(path)(source)),
    }
}

/// Creates each directory below `root` one component at a time, never following links.
fn create_parent_dirs(root: &Path, relative_dir: &Path) -> Result<(), StoreError> {
    let mut dir = root.to_path_buf();
    for part in relative_dir.components().filter_map(|component| match component {
        Component::Normal(part) => Some(part),
        _ => None,
    }) {
        dir.push(part);
        match refuse_symlink(&dir)? {
            Some(md) if md.is_dir() => {}
            Some(_) => {
                return Err(io_at(&dir)(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    "expected directory",
                )))
            }
            None => fs::create_dir(&dir).map_err(io_at(&dir))?,
        }
    }
    Ok(())
}

#[cfg(windows)]
fn replace_file(from: &Path, to: &Path) -> io::Result<()> {
    fs::rename(from, to).or_else(|err| match err.kind() {
        io::ErrorKind::AlreadyExists | io::ErrorKind::PermissionDenied => {
            let _ = fs::remove_file(to);
            fs::rename(from, to)
        }
        _ => Err(err),
    })
}

#[cfg(not(windows))]
fn replace_file(from: &Path, to: &Path) -> io::Result<()> {
    fs::rename(from, to)
}

/// Writes `contents` to a temp file next to `path` and renames it into place.
fn write_atomic(
    root: &Path,
    path: &Path,
    contents: &[u8],
    durability: WriteDurability,
) -> Result<(), StoreError> {
    fs::create_dir_all(root).map_err(io_at(root))?;
    let relative = relative_to_root(root, path)?;
    create_parent_dirs(root, relative.parent().unwrap_or_else(|| Path::new("")))?;
    refuse_symlink(path)?;

    let (Some(dir), Some(name)) = (path.parent(), path.file_name()) else {
        return Err(io_at(path)(io::Error::other("path has no parent or file name")));
    };
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let tmp = dir.join(format!(".vfxgraph.tmp.{}.{stamp}", name.to_string_lossy()));

    let written = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&tmp)
        .and_then(|mut file| {
            file.write_all(contents)?;
            if durability == WriteDurability::Durable {
                file.sync_all()?;
            }
            Ok(())
        })
        .map_err(io_at(&tmp))
        .and_then(|()| replace_file(&tmp, path).map_err(io_at(path)));
    if let Err(err) = written {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }

    if durability == WriteDurability::Durable {
        #[cfg(unix)]
        {
            fs::File::open(dir)
                .and_then(|handle| handle.sync_all())
                .map_err(io_at(dir))?;
        }
    }

    Ok(())
}
