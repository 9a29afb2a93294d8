// src/fs.rs
// =============================================================================
// Directory creation for the mirror's target tree.
//
// Kept behind a trait so a dry run can be shown to never touch the disk.
// =============================================================================

use std::path::Path;

use crate::error::MirrorError;

pub trait DirCreator: Send + Sync {
    /// Creates `path` and any missing parents. Succeeds if it already exists.
    fn ensure_dir(&self, path: &Path) -> Result<(), MirrorError>;
}

/// Creates directories on the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalDirs;

impl DirCreator for LocalDirs {
    fn ensure_dir(&self, path: &Path) -> Result<(), MirrorError> {
        std::fs::create_dir_all(path).map_err(|source| MirrorError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
