// ==============================================================================
// store.rs - Dataset Store
// ==============================================================================
// Description: Dataset naming, on-disk location and atomic publication
// Author: Matt Barham
// Created: 2026-10-14
// Modified: 2026-10-14
// Version: 1.0.0
// ==============================================================================
// Layout (inside the data directory):
//   <name>.ldlookup                    published, immutable dataset
//   .<name>.<uuid>.ldlookup-partial    build in progress (never opened by queries)
// ==============================================================================

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{LdLookupError, Result};

pub const DATASET_EXTENSION: &str = "ldlookup";
const STAGING_EXTENSION: &str = "ldlookup-partial";
const MAX_NAME_LENGTH: usize = 128;

/// Directory holding named datasets
#[derive(Debug, Clone)]
pub struct DatasetStore {
    root: PathBuf,
}

impl DatasetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Dataset names become file names, so they are restricted to a safe set
    pub fn validate_name(name: &str) -> Result<()> {
        let invalid = |reason: &str| LdLookupError::InvalidDatasetName {
            name: name.to_string(),
            reason: reason.to_string(),
        };

        if name.is_empty() || name.len() > MAX_NAME_LENGTH {
            return Err(invalid("name must be 1-128 characters"));
        }
        if name.starts_with('.') {
            return Err(invalid("name must not start with '.'"));
        }
        let valid = name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.');
        if !valid {
            return Err(invalid("name can only contain a-z, A-Z, 0-9, _, -, ."));
        }
        Ok(())
    }

    /// Path a published dataset lives at
    pub fn dataset_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.{}", name, DATASET_EXTENSION))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.dataset_path(name).is_file()
    }

    /// Resolve an existing dataset for reading
    pub fn locate(&self, name: &str) -> Result<PathBuf> {
        Self::validate_name(name)?;
        let path = self.dataset_path(name);
        if !path.is_file() {
            return Err(LdLookupError::UnknownDataset(name.to_string()));
        }
        Ok(path)
    }

    /// Reserve a staging file for a new dataset
    ///
    /// Fails early if the name is taken; the final check happens in
    /// [`StagedDataset::publish`].
    pub fn stage(&self, name: &str) -> Result<StagedDataset> {
        Self::validate_name(name)?;
        if self.dataset_path(name).exists() {
            return Err(LdLookupError::DatasetExists(name.to_string()));
        }
        if !self.root.is_dir() {
            std::fs::create_dir_all(&self.root)?;
        }

        let staging_path = self.root.join(format!(
            ".{}.{}.{}",
            name,
            Uuid::new_v4().simple(),
            STAGING_EXTENSION
        ));
        debug!("Staging dataset '{}' at {:?}", name, staging_path);

        Ok(StagedDataset {
            name: name.to_string(),
            staging_path,
            target_path: self.dataset_path(name),
            published: false,
        })
    }
}

/// A dataset under construction
///
/// Dropping it without calling [`publish`](Self::publish) deletes the
/// staging file, so failed builds leave nothing behind.
#[derive(Debug)]
pub struct StagedDataset {
    name: String,
    staging_path: PathBuf,
    target_path: PathBuf,
    published: bool,
}

impl StagedDataset {
    pub fn staging_path(&self) -> &Path {
        &self.staging_path
    }

    /// Make the staged file visible under its dataset name
    ///
    /// A hard link never replaces an existing file, so a concurrent build
    /// that published first wins and this one fails with `DatasetExists`.
    pub fn publish(mut self) -> Result<PathBuf> {
        match std::fs::hard_link(&self.staging_path, &self.target_path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(LdLookupError::DatasetExists(self.name.clone()));
            }
            Err(e) => {
                // Filesystems without hard links
                warn!("Hard link publish failed ({}), falling back to rename", e);
                if self.target_path.exists() {
                    return Err(LdLookupError::DatasetExists(self.name.clone()));
                }
                std::fs::rename(&self.staging_path, &self.target_path)?;
            }
        }

        self.published = true;
        if let Err(e) = std::fs::remove_file(&self.staging_path) {
            if e.kind() != ErrorKind::NotFound {
                warn!("Failed to remove staging file {:?}: {}", self.staging_path, e);
            }
        }

        info!("Published dataset '{}' at {:?}", self.name, self.target_path);
        Ok(self.target_path.clone())
    }

    fn cleanup(&self) {
        for suffix in ["", "-journal", "-wal", "-shm"] {
            let mut path = self.staging_path.clone().into_os_string();
            path.push(suffix);
            match std::fs::remove_file(&path) {
                Ok(()) => debug!("Removed staging artifact {:?}", path),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove staging artifact {:?}: {}", path, e),
            }
        }
    }
}

impl Drop for StagedDataset {
    fn drop(&mut self) {
        if !self.published {
            self.cleanup();
        }
    }
}
