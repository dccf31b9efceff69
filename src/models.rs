// ==============================================================================
// models.rs - LD Data Models
// ==============================================================================
// Description: Association records, field layout and build settings
// Author: Matt Barham
// Created: 2026-10-14
// Modified: 2026-10-14
// Version: 1.0.0
// ==============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One pairwise LD association parsed from a source line
#[derive(Debug, Clone, PartialEq)]
pub struct AssociationRecord {
    /// Key marker (e.g., "rs1")
    pub index_marker: String,
    /// Marker in LD with the index marker
    pub ld_marker: String,
    /// Minor allele frequency of the index marker
    pub index_maf: f64,
    /// LD strength (r²)
    pub r_squared: f64,
}

/// Column positions of an LD source file (0-based)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldLayout {
    pub index_marker_column: usize,
    pub index_maf_column: usize,
    pub ld_marker_column: usize,
    pub r_squared_column: usize,
    /// Single-byte column separator
    pub delimiter: u8,
    /// Collapse runs of the delimiter (whitespace-aligned files)
    pub merge_delimiters: bool,
}

impl Default for FieldLayout {
    fn default() -> Self {
        Self {
            index_marker_column: 2,
            index_maf_column: 3,
            ld_marker_column: 6,
            r_squared_column: 7,
            delimiter: b' ',
            merge_delimiters: false,
        }
    }
}

impl FieldLayout {
    /// Highest column index that must be present on a line
    pub fn last_column(&self) -> usize {
        self.index_marker_column
            .max(self.index_maf_column)
            .max(self.ld_marker_column)
            .max(self.r_squared_column)
    }
}

/// r² acceptance window `[min_r_squared, 1)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RSquaredWindow {
    pub min_r_squared: f64,
}

impl Default for RSquaredWindow {
    fn default() -> Self {
        Self { min_r_squared: 0.0 }
    }
}

impl RSquaredWindow {
    pub fn new(min_r_squared: f64) -> Self {
        Self { min_r_squared }
    }

    /// NaN fails both comparisons and is never accepted
    pub fn accepts(&self, r_squared: f64) -> bool {
        self.min_r_squared <= r_squared && r_squared < 1.0
    }
}

/// Settings for a `create` run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildOptions {
    pub window: RSquaredWindow,
    /// Approximate number of groups by surrogate count
    pub surrogate_bins: usize,
    /// Approximate number of groups by MAF
    pub maf_bins: usize,
    /// Log progress every N source lines (0 disables)
    pub progress_every: u64,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            window: RSquaredWindow::default(),
            surrogate_bins: 15,
            maf_bins: 15,
            progress_every: 1_000_000,
        }
    }
}

/// Per-marker summary stored alongside the associations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerProfile {
    pub index_marker: String,
    pub surrogate_count: u64,
    pub maf: f64,
}

/// Line counts from one build pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStats {
    pub lines_read: u64,
    pub valid: u64,
    pub excluded: u64,
    pub malformed: u64,
    pub index_markers: u64,
}

/// Everything recorded about a dataset at build time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub name: String,
    pub format_version: String,
    pub tool_version: String,
    pub created_at: DateTime<Utc>,
    pub source_path: String,
    /// SHA-256 of the source bytes as stored on disk
    pub source_sha256: String,
    pub layout: FieldLayout,
    pub options: BuildOptions,
    pub stats: BuildStats,
    pub surrogate_cutpoints: Vec<u64>,
    pub maf_cutpoints: Vec<f64>,
}
