// ==============================================================================
// schema.rs - Dataset File Schema
// ==============================================================================
// Description: SQLite tables, indexes and metadata keys of a dataset file
// Author: Matt Barham
// Created: 2026-10-14
// Modified: 2026-10-14
// Version: 1.0.0
// ==============================================================================

/// Bumped whenever the table layout changes
pub const FORMAT_VERSION: &str = "1";

/// Bulk-load settings; the file is private to one builder until published
pub const BUILD_PRAGMAS: &str = "PRAGMA page_size = 32768;
     PRAGMA journal_mode = OFF;
     PRAGMA synchronous = OFF;
     PRAGMA cache_size = -262144;
     PRAGMA locking_mode = EXCLUSIVE;
     PRAGMA temp_store = FILE;";

/// Restored before publishing so readers see an ordinary database
pub const FINAL_PRAGMAS: &str = "PRAGMA journal_mode = DELETE;
     PRAGMA synchronous = FULL;
     PRAGMA locking_mode = NORMAL;";

pub const CREATE_TABLES: &str = "CREATE TABLE associations (
        index_marker TEXT NOT NULL,
        ld_marker TEXT NOT NULL
     );
     CREATE TABLE markers (
        index_marker TEXT PRIMARY KEY,
        surrogate_count INTEGER NOT NULL,
        maf REAL NOT NULL
     ) WITHOUT ROWID;
     CREATE TABLE profile_bins (
        axis TEXT NOT NULL,
        lower_bound REAL NOT NULL,
        population INTEGER NOT NULL
     );
     CREATE TABLE metadata (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
     );";

/// Created after the load so inserts don't pay for B-tree maintenance
pub const CREATE_INDEXES: &str =
    "CREATE INDEX idx_associations_index_marker ON associations(index_marker);
     CREATE INDEX idx_markers_profile ON markers(surrogate_count, maf);";

pub const INSERT_ASSOCIATION: &str =
    "INSERT INTO associations (index_marker, ld_marker) VALUES (?1, ?2)";

/// First MAF seen for a marker wins; later rows only bump the count
pub const UPSERT_MARKER: &str = "INSERT INTO markers (index_marker, surrogate_count, maf)
     VALUES (?1, 1, ?2)
     ON CONFLICT(index_marker) DO UPDATE SET surrogate_count = surrogate_count + 1";

pub const SELECT_ASSOCIATIONS: &str =
    "SELECT ld_marker FROM associations WHERE index_marker = ?1 ORDER BY rowid";

pub const SELECT_PROFILE: &str =
    "SELECT index_marker, surrogate_count, maf FROM markers WHERE index_marker = ?1";

pub const SELECT_CELL: &str = "SELECT index_marker FROM markers
     WHERE surrogate_count >= ?1 AND (?2 IS NULL OR surrogate_count < ?2)
       AND maf >= ?3 AND (?4 IS NULL OR maf < ?4)
     ORDER BY index_marker";

pub const SURROGATE_HISTOGRAM: &str = "SELECT surrogate_count, COUNT(*) FROM markers
     GROUP BY surrogate_count ORDER BY surrogate_count";

pub const MAF_HISTOGRAM: &str =
    "SELECT maf, COUNT(*) FROM markers GROUP BY maf ORDER BY maf";

pub const AXIS_SURROGATES: &str = "surrogates";
pub const AXIS_MAF: &str = "maf";

pub mod meta {
    pub const FORMAT_VERSION: &str = "format_version";
    pub const TOOL_VERSION: &str = "tool_version";
    pub const NAME: &str = "name";
    pub const CREATED_AT: &str = "created_at";
    pub const SOURCE_PATH: &str = "source_path";
    pub const SOURCE_SHA256: &str = "source_sha256";
    pub const LAYOUT: &str = "layout";
    pub const OPTIONS: &str = "options";
    pub const STATS: &str = "stats";
}
