// ==============================================================================
// builder.rs - Dataset Index Builder
// ==============================================================================
// Description: Streams an LD source into a staged SQLite dataset and publishes it
// Author: Matt Barham
// Created: 2026-10-14
// Modified: 2026-10-14
// Version: 1.0.0
// ==============================================================================

use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{LdLookupError, Result};
use crate::histogram::bin_histogram;
use crate::models::{BuildOptions, BuildStats, DatasetInfo, FieldLayout};
use crate::parsers::{LdRecordParser, LdSource, LineOutcome};
use crate::schema::{self, meta};
use crate::store::DatasetStore;
use crate::timing::Stopwatch;

/// Malformed lines echoed individually before switching to a count
const MAX_LOGGED_MALFORMED: u64 = 20;

/// Outcome of a successful `create`
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub path: PathBuf,
    pub info: DatasetInfo,
}

/// Builds named datasets inside a [`DatasetStore`]
pub struct IndexBuilder<'a> {
    store: &'a DatasetStore,
    layout: FieldLayout,
    options: BuildOptions,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(store: &'a DatasetStore, layout: FieldLayout, options: BuildOptions) -> Self {
        Self {
            store,
            layout,
            options,
        }
    }

    /// Build dataset `name` from `source_path`
    ///
    /// The dataset only becomes visible once fully written. On any error the
    /// staging file is removed and no dataset exists under `name`.
    pub fn create(&self, name: &str, source_path: &Path, clock: &Stopwatch) -> Result<BuildReport> {
        info!("{} Creating dataset '{}' from {:?}", clock, name, source_path);

        let staged = self.store.stage(name)?;

        let mut source = LdSource::open(source_path).map_err(|source| {
            LdLookupError::SourceUnreadable {
                path: source_path.to_path_buf(),
                source,
            }
        })?;

        let mut conn = Connection::open(staged.staging_path())?;
        conn.execute_batch(schema::BUILD_PRAGMAS)?;
        conn.execute_batch(schema::CREATE_TABLES)?;

        let mut stats = self.load(&mut conn, &mut source, clock)?;
        let source_sha256 = source.sha256();
        drop(source);

        info!("{} Creating lookup indexes", clock);
        conn.execute_batch(schema::CREATE_INDEXES)?;

        stats.index_markers = conn.query_row("SELECT COUNT(*) FROM markers", [], |row| row.get(0))?;
        let (surrogate_cutpoints, maf_cutpoints) = self.write_bins(&conn)?;

        let info = DatasetInfo {
            name: name.to_string(),
            format_version: schema::FORMAT_VERSION.to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            created_at: Utc::now(),
            source_path: source_path.display().to_string(),
            source_sha256,
            layout: self.layout.clone(),
            options: self.options.clone(),
            stats,
            surrogate_cutpoints,
            maf_cutpoints,
        };
        write_metadata(&conn, &info)?;

        conn.execute_batch(schema::FINAL_PRAGMAS)?;
        conn.close().map_err(|(_, e)| e)?;

        let path = staged.publish()?;

        info!(
            "{} Dataset '{}' ready: {} associations across {} index markers ({} excluded, {} malformed of {} lines)",
            clock,
            name,
            info.stats.valid,
            info.stats.index_markers,
            info.stats.excluded,
            info.stats.malformed,
            info.stats.lines_read
        );

        Ok(BuildReport { path, info })
    }

    /// Single streaming pass: parse, classify, insert
    fn load(&self, conn: &mut Connection, source: &mut LdSource, clock: &Stopwatch) -> Result<BuildStats> {
        let parser = LdRecordParser::new(self.layout.clone(), self.options.window);
        let mut stats = BuildStats::default();
        let mut line = Vec::with_capacity(256);

        let tx = conn.transaction()?;
        {
            let mut insert_association = tx.prepare(schema::INSERT_ASSOCIATION)?;
            let mut upsert_marker = tx.prepare(schema::UPSERT_MARKER)?;

            loop {
                match source.next_line(&mut line) {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => {
                        return Err(LdLookupError::SourceUnreadable {
                            path: source.path().to_path_buf(),
                            source: e,
                        })
                    }
                }
                stats.lines_read += 1;

                match parser.classify(&line) {
                    LineOutcome::Valid(record) => {
                        insert_association.execute(params![record.index_marker, record.ld_marker])?;
                        upsert_marker.execute(params![record.index_marker, record.index_maf])?;
                        stats.valid += 1;
                    }
                    LineOutcome::Excluded(record) => {
                        debug!(
                            "Excluding {} -> {} (r² = {})",
                            record.index_marker, record.ld_marker, record.r_squared
                        );
                        stats.excluded += 1;
                    }
                    LineOutcome::Malformed(reason) => {
                        stats.malformed += 1;
                        if stats.malformed <= MAX_LOGGED_MALFORMED {
                            warn!(
                                "failed to parse marker association '{}' (line {}): {}",
                                String::from_utf8_lossy(&line),
                                stats.lines_read,
                                reason
                            );
                        } else if stats.malformed == MAX_LOGGED_MALFORMED + 1 {
                            warn!("Further malformed lines will only be counted");
                        }
                    }
                }

                if self.options.progress_every > 0 && stats.lines_read % self.options.progress_every == 0 {
                    info!(
                        "{} Read {} lines ({} valid, {} excluded, {} malformed)",
                        clock, stats.lines_read, stats.valid, stats.excluded, stats.malformed
                    );
                }
            }
        }
        tx.commit()?;

        if stats.malformed > 0 {
            warn!("{} malformed lines skipped", stats.malformed);
        }
        info!(
            "{} Source pass complete: {} lines, {} valid, {} excluded, {} malformed",
            clock, stats.lines_read, stats.valid, stats.excluded, stats.malformed
        );

        Ok(stats)
    }

    /// Compute and store profile cutpoints for both axes
    fn write_bins(&self, conn: &Connection) -> Result<(Vec<u64>, Vec<f64>)> {
        let surrogate_hist: Vec<(u64, u64)> = conn
            .prepare(schema::SURROGATE_HISTOGRAM)?
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<_>>()?;
        let maf_hist: Vec<(f64, u64)> = conn
            .prepare(schema::MAF_HISTOGRAM)?
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<_>>()?;

        let surrogate_bins = bin_histogram(&surrogate_hist, self.options.surrogate_bins);
        let maf_bins = bin_histogram(&maf_hist, self.options.maf_bins);
        debug!(
            "Profile bins: {} by surrogate count, {} by MAF",
            surrogate_bins.len(),
            maf_bins.len()
        );

        let mut insert = conn.prepare(
            "INSERT INTO profile_bins (axis, lower_bound, population) VALUES (?1, ?2, ?3)",
        )?;
        for (lower, population) in &surrogate_bins {
            insert.execute(params![schema::AXIS_SURROGATES, *lower as f64, population])?;
        }
        for (lower, population) in &maf_bins {
            insert.execute(params![schema::AXIS_MAF, lower, population])?;
        }

        Ok((
            surrogate_bins.into_iter().map(|(lower, _)| lower).collect(),
            maf_bins.into_iter().map(|(lower, _)| lower).collect(),
        ))
    }
}

fn write_metadata(conn: &Connection, info: &DatasetInfo) -> Result<()> {
    let items = vec![
        (meta::FORMAT_VERSION, info.format_version.clone()),
        (meta::TOOL_VERSION, info.tool_version.clone()),
        (meta::NAME, info.name.clone()),
        (meta::CREATED_AT, info.created_at.to_rfc3339()),
        (meta::SOURCE_PATH, info.source_path.clone()),
        (meta::SOURCE_SHA256, info.source_sha256.clone()),
        (meta::LAYOUT, serde_json::to_string(&info.layout)?),
        (meta::OPTIONS, serde_json::to_string(&info.options)?),
        (meta::STATS, serde_json::to_string(&info.stats)?),
    ];

    let mut insert = conn.prepare("INSERT INTO metadata (key, value) VALUES (?1, ?2)")?;
    for (key, value) in items {
        insert.execute(params![key, value])?;
    }
    Ok(())
}
