// ==============================================================================
// query.rs - Dataset Query Engine
// ==============================================================================
// Description: Read-only lookups against a published dataset
// Author: Matt Barham
// Created: 2026-10-14
// Modified: 2026-10-14
// Version: 1.0.0
// ==============================================================================

use rand::seq::SliceRandom;
use rand::Rng;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::error::{LdLookupError, Result};
use crate::histogram::{bin_bounds, last_lte};
use crate::models::{DatasetInfo, MarkerProfile};
use crate::schema::{self, meta};
use crate::store::DatasetStore;

/// Position of a profile in the (surrogate bin, MAF bin) grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellKey {
    pub surrogate_bin: usize,
    pub maf_bin: usize,
}

/// An open, immutable dataset
///
/// Each handle owns its own read-only connection; any number of handles
/// (in one or many processes) can read the same dataset.
pub struct Dataset {
    name: String,
    conn: Connection,
    surrogate_cutpoints: Vec<u64>,
    maf_cutpoints: Vec<f64>,
}

impl Dataset {
    /// Open dataset `name` for reading
    pub fn open(store: &DatasetStore, name: &str) -> Result<Self> {
        let path = store.locate(name)?;
        debug!("Opening dataset '{}' at {:?}", name, path);

        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        let corrupt = |details: String| LdLookupError::CorruptDataset {
            name: name.to_string(),
            details,
        };

        let version: Option<String> = conn
            .query_row(
                "SELECT value FROM metadata WHERE key = ?1",
                params![meta::FORMAT_VERSION],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| corrupt(format!("unreadable metadata ({})", e)))?;
        match version {
            Some(v) if v == schema::FORMAT_VERSION => {}
            Some(v) => return Err(corrupt(format!("unsupported format version {}", v))),
            None => return Err(corrupt("missing format version".to_string())),
        }

        let mut surrogate_cutpoints = Vec::new();
        let mut maf_cutpoints = Vec::new();
        {
            let mut stmt = conn
                .prepare("SELECT axis, lower_bound FROM profile_bins ORDER BY axis, lower_bound")
                .map_err(|e| corrupt(format!("unreadable profile bins ({})", e)))?;
            let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?)))?;
            for row in rows {
                let (axis, lower) = row?;
                match axis.as_str() {
                    schema::AXIS_SURROGATES => surrogate_cutpoints.push(lower as u64),
                    schema::AXIS_MAF => maf_cutpoints.push(lower),
                    other => return Err(corrupt(format!("unknown bin axis '{}'", other))),
                }
            }
        }

        Ok(Self {
            name: name.to_string(),
            conn,
            surrogate_cutpoints,
            maf_cutpoints,
        })
    }

    /// Every stored LD marker for `marker`, duplicates included
    ///
    /// Unknown markers give an empty list.
    pub fn associations(&self, marker: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare_cached(schema::SELECT_ASSOCIATIONS)?;
        let values = stmt
            .query_map(params![marker], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        debug!("{}: {} associations", marker, values.len());
        Ok(values)
    }

    pub fn profile(&self, marker: &str) -> Result<Option<MarkerProfile>> {
        let mut stmt = self.conn.prepare_cached(schema::SELECT_PROFILE)?;
        let profile = stmt
            .query_row(params![marker], |row| {
                Ok(MarkerProfile {
                    index_marker: row.get(0)?,
                    surrogate_count: row.get(1)?,
                    maf: row.get(2)?,
                })
            })
            .optional()?;
        Ok(profile)
    }

    /// Grid cell for a profile, `None` when below the first cutpoint of either axis
    pub fn cell_of(&self, surrogate_count: u64, maf: f64) -> Option<CellKey> {
        Some(CellKey {
            surrogate_bin: last_lte(surrogate_count, &self.surrogate_cutpoints)?,
            maf_bin: last_lte(maf, &self.maf_cutpoints)?,
        })
    }

    /// Index markers whose profile falls in the same cell as the given values
    pub fn similar_by_value(&self, surrogate_count: u64, maf: f64) -> Result<Vec<String>> {
        let Some((surrogate_lower, surrogate_upper)) = bin_bounds(surrogate_count, &self.surrogate_cutpoints) else {
            return Ok(Vec::new());
        };
        let Some((maf_lower, maf_upper)) = bin_bounds(maf, &self.maf_cutpoints) else {
            return Ok(Vec::new());
        };

        let mut stmt = self.conn.prepare_cached(schema::SELECT_CELL)?;
        let members = stmt
            .query_map(
                params![surrogate_lower, surrogate_upper, maf_lower, maf_upper],
                |row| row.get(0),
            )?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(members)
    }

    /// Index markers in the same cell as `marker`'s profile
    pub fn similar_by_marker(&self, marker: &str) -> Result<Vec<String>> {
        match self.profile(marker)? {
            Some(profile) => self.similar_by_value(profile.surrogate_count, profile.maf),
            None => {
                debug!("{}: not an index marker in '{}'", marker, self.name);
                Ok(Vec::new())
            }
        }
    }

    /// Build `n_distributions` matched null sets
    ///
    /// For every input marker with a non-empty cell, one marker per
    /// distribution is drawn (with replacement) from that cell. Markers that
    /// are unknown or fall in no cell are skipped.
    pub fn distribute<I, R>(&self, markers: I, n_distributions: usize, rng: &mut R) -> Result<Vec<Vec<String>>>
    where
        I: IntoIterator<Item = Result<String>>,
        R: Rng + ?Sized,
    {
        let mut distributions = vec![Vec::new(); n_distributions];
        let mut cells: HashMap<CellKey, Vec<String>> = HashMap::new();
        let mut skipped = 0usize;

        for marker in markers {
            let marker = marker?;
            let Some(profile) = self.profile(&marker)? else {
                skipped += 1;
                continue;
            };
            let Some(key) = self.cell_of(profile.surrogate_count, profile.maf) else {
                skipped += 1;
                continue;
            };

            if !cells.contains_key(&key) {
                let members = self.similar_by_value(profile.surrogate_count, profile.maf)?;
                cells.insert(key, members);
            }
            let members = &cells[&key];
            if members.is_empty() {
                skipped += 1;
                continue;
            }

            for distribution in distributions.iter_mut() {
                if let Some(pick) = members.choose(rng) {
                    distribution.push(pick.clone());
                }
            }
        }

        info!(
            "Built {} distributions from {} cells ({} markers skipped)",
            n_distributions,
            cells.len(),
            skipped
        );
        Ok(distributions)
    }

    /// Build metadata recorded by `create`
    pub fn info(&self) -> Result<DatasetInfo> {
        let mut stmt = self.conn.prepare("SELECT key, value FROM metadata")?;
        let entries: HashMap<String, String> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<_>>()?;

        let field = |key: &str| -> Result<&String> {
            entries.get(key).ok_or_else(|| LdLookupError::CorruptDataset {
                name: self.name.clone(),
                details: format!("missing metadata key '{}'", key),
            })
        };

        let created_at = chrono::DateTime::parse_from_rfc3339(field(meta::CREATED_AT)?)
            .map(|at| at.with_timezone(&chrono::Utc))
            .map_err(|e| LdLookupError::CorruptDataset {
                name: self.name.clone(),
                details: format!("invalid creation timestamp ({})", e),
            })?;

        Ok(DatasetInfo {
            name: field(meta::NAME)?.clone(),
            format_version: field(meta::FORMAT_VERSION)?.clone(),
            tool_version: field(meta::TOOL_VERSION)?.clone(),
            created_at,
            source_path: field(meta::SOURCE_PATH)?.clone(),
            source_sha256: field(meta::SOURCE_SHA256)?.clone(),
            layout: serde_json::from_str(field(meta::LAYOUT)?)?,
            options: serde_json::from_str(field(meta::OPTIONS)?)?,
            stats: serde_json::from_str(field(meta::STATS)?)?,
            surrogate_cutpoints: self.surrogate_cutpoints.clone(),
            maf_cutpoints: self.maf_cutpoints.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::IndexBuilder;
    use crate::models::{BuildOptions, FieldLayout};
    use crate::timing::Stopwatch;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile, TempDir};

    fn build(contents: &str, options: BuildOptions) -> (TempDir, DatasetStore) {
        let dir = tempdir().unwrap();
        let store = DatasetStore::new(dir.path());
        let mut source = NamedTempFile::new().unwrap();
        source.write_all(contents.as_bytes()).unwrap();
        source.flush().unwrap();

        IndexBuilder::new(&store, FieldLayout::default(), options)
            .create("ds1", source.path(), &Stopwatch::start())
            .unwrap();
        (dir, store)
    }

    fn sorted(mut values: Vec<String>) -> Vec<String> {
        values.sort();
        values
    }

    #[test]
    fn test_concrete_scenario() {
        let (_dir, store) = build("1 100 rs1 0.30 X Y rs2 0.80\n", BuildOptions::default());
        let dataset = Dataset::open(&store, "ds1").unwrap();
        assert_eq!(dataset.associations("rs1").unwrap(), vec!["rs2"]);
    }

    #[test]
    fn test_duplicates_are_preserved() {
        let (_dir, store) = build(
            "\
1 1 rs1 0.3 X Y rs2 0.8
1 1 rs1 0.3 X Y rs2 0.8
1 1 rs1 0.3 X Y rs3 0.5
1 1 rs4 0.1 X Y rs2 0.5
",
            BuildOptions::default(),
        );
        let dataset = Dataset::open(&store, "ds1").unwrap();

        assert_eq!(sorted(dataset.associations("rs1").unwrap()), vec!["rs2", "rs2", "rs3"]);
        assert_eq!(dataset.associations("rs4").unwrap(), vec!["rs2"]);
        assert!(dataset.associations("rs2").unwrap().is_empty());
        assert!(dataset.associations("never-seen").unwrap().is_empty());
    }

    #[test]
    fn test_profiles_keep_first_maf() {
        let (_dir, store) = build(
            "1 1 rs1 0.30 X Y rs2 0.8\n1 1 rs1 0.35 X Y rs3 0.8\n",
            BuildOptions::default(),
        );
        let dataset = Dataset::open(&store, "ds1").unwrap();

        let profile = dataset.profile("rs1").unwrap().unwrap();
        assert_eq!(profile.surrogate_count, 2);
        assert_eq!(profile.maf, 0.30);
        assert!(dataset.profile("rs2").unwrap().is_none());
    }

    #[test]
    fn test_open_unknown_and_corrupt_datasets() {
        let dir = tempdir().unwrap();
        let store = DatasetStore::new(dir.path());
        assert!(matches!(
            Dataset::open(&store, "nope"),
            Err(LdLookupError::UnknownDataset(_))
        ));

        std::fs::write(store.dataset_path("junk"), b"definitely not sqlite").unwrap();
        assert!(matches!(
            Dataset::open(&store, "junk"),
            Err(LdLookupError::CorruptDataset { .. })
        ));
    }

    fn similarity_fixture() -> (TempDir, DatasetStore) {
        // Profiles: a=(1, 0.1) b=(1, 0.1) c=(2, 0.4) d=(3, 0.4)
        build(
            "\
1 1 a 0.1 X Y s1 0.5
1 1 b 0.1 X Y s2 0.5
1 1 c 0.4 X Y s3 0.5
1 1 c 0.4 X Y s4 0.5
1 1 d 0.4 X Y s5 0.5
1 1 d 0.4 X Y s6 0.5
1 1 d 0.4 X Y s7 0.5
",
            BuildOptions {
                surrogate_bins: 2,
                maf_bins: 2,
                ..BuildOptions::default()
            },
        )
    }

    #[test]
    fn test_similarity_cells() {
        let (_dir, store) = similarity_fixture();
        let dataset = Dataset::open(&store, "ds1").unwrap();
        let info = dataset.info().unwrap();
        assert_eq!(info.surrogate_cutpoints, vec![1, 2]);
        assert_eq!(info.maf_cutpoints, vec![0.1, 0.4]);

        assert_eq!(dataset.similar_by_marker("a").unwrap(), vec!["a", "b"]);
        assert_eq!(dataset.similar_by_marker("c").unwrap(), vec!["c", "d"]);
        assert_eq!(dataset.similar_by_value(5, 0.9).unwrap(), vec!["c", "d"]);
        assert!(dataset.similar_by_value(0, 0.5).unwrap().is_empty());
        assert!(dataset.similar_by_value(2, 0.05).unwrap().is_empty());
        assert!(dataset.similar_by_marker("unknown").unwrap().is_empty());
    }

    #[test]
    fn test_distribute_draws_from_cell() {
        let (_dir, store) = similarity_fixture();
        let dataset = Dataset::open(&store, "ds1").unwrap();
        let markers = || ["a", "missing", "c"].into_iter().map(|m| Ok(m.to_string()));

        let mut rng = StdRng::seed_from_u64(7);
        let distributions = dataset.distribute(markers(), 4, &mut rng).unwrap();

        assert_eq!(distributions.len(), 4);
        for distribution in &distributions {
            assert_eq!(distribution.len(), 2);
            assert!(["a", "b"].contains(&distribution[0].as_str()));
            assert!(["c", "d"].contains(&distribution[1].as_str()));
        }

        let mut again = StdRng::seed_from_u64(7);
        assert_eq!(dataset.distribute(markers(), 4, &mut again).unwrap(), distributions);
    }

    #[test]
    fn test_info_round_trips_build_metadata() {
        let (_dir, store) = build("1 1 rs1 0.3 X Y rs2 0.8\nbad\n", BuildOptions::default());
        let dataset = Dataset::open(&store, "ds1").unwrap();
        let info = dataset.info().unwrap();

        assert_eq!(info.name, "ds1");
        assert_eq!(info.format_version, schema::FORMAT_VERSION);
        assert_eq!(info.stats.valid, 1);
        assert_eq!(info.stats.malformed, 1);
        assert_eq!(info.layout, FieldLayout::default());
    }
}
