// ==============================================================================
// commands.rs - Subcommand Implementations
// ==============================================================================
// Description: create / get_ld / similarity / distribute / info entry points
// Author: Matt Barham
// Created: 2026-10-14
// Modified: 2026-10-14
// Version: 1.0.0
// ==============================================================================

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::builder::{BuildReport, IndexBuilder};
use crate::error::Result;
use crate::models::{BuildOptions, FieldLayout};
use crate::output::{self, AssociationWriter};
use crate::parsers::MarkerList;
use crate::query::Dataset;
use crate::store::DatasetStore;
use crate::timing::Stopwatch;

/// `create <name> <source>`
pub fn create(
    store: &DatasetStore,
    name: &str,
    source: &Path,
    layout: FieldLayout,
    options: BuildOptions,
    clock: &Stopwatch,
) -> Result<BuildReport> {
    IndexBuilder::new(store, layout, options).create(name, source, clock)
}

/// `get_ld <name> (-m <marker> | <marker_list>)`
///
/// Returns the number of association lines written.
pub fn get_ld<W: Write>(
    store: &DatasetStore,
    name: &str,
    markers: MarkerList,
    out: W,
    clock: &Stopwatch,
) -> Result<u64> {
    let dataset = Dataset::open(store, name)?;
    let mut writer = AssociationWriter::new(out);
    let mut queried = 0u64;

    for marker in markers {
        let marker = marker?;
        let values = dataset.associations(&marker)?;
        writer.write_values(&marker, &values)?;
        queried += 1;
    }

    let lines = writer.lines_written();
    writer.finish()?;
    info!(
        "{} get_ld on '{}': {} markers, {} associations",
        clock, name, queried, lines
    );
    Ok(lines)
}

/// `similar_by_value <name> --maf <f> --surrogates <n>`
pub fn similar_by_value<W: Write>(
    store: &DatasetStore,
    name: &str,
    maf: f64,
    surrogates: u64,
    out: W,
    clock: &Stopwatch,
) -> Result<u64> {
    let dataset = Dataset::open(store, name)?;
    let members = dataset.similar_by_value(surrogates, maf)?;

    let mut writer = AssociationWriter::new(out);
    writer.write_values(&format!("{} {}", maf, surrogates), &members)?;
    let lines = writer.lines_written();
    writer.finish()?;

    info!("{} similar_by_value on '{}': {} markers", clock, name, lines);
    Ok(lines)
}

/// `similar_by_marker <name> (-m <marker> | <marker_list>)`
pub fn similar_by_marker<W: Write>(
    store: &DatasetStore,
    name: &str,
    markers: MarkerList,
    out: W,
    clock: &Stopwatch,
) -> Result<u64> {
    let dataset = Dataset::open(store, name)?;
    let mut writer = AssociationWriter::new(out);

    for marker in markers {
        let marker = marker?;
        let members = dataset.similar_by_marker(&marker)?;
        writer.write_values(&marker, &members)?;
    }

    let lines = writer.lines_written();
    writer.finish()?;
    info!("{} similar_by_marker on '{}': {} lines", clock, name, lines);
    Ok(lines)
}

/// `distribute <name> (-m <marker> | <marker_list>) [-n N] [--seed S]`
///
/// Keys are `distribution_1` .. `distribution_N`.
pub fn distribute<W: Write>(
    store: &DatasetStore,
    name: &str,
    markers: MarkerList,
    n_distributions: usize,
    seed: Option<u64>,
    out: W,
    clock: &Stopwatch,
) -> Result<u64> {
    let dataset = Dataset::open(store, name)?;
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let distributions = dataset.distribute(markers, n_distributions, &mut rng)?;

    let mut writer = AssociationWriter::new(out);
    for (i, distribution) in distributions.iter().enumerate() {
        writer.write_values(&format!("distribution_{}", i + 1), distribution)?;
    }
    let lines = writer.lines_written();
    writer.finish()?;

    info!("{} distribute on '{}': {} lines", clock, name, lines);
    Ok(lines)
}

/// `info <name>`
pub fn info<W: Write>(store: &DatasetStore, name: &str, mut out: W) -> Result<()> {
    let dataset = Dataset::open(store, name)?;
    let info = dataset.info()?;
    output::write_info(&mut out, &info)?;
    out.flush()?;
    Ok(())
}
