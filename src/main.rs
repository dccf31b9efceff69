// ==============================================================================
// main.rs - ldlookup Entry Point
// ==============================================================================
// Description: Command dispatcher, logging setup and exit codes
// Author: Matt Barham
// Created: 2026-10-14
// Modified: 2026-10-14
// Version: 1.0.0
// ==============================================================================

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::{self, BufWriter};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ldlookup::commands;
use ldlookup::models::{BuildOptions, FieldLayout, RSquaredWindow};
use ldlookup::parsers::MarkerList;
use ldlookup::{DatasetStore, LdLookupError, Stopwatch};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding dataset files
    #[arg(long, global = true, env = "LDLOOKUP_DATA_DIR", default_value = ".")]
    data_dir: PathBuf,

    /// More log output on stderr (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only warnings and errors on stderr
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a named dataset from an LD source file
    Create {
        dataset_name: String,
        source_path: PathBuf,

        /// Lowest r² kept (upper bound 1 is always excluded)
        #[arg(long, default_value_t = 0.0, value_parser = parse_r_squared)]
        min_r_squared: f64,

        #[arg(long, default_value_t = 2)]
        index_marker_column: usize,

        #[arg(long, default_value_t = 3)]
        maf_column: usize,

        #[arg(long, default_value_t = 6)]
        ld_marker_column: usize,

        #[arg(long, default_value_t = 7)]
        r_squared_column: usize,

        /// Single ASCII column separator ("\t" or "tab" for a tab)
        #[arg(long, default_value = " ", value_parser = parse_delimiter)]
        delimiter: u8,

        /// Treat runs of the delimiter as one separator
        #[arg(long)]
        merge_delimiters: bool,

        #[arg(long, default_value_t = 15)]
        surrogate_bins: usize,

        #[arg(long, default_value_t = 15)]
        maf_bins: usize,
    },

    /// Print the markers in LD with each queried marker
    #[command(name = "get_ld")]
    GetLd {
        dataset_name: String,

        #[command(flatten)]
        markers: MarkerArgs,
    },

    /// Print index markers sharing the profile cell of a (MAF, surrogates) pair
    #[command(name = "similar_by_value")]
    SimilarByValue {
        dataset_name: String,

        #[arg(long)]
        maf: f64,

        #[arg(long)]
        surrogates: u64,
    },

    /// Print index markers sharing the profile cell of each queried marker
    #[command(name = "similar_by_marker")]
    SimilarByMarker {
        dataset_name: String,

        #[command(flatten)]
        markers: MarkerArgs,
    },

    /// Draw matched null distributions for a marker set
    Distribute {
        dataset_name: String,

        #[command(flatten)]
        markers: MarkerArgs,

        /// Number of distributions
        #[arg(short = 'n', long, default_value_t = 1)]
        distributions: usize,

        /// Seed for a reproducible draw
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print dataset metadata as JSON
    Info { dataset_name: String },
}

/// Marker sources; at least one is required
#[derive(Args, Debug)]
#[group(required = true, multiple = true)]
struct MarkerArgs {
    /// File with one marker per line
    marker_list: Option<PathBuf>,

    /// Query one marker (repeatable)
    #[arg(short = 'm', long = "marker")]
    marker: Vec<String>,
}

impl MarkerArgs {
    fn open(self) -> ldlookup::Result<MarkerList> {
        MarkerList::open(self.marker_list.as_deref(), self.marker)
    }
}

fn parse_delimiter(value: &str) -> std::result::Result<u8, String> {
    match value {
        "\\t" | "tab" => return Ok(b'\t'),
        _ => {}
    }
    match value.as_bytes() {
        [byte] if byte.is_ascii() && *byte != b'\n' && *byte != b'\r' => Ok(*byte),
        _ => Err(format!("delimiter must be a single ASCII character, got {:?}", value)),
    }
}

fn parse_r_squared(value: &str) -> std::result::Result<f64, String> {
    let parsed: f64 = value.parse().map_err(|e| format!("{}", e))?;
    if parsed.is_finite() {
        Ok(parsed)
    } else {
        Err(format!("r² threshold must be finite, got {}", value))
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let default_filter = match (quiet, verbose) {
        (true, _) => "ldlookup=warn",
        (false, 0) => "ldlookup=info",
        (false, 1) => "ldlookup=debug",
        (false, _) => "ldlookup=trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let store = DatasetStore::new(&cli.data_dir);
    let clock = Stopwatch::start();
    let stdout = io::stdout();
    let out = BufWriter::new(stdout.lock());

    match cli.command {
        Command::Create {
            dataset_name,
            source_path,
            min_r_squared,
            index_marker_column,
            maf_column,
            ld_marker_column,
            r_squared_column,
            delimiter,
            merge_delimiters,
            surrogate_bins,
            maf_bins,
        } => {
            let layout = FieldLayout {
                index_marker_column,
                index_maf_column: maf_column,
                ld_marker_column,
                r_squared_column,
                delimiter,
                merge_delimiters,
            };
            let options = BuildOptions {
                window: RSquaredWindow::new(min_r_squared),
                surrogate_bins,
                maf_bins,
                ..BuildOptions::default()
            };
            let report = commands::create(&store, &dataset_name, &source_path, layout, options, &clock)?;
            info!("{} Dataset written to {:?}", clock, report.path);
        }
        Command::GetLd {
            dataset_name,
            markers,
        } => {
            commands::get_ld(&store, &dataset_name, markers.open()?, out, &clock)?;
        }
        Command::SimilarByValue {
            dataset_name,
            maf,
            surrogates,
        } => {
            commands::similar_by_value(&store, &dataset_name, maf, surrogates, out, &clock)?;
        }
        Command::SimilarByMarker {
            dataset_name,
            markers,
        } => {
            commands::similar_by_marker(&store, &dataset_name, markers.open()?, out, &clock)?;
        }
        Command::Distribute {
            dataset_name,
            markers,
            distributions,
            seed,
        } => {
            let markers = markers.open()?;
            commands::distribute(&store, &dataset_name, markers, distributions, seed, out, &clock)
                .with_context(|| format!("distribute on '{}'", dataset_name))?;
        }
        Command::Info { dataset_name } => {
            commands::info(&store, &dataset_name, out)?;
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    if let Err(e) = run(cli) {
        let exit_code = e
            .downcast_ref::<LdLookupError>()
            .map_or(1, LdLookupError::exit_code);
        error!("{:#}", e);
        std::process::exit(exit_code);
    }
}
