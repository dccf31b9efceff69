// ==============================================================================
// lib.rs - ldlookup Library
// ==============================================================================
// Description: Build and query persisted linkage-disequilibrium marker indexes
// Author: Matt Barham
// Created: 2026-10-14
// Modified: 2026-10-14
// Version: 1.0.0
// ==============================================================================

pub mod builder;
pub mod commands;
pub mod error;
pub mod histogram;
pub mod models;
pub mod output;
pub mod parsers;
pub mod query;
pub mod schema;
pub mod store;
pub mod timing;

pub use error::{LdLookupError, Result};
pub use query::Dataset;
pub use store::DatasetStore;
pub use timing::Stopwatch;
