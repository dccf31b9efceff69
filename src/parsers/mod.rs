// ==============================================================================
// parsers/mod.rs - File parser modules
// ==============================================================================
// Description: Parsers for LD source files and query marker lists
// Author: Matt Barham
// Created: 2026-10-14
// Modified: 2026-10-14
// Version: 1.0.0
// ==============================================================================

pub mod ld;
pub mod markers;
pub mod source;

pub use ld::{LdParseError, LdRecordParser, LineOutcome};
pub use markers::MarkerList;
pub use source::LdSource;
