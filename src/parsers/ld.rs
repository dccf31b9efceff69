// ==============================================================================
// ld.rs - LD Association Line Parser
// ==============================================================================
// Description: Parses and classifies pairwise LD records from delimited text
// Author: Matt Barham
// Created: 2026-10-14
// Modified: 2026-10-14
// Version: 1.0.0
// ==============================================================================
// Format: delimiter-separated text, one association per line
// Example (default layout, columns 2/3/6/7, single space):
//   1 100 rs1 0.30 X Y rs2 0.80
//   1 100 rs1 0.30 X Y rs3 0.45
// ==============================================================================

use thiserror::Error;

use crate::models::{AssociationRecord, FieldLayout, RSquaredWindow};

/// Reasons a source line cannot become an `AssociationRecord`
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LdParseError {
    #[error("Line is not valid UTF-8")]
    InvalidEncoding,

    #[error("Missing column {column} (line has {found} columns)")]
    MissingField { column: usize, found: usize },

    #[error("Empty marker identifier in column {column}")]
    EmptyMarker { column: usize },

    #[error("Invalid numeric value in column {column}: {value:?}")]
    InvalidNumber { column: usize, value: String },
}

/// Result of running one line through parse + validation
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    /// Parsed and inside the r² window
    Valid(AssociationRecord),
    /// Parsed, but r² outside the window
    Excluded(AssociationRecord),
    /// Not parseable under the layout
    Malformed(LdParseError),
}

/// Line-oriented parser for LD association records
#[derive(Debug, Clone)]
pub struct LdRecordParser {
    layout: FieldLayout,
    window: RSquaredWindow,
}

impl Default for LdRecordParser {
    fn default() -> Self {
        Self::new(FieldLayout::default(), RSquaredWindow::default())
    }
}

impl LdRecordParser {
    pub fn new(layout: FieldLayout, window: RSquaredWindow) -> Self {
        Self { layout, window }
    }

    /// Parse a single line under the configured layout
    ///
    /// Only columns up to the last one the layout needs are examined. A
    /// trailing `\r` (CRLF files) is ignored.
    pub fn parse_line(&self, line: &str) -> Result<AssociationRecord, LdParseError> {
        let line = line.strip_suffix('\n').unwrap_or(line);
        let line = line.strip_suffix('\r').unwrap_or(line);

        let delimiter = char::from(self.layout.delimiter);
        let last_column = self.layout.last_column();
        let merge = self.layout.merge_delimiters;

        let mut index_marker = None;
        let mut index_maf = None;
        let mut ld_marker = None;
        let mut r_squared = None;
        let mut found = 0;

        let fields = line
            .split(delimiter)
            .filter(|field| !merge || !field.is_empty())
            .take(last_column + 1);

        for (column, field) in fields.enumerate() {
            found = column + 1;
            if column == self.layout.index_marker_column {
                index_marker = Some(field);
            }
            if column == self.layout.index_maf_column {
                index_maf = Some(field);
            }
            if column == self.layout.ld_marker_column {
                ld_marker = Some(field);
            }
            if column == self.layout.r_squared_column {
                r_squared = Some(field);
            }
        }

        let index_marker = self.marker(index_marker, self.layout.index_marker_column, found)?;
        let ld_marker = self.marker(ld_marker, self.layout.ld_marker_column, found)?;
        let index_maf = self.number(index_maf, self.layout.index_maf_column, found)?;
        let r_squared = self.number(r_squared, self.layout.r_squared_column, found)?;

        Ok(AssociationRecord {
            index_marker: index_marker.to_string(),
            ld_marker: ld_marker.to_string(),
            index_maf,
            r_squared,
        })
    }

    /// Parse a raw byte line, rejecting invalid UTF-8
    pub fn parse_bytes(&self, line: &[u8]) -> Result<AssociationRecord, LdParseError> {
        let line = std::str::from_utf8(line).map_err(|_| LdParseError::InvalidEncoding)?;
        self.parse_line(line)
    }

    /// Accept iff `min_r_squared <= r_squared < 1`
    pub fn validate(&self, record: &AssociationRecord) -> bool {
        self.window.accepts(record.r_squared)
    }

    pub fn classify(&self, line: &[u8]) -> LineOutcome {
        match self.parse_bytes(line) {
            Ok(record) if self.validate(&record) => LineOutcome::Valid(record),
            Ok(record) => LineOutcome::Excluded(record),
            Err(e) => LineOutcome::Malformed(e),
        }
    }

    fn marker<'a>(
        &self,
        field: Option<&'a str>,
        column: usize,
        found: usize,
    ) -> Result<&'a str, LdParseError> {
        match field {
            None => Err(LdParseError::MissingField { column, found }),
            Some(value) => match value.trim() {
                "" => Err(LdParseError::EmptyMarker { column }),
                marker => Ok(marker),
            },
        }
    }

    /// NaN and infinities are rejected along with non-numbers
    fn number(&self, field: Option<&str>, column: usize, found: usize) -> Result<f64, LdParseError> {
        let value = field.ok_or(LdParseError::MissingField { column, found })?;
        match value.trim().parse::<f64>() {
            Ok(number) if number.is_finite() => Ok(number),
            _ => Err(LdParseError::InvalidNumber {
                column,
                value: value.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(index: &str, ld: &str, maf: f64, r2: f64) -> AssociationRecord {
        AssociationRecord {
            index_marker: index.to_string(),
            ld_marker: ld.to_string(),
            index_maf: maf,
            r_squared: r2,
        }
    }

    #[test]
    fn test_parse_default_layout() {
        let parser = LdRecordParser::default();
        let parsed = parser.parse_line("1 100 rs1 0.30 X Y rs2 0.80").unwrap();
        assert_eq!(parsed, record("rs1", "rs2", 0.30, 0.80));
    }

    #[test]
    fn test_parse_ignores_extra_columns_and_crlf() {
        let parser = LdRecordParser::default();
        let parsed = parser
            .parse_line("1 100 rs1 0.30 X Y rs2 0.80 extra more\r\n")
            .unwrap();
        assert_eq!(parsed, record("rs1", "rs2", 0.30, 0.80));
    }

    #[test]
    fn test_missing_fields_are_malformed() {
        let parser = LdRecordParser::default();
        assert_eq!(
            parser.parse_line("1 100 rs1 0.30 X Y rs2"),
            Err(LdParseError::MissingField { column: 7, found: 7 })
        );
        assert!(parser.parse_line("").is_err());
    }

    #[test]
    fn test_non_numeric_values_are_malformed() {
        let parser = LdRecordParser::default();
        assert!(matches!(
            parser.parse_line("1 100 rs1 abc X Y rs2 0.80"),
            Err(LdParseError::InvalidNumber { column: 3, .. })
        ));
        assert!(matches!(
            parser.parse_line("1 100 rs1 0.3 X Y rs2 high"),
            Err(LdParseError::InvalidNumber { column: 7, .. })
        ));
        assert!(matches!(
            parser.parse_line("1 100 rs1 NaN X Y rs2 0.5"),
            Err(LdParseError::InvalidNumber { column: 3, .. })
        ));
    }

    #[test]
    fn test_consecutive_delimiters_shift_columns() {
        // Strict splitting: the double space yields an empty column 2
        let parser = LdRecordParser::default();
        assert!(parser.parse_line("1 100  rs1 0.30 X Y rs2 0.80").is_err());

        let layout = FieldLayout {
            merge_delimiters: true,
            ..FieldLayout::default()
        };
        let merging = LdRecordParser::new(layout, RSquaredWindow::default());
        let parsed = merging.parse_line("   1 100  rs1 0.30 X   Y rs2 0.80").unwrap();
        assert_eq!(parsed, record("rs1", "rs2", 0.30, 0.80));
    }

    #[test]
    fn test_custom_layout_and_delimiter() {
        let layout = FieldLayout {
            index_marker_column: 0,
            index_maf_column: 1,
            ld_marker_column: 2,
            r_squared_column: 3,
            delimiter: b'\t',
            merge_delimiters: false,
        };
        let parser = LdRecordParser::new(layout, RSquaredWindow::default());
        let parsed = parser.parse_line("rs9\t0.12\trs10\t0.5").unwrap();
        assert_eq!(parsed, record("rs9", "rs10", 0.12, 0.5));
    }

    #[test]
    fn test_marker_fields_are_trimmed() {
        let layout = FieldLayout {
            index_marker_column: 0,
            index_maf_column: 1,
            ld_marker_column: 2,
            r_squared_column: 3,
            delimiter: b'\t',
            merge_delimiters: false,
        };
        let parser = LdRecordParser::new(layout, RSquaredWindow::default());
        let parsed = parser.parse_line("rs1 \t0.2\t rs2\t0.5").unwrap();
        assert_eq!(parsed, record("rs1", "rs2", 0.2, 0.5));
        assert_eq!(
            parser.parse_line(" \t0.2\trs2\t0.5"),
            Err(LdParseError::EmptyMarker { column: 0 })
        );
    }

    #[test]
    fn test_classify_outcomes() {
        let parser = LdRecordParser::new(FieldLayout::default(), RSquaredWindow::new(0.5));

        assert!(matches!(
            parser.classify(b"1 100 rs1 0.30 X Y rs2 0.50"),
            LineOutcome::Valid(_)
        ));
        assert!(matches!(
            parser.classify(b"1 100 rs1 0.30 X Y rs2 1.0"),
            LineOutcome::Excluded(_)
        ));
        assert!(matches!(
            parser.classify(b"1 100 rs1 0.30 X Y rs2 0.49"),
            LineOutcome::Excluded(_)
        ));
        assert!(matches!(
            parser.classify(b"not an ld line"),
            LineOutcome::Malformed(_)
        ));
        assert_eq!(
            parser.classify(b"1 100 rs1 0.30 X Y \xff\xfe 0.9"),
            LineOutcome::Malformed(LdParseError::InvalidEncoding)
        );
    }
}
