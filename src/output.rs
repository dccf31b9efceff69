// ==============================================================================
// output.rs - Query Output Formatting
// ==============================================================================
// Description: Tab-separated association stream and JSON dataset summaries
// Author: Matt Barham
// Created: 2026-10-14
// Modified: 2026-10-14
// Version: 1.0.0
// ==============================================================================
// Format (stdout, stable): one association per line, key and value joined by a
// single tab, no header.
//   rs1	rs2
//   rs1	rs3
// ==============================================================================

use std::io::{self, Write};

use crate::models::DatasetInfo;

/// Writes `key\tvalue` lines to a sink (stdout in the binary)
pub struct AssociationWriter<W: Write> {
    out: W,
    lines_written: u64,
}

impl<W: Write> AssociationWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            lines_written: 0,
        }
    }

    pub fn write_pair(&mut self, key: &str, value: &str) -> io::Result<()> {
        writeln!(self.out, "{}\t{}", key, value)?;
        self.lines_written += 1;
        Ok(())
    }

    /// One line per value; an empty slice writes nothing
    pub fn write_values<S: AsRef<str>>(&mut self, key: &str, values: &[S]) -> io::Result<()> {
        for value in values {
            self.write_pair(key, value.as_ref())?;
        }
        Ok(())
    }

    pub fn lines_written(&self) -> u64 {
        self.lines_written
    }

    pub fn finish(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

/// Pretty JSON document for `info`
pub fn write_info<W: Write>(out: &mut W, info: &DatasetInfo) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(&mut *out, info)?;
    writeln!(out).map_err(serde_json::Error::io)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_association_lines() {
        let mut writer = AssociationWriter::new(Vec::new());
        writer.write_values("rs1", &["rs2", "rs2", "rs3"]).unwrap();
        writer.write_values::<&str>("rs9", &[]).unwrap();
        assert_eq!(writer.lines_written(), 3);

        let bytes = writer.finish().unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "rs1\trs2\nrs1\trs2\nrs1\trs3\n");
    }
}
