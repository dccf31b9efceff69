// ==============================================================================
// markers.rs - Query Marker List Reader
// ==============================================================================
// Description: Streams query keys from a marker-list file and/or the CLI
// Author: Matt Barham
// Created: 2026-10-14
// Modified: 2026-10-14
// Version: 1.0.0
// ==============================================================================
// Format: one marker identifier per line, no header
// Example:
//   rs1
//   rs7
// ==============================================================================

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::vec::IntoIter;
use tracing::{debug, warn};

use crate::error::{LdLookupError, Result};

/// Query keys in the order they should be answered: file first, then CLI
pub struct MarkerList {
    file: Option<(PathBuf, BufReader<File>)>,
    line_number: usize,
    buf: Vec<u8>,
    extra: IntoIter<String>,
}

impl MarkerList {
    /// Open a marker list
    ///
    /// The file (if any) is opened immediately so an unreadable path fails
    /// before any output is produced.
    pub fn open(path: Option<&Path>, extra: Vec<String>) -> Result<Self> {
        let file = match path {
            Some(path) => {
                let handle = File::open(path).map_err(|source| LdLookupError::MarkerListUnreadable {
                    path: path.to_path_buf(),
                    source,
                })?;
                if handle.metadata()?.is_dir() {
                    return Err(LdLookupError::MarkerListUnreadable {
                        path: path.to_path_buf(),
                        source: std::io::Error::new(
                            std::io::ErrorKind::InvalidInput,
                            "marker list is a directory",
                        ),
                    });
                }
                Some((path.to_path_buf(), BufReader::new(handle)))
            }
            None => None,
        };

        Ok(Self {
            file,
            line_number: 0,
            buf: Vec::new(),
            extra: extra.into_iter(),
        })
    }

    /// Markers given directly, without a file
    pub fn from_markers(markers: Vec<String>) -> Self {
        Self {
            file: None,
            line_number: 0,
            buf: Vec::new(),
            extra: markers.into_iter(),
        }
    }

    /// Next marker from the file; undecodable and blank lines are skipped
    fn next_from_file(&mut self) -> Option<Result<String>> {
        let (path, reader) = self.file.as_mut()?;
        loop {
            self.buf.clear();
            match reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => {
                    self.file = None;
                    return None;
                }
                Err(source) => {
                    let path = path.clone();
                    self.file = None;
                    return Some(Err(LdLookupError::MarkerListUnreadable { path, source }));
                }
                Ok(_) => {
                    self.line_number += 1;
                    let Ok(line) = std::str::from_utf8(&self.buf) else {
                        warn!(
                            "Skipping marker at line {} of {:?}: not valid UTF-8",
                            self.line_number, path
                        );
                        continue;
                    };
                    let marker = line.trim();
                    if marker.is_empty() {
                        debug!("Skipping blank marker at line {}", self.line_number);
                        continue;
                    }
                    return Some(Ok(marker.to_string()));
                }
            }
        }
    }
}

impl Iterator for MarkerList {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(item) = self.next_from_file() {
            return Some(item);
        }
        self.extra
            .by_ref()
            .map(|marker| marker.trim().to_string())
            .find(|marker| !marker.is_empty())
            .map(Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_file_then_cli_markers_blank_lines_skipped() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "rs1\n\n  rs2  \r\n\nrs3").unwrap();
        file.flush().unwrap();

        let markers: Vec<String> = MarkerList::open(Some(file.path()), vec!["rs9".to_string()])
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(markers, vec!["rs1", "rs2", "rs3", "rs9"]);
    }

    #[test]
    fn test_undecodable_line_is_skipped() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"rs1\n\xff\xfe\nrs3\n").unwrap();
        file.flush().unwrap();

        let markers: Vec<String> = MarkerList::open(Some(file.path()), Vec::new())
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(markers, vec!["rs1", "rs3"]);
    }

    #[test]
    fn test_unreadable_file_fails_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("markers.txt");
        let result = MarkerList::open(Some(&missing), Vec::new());
        assert!(matches!(
            result,
            Err(LdLookupError::MarkerListUnreadable { .. })
        ));
    }

    #[test]
    fn test_from_markers_only() {
        let markers: Vec<String> = MarkerList::from_markers(vec!["rs4".to_string(), " ".to_string()])
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(markers, vec!["rs4"]);
    }
}
