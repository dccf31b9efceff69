// ==============================================================================
// source.rs - Streaming LD Source Reader
// ==============================================================================
// Description: Opens plain or gzipped LD files for a single streaming pass
// Author: Matt Barham
// Created: 2026-10-14
// Modified: 2026-10-14
// Version: 1.0.0
// ==============================================================================

use flate2::read::MultiGzDecoder;
use sha2::{Digest, Sha256};
use std::cell::RefCell;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::debug;

const READ_BUFFER_SIZE: usize = 1 << 20; // 1 MiB

/// Pass-through reader that hashes every byte it yields
struct HashingReader<R> {
    inner: R,
    hasher: Rc<RefCell<Sha256>>,
}

impl<R: Read> Read for HashingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.hasher.borrow_mut().update(&buf[..n]);
        Ok(n)
    }
}

/// A line-by-line view of an LD source file
///
/// The SHA-256 covers the bytes on disk (before decompression) and is only
/// meaningful once every line has been read.
pub struct LdSource {
    path: PathBuf,
    reader: Box<dyn BufRead>,
    hasher: Rc<RefCell<Sha256>>,
    compressed: bool,
}

impl LdSource {
    /// Open `path`, decompressing when it ends in `.gz`
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        if file.metadata()?.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "source path is a directory",
            ));
        }

        let hasher = Rc::new(RefCell::new(Sha256::new()));
        let hashing = HashingReader {
            inner: file,
            hasher: Rc::clone(&hasher),
        };

        let compressed = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("gz"))
            .unwrap_or(false);

        let reader: Box<dyn BufRead> = if compressed {
            debug!("Opening gzip-compressed source {:?}", path);
            Box::new(BufReader::with_capacity(
                READ_BUFFER_SIZE,
                MultiGzDecoder::new(hashing),
            ))
        } else {
            Box::new(BufReader::with_capacity(READ_BUFFER_SIZE, hashing))
        };

        Ok(Self {
            path,
            reader,
            hasher,
            compressed,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// Read the next line into `buf` (terminator stripped)
    ///
    /// Returns `Ok(false)` at end of input.
    pub fn next_line(&mut self, buf: &mut Vec<u8>) -> io::Result<bool> {
        buf.clear();
        let n = self.reader.read_until(b'\n', buf)?;
        if n == 0 {
            return Ok(false);
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
        }
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
        Ok(true)
    }

    /// Hex SHA-256 of everything read so far
    pub fn sha256(&self) -> String {
        format!("{:x}", self.hasher.borrow().clone().finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    fn read_all(source: &mut LdSource) -> Vec<String> {
        let mut lines = Vec::new();
        let mut buf = Vec::new();
        while source.next_line(&mut buf).unwrap() {
            lines.push(String::from_utf8(buf.clone()).unwrap());
        }
        lines
    }

    #[test]
    fn test_reads_plain_lines() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "a b c\r\nd e f\nlast").unwrap();
        file.flush().unwrap();

        let mut source = LdSource::open(file.path()).unwrap();
        assert!(!source.is_compressed());
        assert_eq!(read_all(&mut source), vec!["a b c", "d e f", "last"]);
    }

    #[test]
    fn test_reads_gzip_and_hashes_raw_bytes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pairs.ld.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(b"1 100 rs1 0.30 X Y rs2 0.80\n").unwrap();
        encoder.finish().unwrap();

        let mut source = LdSource::open(&path).unwrap();
        assert!(source.is_compressed());
        assert_eq!(read_all(&mut source), vec!["1 100 rs1 0.30 X Y rs2 0.80"]);

        let raw = std::fs::read(&path).unwrap();
        let expected = format!("{:x}", Sha256::digest(&raw));
        assert_eq!(source.sha256(), expected);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(LdSource::open(dir.path().join("absent.ld")).is_err());
        assert!(LdSource::open(dir.path()).is_err());
    }
}
