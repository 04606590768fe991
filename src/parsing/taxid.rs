//! Accession to TaxID mapping.
//!
//! The map file is tab-separated with exactly two fields per line,
//! `accession<TAB>taxid`. Lines with any other field count are skipped.
//! When an accession appears more than once the last line wins.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::core::error::{Result, ScreenError};

/// TaxID reported for accessions missing from the map
pub const UNMAPPED_TAXID: &str = "N/A";

#[derive(Debug, Clone, Default)]
pub struct TaxidMap {
    map: FxHashMap<String, String>,
}

impl TaxidMap {
    /// Load a map file.
    ///
    /// # Errors
    ///
    /// Returns `ScreenError::MappingFile` if the file cannot be opened or read.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            ScreenError::MappingFile(format!("Cannot open {}: {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(file)).map_err(|e| {
            ScreenError::MappingFile(format!("Cannot read {}: {e}", path.display()))
        })
    }

    /// Load a map file, falling back to an empty map (every accession
    /// unmapped) if it cannot be read.
    #[must_use]
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(map) => map,
            Err(e) => {
                warn!("{e}; all TaxIDs will be reported as {UNMAPPED_TAXID}");
                Self::default()
            }
        }
    }

    /// # Errors
    ///
    /// Returns an IO error if reading from `reader` fails.
    pub fn from_reader<R: BufRead>(reader: R) -> io::Result<Self> {
        let mut map = FxHashMap::default();
        let mut skipped = 0usize;

        for line in reader.split(b'\n') {
            let line = line?;
            let line = String::from_utf8_lossy(&line);
            let fields: Vec<&str> = line.trim().split('\t').collect();
            if let [accession, taxid] = fields.as_slice() {
                map.insert((*accession).to_string(), (*taxid).to_string());
            } else {
                skipped += 1;
            }
        }

        debug!(mapped = map.len(), skipped, "Loaded TaxID map");
        Ok(Self { map })
    }

    /// TaxID for `accession`, or [`UNMAPPED_TAXID`]
    #[must_use]
    pub fn resolve(&self, accession: &str) -> &str {
        self.map.get(accession).map_or(UNMAPPED_TAXID, String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_resolve_and_skip_malformed() {
        let text = "GCA_000001.1\t10239\nmalformed line\nGCA_000002.1\t11676\textra\n\nGCA_000003.1\t12345\r\n";
        let map = TaxidMap::from_reader(Cursor::new(text)).unwrap();

        assert_eq!(map.len(), 2);
        assert_eq!(map.resolve("GCA_000001.1"), "10239");
        assert_eq!(map.resolve("GCA_000003.1"), "12345");
        assert_eq!(map.resolve("GCA_000002.1"), UNMAPPED_TAXID);
        assert_eq!(map.resolve("GCA_999999.1"), "N/A");
    }

    #[test]
    fn test_last_mapping_wins() {
        let map = TaxidMap::from_reader(Cursor::new("acc\t1\nacc\t2\n")).unwrap();
        assert_eq!(map.resolve("acc"), "2");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taxid.map");
        assert!(matches!(
            TaxidMap::load(&path),
            Err(ScreenError::MappingFile(_))
        ));

        let empty = TaxidMap::load_or_empty(&path);
        assert!(empty.is_empty());
        assert_eq!(empty.resolve("GCA_000001.1"), UNMAPPED_TAXID);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taxid.map");
        std::fs::write(&path, "GCA_1.1\t99\n").unwrap();
        assert_eq!(TaxidMap::load(&path).unwrap().resolve("GCA_1.1"), "99");
    }
}
