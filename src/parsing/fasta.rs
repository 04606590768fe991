//! Streaming FASTA reader using noodles.
//!
//! Records are yielded one at a time, so inputs of any size can be processed
//! without buffering the whole file. Gzip and bgzip input is detected from
//! the stream's magic bytes and decompressed transparently, whatever the file
//! extension.
//!
//! The stream is finite and not rewindable; to read it again, open the
//! source again.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use noodles::fasta;
use tracing::debug;

use crate::core::kmer::normalize_sequence;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// A named sequence read from a FASTA stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRecord {
    /// Full definition line without the leading `>`
    pub name: String,

    /// Upper-cased bases, line breaks removed
    pub sequence: Vec<u8>,
}

impl SequenceRecord {
    /// First whitespace-delimited token of the definition line
    #[must_use]
    pub fn id(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or("")
    }
}

/// Lazy iterator over the records of a FASTA stream
pub struct FastaRecords {
    reader: fasta::io::Reader<Box<dyn BufRead + Send>>,
    definition: String,
}

impl FastaRecords {
    /// Open a FASTA file, plain or gzip-compressed.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be opened or its first bytes
    /// cannot be read.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Wrap an already-open stream, plain or gzip-compressed.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the first bytes of the stream cannot be read.
    pub fn from_reader<R>(mut reader: R) -> io::Result<Self>
    where
        R: BufRead + Send + 'static,
    {
        let is_gzip = reader.fill_buf()?.starts_with(&GZIP_MAGIC);
        let inner: Box<dyn BufRead + Send> = if is_gzip {
            // bgzip files are multi-member gzip
            Box::new(BufReader::new(MultiGzDecoder::new(reader)))
        } else {
            Box::new(reader)
        };

        Ok(Self {
            reader: fasta::io::Reader::new(inner),
            definition: String::new(),
        })
    }
}

impl Iterator for FastaRecords {
    type Item = io::Result<SequenceRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.definition.clear();
            match self.reader.read_definition(&mut self.definition) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(e)),
            }

            let mut raw = Vec::new();
            if let Err(e) = self.reader.read_sequence(&mut raw) {
                return Some(Err(e));
            }

            let line = self.definition.trim();
            if let Some(name) = line.strip_prefix('>') {
                return Some(Ok(SequenceRecord {
                    name: name.trim().to_string(),
                    sequence: normalize_sequence(&raw),
                }));
            }

            // Text before the first definition line
            if !line.is_empty() || !raw.is_empty() {
                debug!("Skipping {} bytes outside any FASTA record", line.len() + raw.len());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    fn read_all(bytes: Vec<u8>) -> Vec<SequenceRecord> {
        FastaRecords::from_reader(Cursor::new(bytes))
            .unwrap()
            .collect::<io::Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_read_multiline_records() {
        let records = read_all(b">seq1 first record\nACGTacgt\nAC\n>seq2\nGGGG\n".to_vec());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "seq1 first record");
        assert_eq!(records[0].id(), "seq1");
        assert_eq!(records[0].sequence, b"ACGTACGTAC".to_vec());
        assert_eq!(records[1].name, "seq2");
        assert_eq!(records[1].sequence, b"GGGG".to_vec());
    }

    #[test]
    fn test_empty_record_and_crlf() {
        let records = read_all(b">empty\r\n>seq\r\nAC\r\nGT\r\n".to_vec());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "empty");
        assert!(records[0].sequence.is_empty());
        assert_eq!(records[1].sequence, b"ACGT".to_vec());
    }

    #[test]
    fn test_leading_text_is_skipped() {
        let records = read_all(b"\n\n>seq1\nAAAA\n".to_vec());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "seq1");
    }

    #[test]
    fn test_empty_input() {
        assert!(read_all(Vec::new()).is_empty());
    }

    #[test]
    fn test_gzip_input_detected_by_content() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b">gz1\nACGTACGT\n").unwrap();
        let compressed = encoder.finish().unwrap();

        // No .gz extension: detection is by magic bytes
        let mut temp = NamedTempFile::with_suffix(".fa").unwrap();
        temp.write_all(&compressed).unwrap();
        temp.flush().unwrap();

        let records: Vec<_> = FastaRecords::open(temp.path())
            .unwrap()
            .collect::<io::Result<Vec<_>>>()
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "gz1");
        assert_eq!(records[0].sequence, b"ACGTACGT".to_vec());
    }

    #[test]
    fn test_reopen_restarts_stream() {
        let mut temp = NamedTempFile::with_suffix(".fa").unwrap();
        temp.write_all(b">a\nAC\n>b\nGT\n").unwrap();
        temp.flush().unwrap();

        let first: Vec<_> = FastaRecords::open(temp.path()).unwrap().collect();
        let second: Vec<_> = FastaRecords::open(temp.path()).unwrap().collect();
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 2);
    }
}
