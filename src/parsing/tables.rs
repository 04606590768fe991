//! CSV tables written by a screening run.
//!
//! - **Matching results**: one row per (query, candidate reference) pair with
//!   the raw counts, the query's k-mers and the k-mers it shares with the
//!   reference, each comma-joined.
//! - **Scored output**: the counts plus Jaccard and coverage rounded to four
//!   decimals, one best row per query.
//! - **Final output**: the scored output with a trailing `TaxID` column.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use serde::Deserialize;

use crate::core::error::{Result, ScreenError};
use crate::core::kmer::join_kmers;
use crate::database::store::ReferenceDatabase;
use crate::matching::engine::QueryMatch;
use crate::matching::scoring::MatchRecord;
use crate::parsing::taxid::TaxidMap;

pub const MATCHING_HEADER: [&str; 8] = [
    "Sequence Name",
    "Total Input k-mers",
    "Reference",
    "Matched k-mers",
    "Reference Total k-mers",
    "GCA Name",
    "Query k-mers",
    "Reference k-mers",
];

pub const SCORED_HEADER: [&str; 8] = [
    "Sequence Name",
    "Total Input k-mers",
    "Reference",
    "Matched k-mers",
    "Reference Total k-mers",
    "GCA Name",
    "Jacc",
    "Qcov",
];

pub const TAXID_COLUMN: &str = "TaxID";

/// Format a score the way every table reports it
#[must_use]
pub fn format_score(value: f64) -> String {
    format!("{value:.4}")
}

/// Incremental writer for the matching-results table
pub struct MatchingTableWriter<W: Write> {
    writer: csv::Writer<W>,
    rows: usize,
}

impl MatchingTableWriter<BufWriter<File>> {
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or the header written.
    pub fn create(path: &Path) -> Result<Self> {
        Self::new(BufWriter::new(File::create(path)?))
    }
}

impl<W: Write> MatchingTableWriter<W> {
    /// # Errors
    ///
    /// Returns `ScreenError::Csv` if the header cannot be written.
    pub fn new(inner: W) -> Result<Self> {
        let mut writer = csv::Writer::from_writer(inner);
        writer.write_record(MATCHING_HEADER)?;
        Ok(Self { writer, rows: 0 })
    }

    /// Write one row per candidate reference of `query`
    ///
    /// # Errors
    ///
    /// Returns `ScreenError::Csv` if a row cannot be written.
    pub fn write_query(&mut self, query: &QueryMatch, database: &ReferenceDatabase) -> Result<()> {
        if query.hits.is_empty() {
            return Ok(());
        }

        let query_kmers = join_kmers(query.kmers.iter().map(AsRef::as_ref));
        let total = query.kmers.len().to_string();

        for hit in &query.hits {
            let Some(reference) = database.reference(hit.reference) else {
                continue;
            };
            self.writer.write_record([
                query.name.as_str(),
                total.as_str(),
                reference.id.as_str(),
                hit.matched.len().to_string().as_str(),
                reference.kmer_count.to_string().as_str(),
                reference.accession.as_str(),
                query_kmers.as_str(),
                join_kmers(query.matched_kmers(hit)).as_str(),
            ])?;
            self.rows += 1;
        }
        Ok(())
    }

    /// Rows written so far, excluding the header
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flush and return the underlying writer
    ///
    /// # Errors
    ///
    /// Returns `ScreenError::Io` if flushing fails.
    pub fn finish(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| ScreenError::Io(e.into_error()))
    }
}

/// Columns of the matching-results table needed for scoring
#[derive(Debug, Deserialize)]
struct MatchingRow {
    #[serde(rename = "Sequence Name")]
    sequence_name: String,
    #[serde(rename = "Total Input k-mers")]
    total_input_kmers: usize,
    #[serde(rename = "Reference")]
    reference: String,
    #[serde(rename = "Matched k-mers")]
    matched_kmers: usize,
    #[serde(rename = "Reference Total k-mers")]
    reference_total_kmers: usize,
    #[serde(rename = "GCA Name")]
    gca_name: String,
}

impl From<MatchingRow> for MatchRecord {
    fn from(row: MatchingRow) -> Self {
        MatchRecord::new(
            row.sequence_name,
            row.total_input_kmers,
            row.reference,
            row.matched_kmers,
            row.reference_total_kmers,
            row.gca_name,
        )
    }
}

/// Read a matching-results table back into scored records.
///
/// # Errors
///
/// Returns `ScreenError::InputRead` if a row is missing a column or has a
/// non-numeric count.
pub fn read_matching_table<R: Read>(reader: R) -> Result<Vec<MatchRecord>> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut records = Vec::new();
    for (i, row) in reader.deserialize::<MatchingRow>().enumerate() {
        // Data rows start on line 2
        let row = row.map_err(|e| ScreenError::InputRead(format!("Row {}: {e}", i + 2)))?;
        records.push(row.into());
    }
    Ok(records)
}

/// # Errors
///
/// Returns `ScreenError::InputRead` if the file cannot be opened or parsed.
pub fn read_matching_table_file(path: &Path) -> Result<Vec<MatchRecord>> {
    let file = File::open(path)
        .map_err(|e| ScreenError::InputRead(format!("Cannot open {}: {e}", path.display())))?;
    read_matching_table(file)
}

/// Write scored records, adding a `TaxID` column when `taxids` is given.
///
/// # Errors
///
/// Returns `ScreenError::Csv` if writing fails.
pub fn write_scored_table<W: Write>(
    inner: W,
    records: &[MatchRecord],
    taxids: Option<&TaxidMap>,
) -> Result<()> {
    let mut writer = csv::Writer::from_writer(inner);

    let mut header: Vec<&str> = SCORED_HEADER.to_vec();
    if taxids.is_some() {
        header.push(TAXID_COLUMN);
    }
    writer.write_record(&header)?;

    for record in records {
        let mut row = vec![
            record.query_name.clone(),
            record.query_kmers.to_string(),
            record.reference.clone(),
            record.matched_kmers.to_string(),
            record.reference_kmers.to_string(),
            record.accession.clone(),
            format_score(record.jaccard),
            format_score(record.coverage),
        ];
        if let Some(map) = taxids {
            row.push(map.resolve(&record.accession).to_string());
        }
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}

/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_scored_table_file(
    path: &Path,
    records: &[MatchRecord],
    taxids: Option<&TaxidMap>,
) -> Result<()> {
    write_scored_table(BufWriter::new(File::create(path)?), records, taxids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::BloomConfig;
    use crate::database::builder::DatabaseBuilder;
    use crate::matching::engine::SequenceMatcher;
    use std::io::Cursor;

    fn rows(bytes: &[u8]) -> Vec<Vec<String>> {
        csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(bytes)
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    fn record(query: &str, q: usize, reference: &str, m: usize, r: usize, acc: &str) -> MatchRecord {
        MatchRecord::new(query.to_string(), q, reference.to_string(), m, r, acc.to_string())
    }

    #[test]
    fn test_matching_table_rows() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("GCA_000001.1_r1.fa"), ">r1\nAAAAACCCCC\n").unwrap();
        std::fs::write(dir.path().join("r2.fa"), ">r2\nGGGGGTTTTT\n").unwrap();
        let db = DatabaseBuilder::new(5, BloomConfig::default())
            .unwrap()
            .build(dir.path())
            .unwrap();

        let query = SequenceMatcher::new(&db).match_sequence("q1 desc", b"AAAAACCGGGGG");
        let mut table = MatchingTableWriter::new(Vec::new()).unwrap();
        table.write_query(&query, &db).unwrap();
        assert_eq!(table.rows(), 2);
        let bytes = table.finish().unwrap();

        let rows = rows(&bytes);
        assert_eq!(rows[0], MATCHING_HEADER);
        assert_eq!(
            rows[1][..6],
            ["q1 desc", "8", "GCA_000001.1_r1", "3", "6", "GCA_000001.1"]
        );
        assert_eq!(rows[1][6], "AAAAA,AAAAC,AAACC,AACCG,ACCGG,CCGGG,CGGGG,GGGGG");
        assert_eq!(rows[1][7], "AAAAA,AAAAC,AAACC");
        assert_eq!(rows[2][..6], ["q1 desc", "8", "r2", "1", "6", "r2"]);
        assert_eq!(rows[2][7], "GGGGG");
    }

    #[test]
    fn test_query_without_hits_writes_nothing() {
        let query = QueryMatch {
            name: "none".to_string(),
            kmers: Vec::new(),
            hits: Vec::new(),
        };
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("r.fa"), ">r\nACGTACGT\n").unwrap();
        let db = DatabaseBuilder::new(5, BloomConfig::default())
            .unwrap()
            .build(dir.path())
            .unwrap();

        let mut table = MatchingTableWriter::new(Vec::new()).unwrap();
        table.write_query(&query, &db).unwrap();
        assert_eq!(table.rows(), 0);
        assert_eq!(rows(&table.finish().unwrap()).len(), 1);
    }

    #[test]
    fn test_scored_table_format() {
        let records = vec![
            record("seq1", 150, "reference1", 50, 200, "GCA_000001"),
            record("seq2", 200, "reference3", 100, 300, "GCA_000003"),
        ];
        let mut out = Vec::new();
        write_scored_table(&mut out, &records, None).unwrap();

        let rows = rows(&out);
        assert_eq!(rows[0], SCORED_HEADER);
        assert_eq!(
            rows[1],
            ["seq1", "150", "reference1", "50", "200", "GCA_000001", "0.1667", "0.2500"]
        );
        assert_eq!(
            rows[2],
            ["seq2", "200", "reference3", "100", "300", "GCA_000003", "0.2500", "0.3333"]
        );
    }

    #[test]
    fn test_scored_table_with_taxid() {
        let records = vec![
            record("seq1", 10, "ref1", 10, 10, "GCA_000001.1"),
            record("seq2", 10, "ref2", 10, 10, "GCA_000009.1"),
        ];
        let taxids = TaxidMap::from_reader(Cursor::new("GCA_000001.1\t10239\n")).unwrap();
        let mut out = Vec::new();
        write_scored_table(&mut out, &records, Some(&taxids)).unwrap();

        let rows = rows(&out);
        assert_eq!(rows[0].last().unwrap(), "TaxID");
        assert_eq!(rows[1].last().unwrap(), "10239");
        assert_eq!(rows[2].last().unwrap(), "N/A");
        assert_eq!(rows[1][6], "1.0000");
    }

    #[test]
    fn test_read_matching_table() {
        let text = "\
Sequence Name,Total Input k-mers,Reference,Matched k-mers,Reference Total k-mers,GCA Name,Query k-mers,Reference k-mers
seq1,150,reference1,50,200,GCA_000001,\"AAA,CCC\",AAA
seq1,150,reference2,30,180,GCA_000002,\"AAA,CCC\",CCC
";
        let records = read_matching_table(text.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].query_name, "seq1");
        assert_eq!(records[1].reference_kmers, 180);
        assert_eq!(format_score(records[0].jaccard), "0.1667");
        assert_eq!(format_score(records[1].coverage), "0.1667");
    }

    #[test]
    fn test_read_matching_table_rejects_bad_counts() {
        let text = "\
Sequence Name,Total Input k-mers,Reference,Matched k-mers,Reference Total k-mers,GCA Name
seq1,many,reference1,50,200,GCA_000001
";
        assert!(matches!(
            read_matching_table(text.as_bytes()),
            Err(ScreenError::InputRead(_))
        ));
    }
}
