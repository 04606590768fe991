//! Centralized path and label helpers.

use std::ffi::OsStr;
use std::path::Path;

/// FASTA extensions recognised in a reference directory
const FASTA_EXTENSIONS: [&str; 3] = ["fa", "fasta", "fna"];

/// Compression suffixes that may follow a FASTA extension
const COMPRESSED_EXTENSIONS: [&str; 2] = ["gz", "bgz"];

/// Accession prefixes of GenBank and RefSeq assemblies
const ACCESSION_PREFIXES: [&str; 2] = ["GCA_", "GCF_"];

fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(OsStr::to_str)
        .map(str::to_lowercase)
}

/// Check if the path has a FASTA extension, optionally followed by `.gz`/`.bgz`.
///
/// # Examples
///
/// ```
/// use kmer_screen::utils::validation::is_fasta_file;
/// use std::path::Path;
///
/// assert!(is_fasta_file(Path::new("GCA_000001405.29.fna.gz")));
/// assert!(!is_fasta_file(Path::new("taxid.map")));
/// ```
#[must_use]
pub fn is_fasta_file(path: &Path) -> bool {
    let Some(ext) = lowercase_extension(path) else {
        return false;
    };
    if COMPRESSED_EXTENSIONS.contains(&ext.as_str()) {
        return path
            .file_stem()
            .map(Path::new)
            .and_then(lowercase_extension)
            .is_some_and(|inner| FASTA_EXTENSIONS.contains(&inner.as_str()));
    }
    FASTA_EXTENSIONS.contains(&ext.as_str())
}

/// File name with any compression and FASTA extensions removed.
///
/// `refs/GCA_000864765.1_ViralProj15476_genomic.fna.gz` becomes
/// `GCA_000864765.1_ViralProj15476_genomic`.
#[must_use]
pub fn reference_name(path: &Path) -> String {
    let mut current = Path::new(path.file_name().unwrap_or(path.as_os_str()));

    if lowercase_extension(current).is_some_and(|e| COMPRESSED_EXTENSIONS.contains(&e.as_str())) {
        if let Some(stem) = current.file_stem() {
            current = Path::new(stem);
        }
    }
    if lowercase_extension(current).is_some_and(|e| FASTA_EXTENSIONS.contains(&e.as_str())) {
        if let Some(stem) = current.file_stem() {
            current = Path::new(stem);
        }
    }

    current.to_string_lossy().to_string()
}

/// Find the first `GCA_`/`GCF_` assembly accession in `text`.
///
/// An accession is the prefix, one or more digits, and an optional
/// `.version` suffix of digits.
///
/// # Examples
///
/// ```
/// use kmer_screen::utils::validation::extract_accession;
///
/// assert_eq!(
///     extract_accession("GCA_000864765.1_ViralProj15476_genomic"),
///     Some("GCA_000864765.1".to_string())
/// );
/// assert_eq!(extract_accession("NC_001802.1 HIV-1"), None);
/// ```
#[must_use]
pub fn extract_accession(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    let mut search_from = 0;

    while search_from < bytes.len() {
        let start = ACCESSION_PREFIXES
            .iter()
            .filter_map(|prefix| text[search_from..].find(prefix).map(|i| i + search_from))
            .min()?;

        let digits_start = start + 4;
        let digits_end = scan_digits(bytes, digits_start);
        if digits_end > digits_start {
            let mut end = digits_end;
            if bytes.get(end) == Some(&b'.') {
                let version_end = scan_digits(bytes, end + 1);
                if version_end > end + 1 {
                    end = version_end;
                }
            }
            return Some(text[start..end].to_string());
        }
        search_from = start + 4;
    }

    None
}

fn scan_digits(bytes: &[u8], from: usize) -> usize {
    let mut end = from;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    end
}
