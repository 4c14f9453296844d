//! Catalog snapshot loading
//!
//! The catalog store exports either a JSON array of records or JSON Lines
//! (one record per line). Both are read through a memory map so a large
//! export is parsed without an intermediate copy.

use crate::catalog::types::CatalogRecord;
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while reading a catalog snapshot
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Catalog is empty")]
    Empty,

    #[error("Invalid catalog JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid catalog record on line {line}: {source}")]
    Line {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Load and normalize a full catalog snapshot from disk
pub fn load_catalog(path: &Path) -> Result<Vec<CatalogRecord>, CatalogError> {
    let io_err = |source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(io_err)?;
    let len = file.metadata().map_err(io_err)?.len();
    if len == 0 {
        return Err(CatalogError::Empty);
    }

    let mmap = unsafe { Mmap::map(&file) }.map_err(io_err)?;
    parse_catalog(&mmap)
}

/// Parse a catalog snapshot from raw bytes
pub fn parse_catalog(bytes: &[u8]) -> Result<Vec<CatalogRecord>, CatalogError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let body = bytes.trim_ascii();

    if body.is_empty() {
        return Err(CatalogError::Empty);
    }

    let mut records: Vec<CatalogRecord> = if body[0] == b'[' {
        serde_json::from_slice(body)?
    } else {
        parse_json_lines(body)?
    };

    for record in &mut records {
        record.normalize();
    }

    Ok(records)
}

fn parse_json_lines(body: &[u8]) -> Result<Vec<CatalogRecord>, CatalogError> {
    let mut records = Vec::new();

    for (idx, line) in body.split(|&b| b == b'\n').enumerate() {
        let line = line.trim_ascii();
        if line.is_empty() {
            continue;
        }
        let record = serde_json::from_slice(line).map_err(|source| CatalogError::Line {
            line: idx + 1,
            source,
        })?;
        records.push(record);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_array() {
        let json = br#"[{"name": "Pizza Hut", "cuisines": "Pizza, Fast Food", "rate": "3.6/5"},
                        {"name": "KFC"}]"#;
        let records = parse_catalog(json).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].rate_num, 3.6);
        assert_eq!(records[1].cuisines, "");
    }

    #[test]
    fn test_parse_json_lines() {
        let body = b"{\"name\": \"Onesta\", \"votes\": \"2,556\"}\n\n{\"name\": \"Empire\"}\n";
        let records = parse_catalog(body).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].votes_num, 2556);
        assert_eq!(records[1].name, "Empire");
    }

    #[test]
    fn test_json_lines_error_reports_line() {
        let body = b"{\"name\": \"Onesta\"}\n{oops}\n";
        match parse_catalog(body) {
            Err(CatalogError::Line { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(parse_catalog(b"  \n "), Err(CatalogError::Empty)));
        assert!(matches!(parse_catalog(b"\xEF\xBB\xBF"), Err(CatalogError::Empty)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"[{{"id": "1", "name": "Cafe Coffee Day", "cuisines": "Cafe, Coffee"}}]"#)
            .unwrap();

        let records = load_catalog(file.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id.as_deref(), Some("1"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_catalog(Path::new("/nonexistent/savor/catalog.json")).unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/savor/catalog.json"));
    }

    #[test]
    fn test_load_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(matches!(load_catalog(file.path()), Err(CatalogError::Empty)));
    }
}
