//! Merging several table files into one table.

use std::fs;
use std::path::{Path, PathBuf};

use encoding_rs::Encoding;
use glob::glob;
use regex::Regex;

use crate::error::{Result, TableLoadError};
use crate::table::{parse_line, DefinitionLine, SymbolTable, TableBuilder};
use crate::text::decode_bytes;

#[derive(Debug)]
pub struct MergeOutcome {
    pub table: SymbolTable,
    /// Files read, in merge order.
    pub files: Vec<PathBuf>,
    /// Definitions left out by the key filter.
    pub filtered: usize,
}

/// Table files in `dir` matching `pattern`, sorted by path.
pub fn table_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let pattern = dir.join(pattern);
    let mut paths = Vec::new();
    for entry in glob(&pattern.to_string_lossy())? {
        match entry {
            Ok(path) if path.is_file() => paths.push(path),
            Ok(_) => {}
            Err(e) => tracing::warn!("Error reading glob entry: {}", e),
        }
    }
    paths.sort();
    Ok(paths)
}

/// Loads `paths` in order into one table, so a key defined in a later file
/// overrides the same key from an earlier one. With `keys`, only definitions
/// whose key matches are kept.
pub fn merge_tables(
    paths: &[PathBuf],
    encoding: &'static Encoding,
    keys: Option<&Regex>,
) -> Result<MergeOutcome> {
    let mut builder = TableBuilder::new();
    let mut filtered = 0usize;

    for path in paths {
        let buffer = fs::read(path).map_err(|source| TableLoadError::Unreadable {
            path: Some(path.clone()),
            source,
        })?;
        let decoded = decode_bytes(&buffer, encoding);

        for line in decoded.lines() {
            if let (DefinitionLine::Entry { key, .. }, Some(keys)) = (parse_line(line), keys) {
                if !keys.is_match(key.encode_utf8(&mut [0u8; 4])) {
                    filtered += 1;
                    continue;
                }
            }
            builder.push_line(line);
        }
        tracing::debug!("merged {}", path.display());
    }

    Ok(MergeOutcome {
        table: builder.build()?,
        files: paths.to_vec(),
        filtered,
    })
}
