use std::collections::HashMap;
use std::fs;
use std::io::{BufRead, Write};
use std::path::Path;
use std::str::FromStr;

use encoding_rs::Encoding;

use crate::error::TableLoadError;
use crate::text::decode_bytes;
use crate::transcode::{PLACEHOLDER, WORD_SEPARATOR_SYMBOL};

const COMMENT_PREFIX: char = '#';
const KEY_VALUE_DELIMITER: char = ':';

/// One line of a table definition source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionLine<'a> {
    Blank,
    Comment,
    Entry { key: char, code: &'a str },
    Malformed,
}

/// Classifies a definition line. The key is returned already normalized.
pub fn parse_line(line: &str) -> DefinitionLine<'_> {
    let line = line.trim();
    if line.is_empty() {
        return DefinitionLine::Blank;
    }
    if line.starts_with(COMMENT_PREFIX) {
        return DefinitionLine::Comment;
    }

    let Some((key, code)) = line.split_once(KEY_VALUE_DELIMITER) else {
        return DefinitionLine::Malformed;
    };
    let code = code.trim();
    let mut key_chars = key.trim().chars();
    match (key_chars.next(), key_chars.next()) {
        (Some(key), None) if !code.is_empty() => DefinitionLine::Entry {
            key: normalize(key),
            code,
        },
        _ => DefinitionLine::Malformed,
    }
}

/// Uppercases `ch` when its uppercase form is a single character.
pub fn normalize(ch: char) -> char {
    let mut upper = ch.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(u), None) => u,
        _ => ch,
    }
}

/// Two characters defined with the same code-word. Only `replacement` is
/// reachable by reverse lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub code: String,
    pub previous: char,
    pub replacement: char,
}

/// What happened while a table was being built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Definition lines accepted, duplicates included.
    pub definitions: usize,
    /// Malformed lines that were skipped.
    pub skipped: usize,
    /// Keys defined more than once; the last definition won.
    pub redefined: Vec<char>,
    pub collisions: Vec<Collision>,
    /// Code-words containing whitespace or the word separator, or equal to
    /// the miss placeholder. They are kept, but encoded text containing them
    /// cannot be decoded back faithfully.
    pub unsafe_codes: Vec<(char, String)>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.redefined.is_empty() && self.collisions.is_empty() && self.unsafe_codes.is_empty()
    }
}

/// Accumulates definitions one line at a time.
#[derive(Debug, Default)]
pub struct TableBuilder {
    forward: HashMap<char, String>,
    reverse: HashMap<String, char>,
    report: LoadReport,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_line(&mut self, line: &str) {
        match parse_line(line) {
            DefinitionLine::Entry { key, code } => self.insert(key, code),
            DefinitionLine::Malformed => self.report.skipped += 1,
            DefinitionLine::Blank | DefinitionLine::Comment => {}
        }
    }

    pub fn push_str(&mut self, source: &str) {
        for line in source.lines() {
            self.push_line(line);
        }
    }

    /// Inserts a definition, last write wins in both directions.
    pub fn insert(&mut self, key: char, code: &str) {
        let key = normalize(key);
        self.report.definitions += 1;

        if self.forward.insert(key, code.to_string()).is_some() {
            self.report.redefined.push(key);
        }
        if let Some(previous) = self.reverse.insert(code.to_string(), key) {
            if previous != key {
                self.report.collisions.push(Collision {
                    code: code.to_string(),
                    previous,
                    replacement: key,
                });
            }
        }
        // a placeholder code would turn misses into real characters on decode
        let breaks_tokens = code
            .chars()
            .any(|c| c.is_whitespace() || c == WORD_SEPARATOR_SYMBOL);
        if breaks_tokens || code == PLACEHOLDER {
            self.report.unsafe_codes.push((key, code.to_string()));
        }
    }

    pub fn build(self) -> Result<SymbolTable, TableLoadError> {
        if self.forward.is_empty() {
            return Err(TableLoadError::Empty);
        }

        let report = self.report;
        tracing::debug!(
            "loaded {} symbols from {} definitions, {} lines skipped",
            self.forward.len(),
            report.definitions,
            report.skipped
        );
        for key in &report.redefined {
            tracing::debug!("key {:?} redefined, keeping the last definition", key);
        }
        for c in &report.collisions {
            tracing::warn!(
                "code {:?} maps to both {:?} and {:?}; decoding yields {:?}",
                c.code,
                c.previous,
                c.replacement,
                c.replacement
            );
        }
        for (key, code) in &report.unsafe_codes {
            tracing::warn!("code {:?} for {:?} cannot be decoded from encoded text", code, key);
        }

        Ok(SymbolTable {
            forward: self.forward,
            reverse: self.reverse,
            report,
        })
    }
}

/// Bidirectional character/code-word mapping. Immutable once built.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    forward: HashMap<char, String>,
    reverse: HashMap<String, char>,
    report: LoadReport,
}

impl SymbolTable {
    /// Reads definitions line by line from `reader`.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, TableLoadError> {
        let mut builder = TableBuilder::new();
        for line in reader.lines() {
            let line = line.map_err(|source| TableLoadError::Unreadable { path: None, source })?;
            builder.push_line(&line);
        }
        builder.build()
    }

    /// Loads a table file written in `encoding`.
    pub fn load(path: &Path, encoding: &'static Encoding) -> Result<Self, TableLoadError> {
        let bytes = fs::read(path).map_err(|source| TableLoadError::Unreadable {
            path: Some(path.to_path_buf()),
            source,
        })?;
        decode_bytes(&bytes, encoding).parse()
    }

    pub fn lookup(&self, ch: char) -> Option<&str> {
        self.forward.get(&normalize(ch)).map(String::as_str)
    }

    pub fn reverse_lookup(&self, code: &str) -> Option<char> {
        self.reverse.get(code).copied()
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    /// All `(character, code-word)` pairs ordered by character.
    pub fn entries(&self) -> Vec<(char, &str)> {
        let mut entries: Vec<_> = self
            .forward
            .iter()
            .map(|(&key, code)| (key, code.as_str()))
            .collect();
        entries.sort_by_key(|&(key, _)| key);
        entries
    }

    /// Writes the table as canonical `KEY:VALUE` lines ordered by key.
    pub fn write_definitions<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for (key, code) in self.entries() {
            writeln!(writer, "{}{}{}", key, KEY_VALUE_DELIMITER, code)?;
        }
        Ok(())
    }
}

impl FromStr for SymbolTable {
    type Err = TableLoadError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        let mut builder = TableBuilder::new();
        builder.push_str(source);
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABC: &str = "A:.-\nB:-...\nC:-.-.\n";

    #[test]
    fn test_parse_line_kinds() {
        assert_eq!(parse_line(""), DefinitionLine::Blank);
        assert_eq!(parse_line("   \t"), DefinitionLine::Blank);
        assert_eq!(parse_line("# letters"), DefinitionLine::Comment);
        assert_eq!(parse_line("  #A:.-"), DefinitionLine::Comment);
        assert_eq!(parse_line("A .-"), DefinitionLine::Malformed);
        assert_eq!(parse_line(":.-"), DefinitionLine::Malformed);
        assert_eq!(parse_line("A:   "), DefinitionLine::Malformed);
        assert_eq!(parse_line("AB:.-"), DefinitionLine::Malformed);
        assert_eq!(
            parse_line("  a :  .-  "),
            DefinitionLine::Entry { key: 'A', code: ".-" }
        );
    }

    #[test]
    fn test_value_keeps_later_colons() {
        assert_eq!(
            parse_line("X:-..-:"),
            DefinitionLine::Entry { key: 'X', code: "-..-:" }
        );
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize('a'), 'A');
        assert_eq!(normalize('é'), 'É');
        assert_eq!(normalize('7'), '7');
        // uppercases to "SS", so it stays as-is
        assert_eq!(normalize('ß'), 'ß');
    }

    #[test]
    fn test_load_and_lookup() {
        let table: SymbolTable = ABC.parse().unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.lookup('A'), Some(".-"));
        assert_eq!(table.lookup('b'), Some("-..."));
        assert_eq!(table.lookup('Z'), None);
        assert_eq!(table.reverse_lookup("-.-."), Some('C'));
        assert_eq!(table.reverse_lookup("---"), None);
        assert!(table.report().is_clean());
    }

    #[test]
    fn test_lookups_are_inverse() {
        let table: SymbolTable = "A:.-\nB:-...\nE:.\nT:-\n5:.....".parse().unwrap();
        for (key, code) in table.entries() {
            assert_eq!(table.reverse_lookup(code), Some(key));
            assert_eq!(table.lookup(key), Some(code));
        }
    }

    #[test]
    fn test_key_is_case_folded_value_is_verbatim() {
        let table: SymbolTable = "q:--.-\nw:.--\n".parse().unwrap();
        assert_eq!(table.lookup('Q'), Some("--.-"));
        assert_eq!(table.reverse_lookup("--.-"), Some('Q'));
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let source = "# header\n\nA:.-\ngarbage\n:--\nB:\nB:-...\n";
        let table: SymbolTable = source.parse().unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.report().skipped, 3);
        assert_eq!(table.report().definitions, 2);
    }

    #[test]
    fn test_only_comments_and_blanks_is_empty() {
        let err = "# nothing here\n\n   \n# still nothing\n"
            .parse::<SymbolTable>()
            .unwrap_err();
        assert!(matches!(err, TableLoadError::Empty));
    }

    #[test]
    fn test_no_valid_entries_is_empty() {
        let err = "A=.-\nB -...\n".parse::<SymbolTable>().unwrap_err();
        assert!(matches!(err, TableLoadError::Empty));
        assert!(matches!("".parse::<SymbolTable>(), Err(TableLoadError::Empty)));
    }

    #[test]
    fn test_duplicate_key_last_wins() {
        let table: SymbolTable = "A:.-\na:.-.-\n".parse().unwrap();
        assert_eq!(table.lookup('A'), Some(".-.-"));
        assert_eq!(table.reverse_lookup(".-.-"), Some('A'));
        assert_eq!(table.report().redefined, vec!['A']);
        // the earlier code still decodes to the key
        assert_eq!(table.reverse_lookup(".-"), Some('A'));
    }

    #[test]
    fn test_reverse_collision_keeps_latest() {
        let table: SymbolTable = "A:.-\nB:.-\n".parse().unwrap();
        assert_eq!(table.lookup('A'), Some(".-"));
        assert_eq!(table.lookup('B'), Some(".-"));
        assert_eq!(table.reverse_lookup(".-"), Some('B'));
        assert_eq!(
            table.report().collisions,
            vec![Collision {
                code: ".-".to_string(),
                previous: 'A',
                replacement: 'B',
            }]
        );
    }

    #[test]
    fn test_unsafe_codes_are_reported() {
        let table: SymbolTable = "A:. -\nB:-/.\nC:-.-.\n".parse().unwrap();
        assert_eq!(
            table.report().unsafe_codes,
            vec![('A', ". -".to_string()), ('B', "-/.".to_string())]
        );
        assert_eq!(table.lookup('A'), Some(". -"));
    }

    #[test]
    fn test_placeholder_code_is_reported() {
        let table: SymbolTable = "Q:?\nA:.-\nB:.?.\n".parse().unwrap();
        assert_eq!(table.report().unsafe_codes, vec![('Q', "?".to_string())]);
        assert_eq!(table.reverse_lookup("?"), Some('Q'));
    }

    #[test]
    fn test_from_reader() {
        let table = SymbolTable::from_reader(std::io::Cursor::new(ABC)).unwrap();
        assert_eq!(table.lookup('C'), Some("-.-."));
    }

    #[test]
    fn test_from_reader_invalid_utf8_is_unreadable() {
        let bytes: &[u8] = b"A:.-\n\xFF\xFE:--\n";
        let err = SymbolTable::from_reader(bytes).unwrap_err();
        assert!(matches!(err, TableLoadError::Unreadable { path: None, .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let path = Path::new("/definitely/not/here/codes.txt");
        let err = SymbolTable::load(path, encoding_rs::UTF_8).unwrap_err();
        match err {
            TableLoadError::Unreadable { path: Some(p), .. } => {
                assert_eq!(p, Path::new("/definitely/not/here/codes.txt"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_canonical_output_reloads() {
        let source = "# mixed\nc:-.-.\n\nA : .-\nb:-...\n";
        let table: SymbolTable = source.parse().unwrap();

        let mut out = Vec::new();
        table.write_definitions(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "A:.-\nB:-...\nC:-.-.\n");

        let reloaded: SymbolTable = text.parse().unwrap();
        assert_eq!(reloaded.entries(), table.entries());
    }
}
