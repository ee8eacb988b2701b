//! Line transcoding between plaintext and code-words.
//!
//! Encoded text separates the code-words of one word with a single space and
//! separates words with [`WORD_SEPARATOR`]. Decoding also accepts a bare `/`
//! with any amount of surrounding whitespace, but encoding always emits the
//! canonical form.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::table::SymbolTable;

pub const WORD_SEPARATOR: &str = " / ";
pub const WORD_SEPARATOR_SYMBOL: char = '/';
pub const LETTER_SEPARATOR: &str = " ";
pub const PLACEHOLDER: &str = "?";

static WORD_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*/\s*").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Encode,
    Decode,
}

/// What to emit for a character or code-word missing from the table.
/// One policy covers both directions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissPolicy {
    /// Emit [`PLACEHOLDER`].
    #[default]
    Placeholder,
    /// Emit nothing.
    Drop,
}

/// A transcoded line plus how many lookups missed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcoded {
    pub text: String,
    pub misses: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct Transcoder<'a> {
    table: &'a SymbolTable,
    policy: MissPolicy,
}

impl<'a> Transcoder<'a> {
    pub fn new(table: &'a SymbolTable, policy: MissPolicy) -> Self {
        Self { table, policy }
    }

    pub fn policy(&self) -> MissPolicy {
        self.policy
    }

    pub fn transcode(&self, mode: Mode, line: &str) -> Transcoded {
        match mode {
            Mode::Encode => self.encode_counted(line),
            Mode::Decode => self.decode_counted(line),
        }
    }

    pub fn encode(&self, line: &str) -> String {
        self.encode_counted(line).text
    }

    pub fn decode(&self, line: &str) -> String {
        self.decode_counted(line).text
    }

    pub fn encode_counted(&self, line: &str) -> Transcoded {
        let mut misses = 0;
        let mut words = Vec::new();

        for word in line.split_whitespace() {
            let mut codes = Vec::with_capacity(word.len());
            for ch in word.chars() {
                match self.table.lookup(ch) {
                    Some(code) => codes.push(code),
                    None => {
                        misses += 1;
                        if self.policy == MissPolicy::Placeholder {
                            codes.push(PLACEHOLDER);
                        }
                    }
                }
            }
            // drop policy: a word with nothing left would leave a dangling separator
            if !codes.is_empty() {
                words.push(codes.join(LETTER_SEPARATOR));
            }
        }

        Transcoded {
            text: words.join(WORD_SEPARATOR),
            misses,
        }
    }

    pub fn decode_counted(&self, line: &str) -> Transcoded {
        let mut misses = 0;
        let mut words = Vec::new();

        for segment in WORD_SPLIT.split(line.trim()) {
            let mut word = String::new();
            for code in segment.split_whitespace() {
                match self.table.reverse_lookup(code) {
                    Some(ch) => word.push(ch),
                    None => {
                        misses += 1;
                        if self.policy == MissPolicy::Placeholder {
                            word.push_str(PLACEHOLDER);
                        }
                    }
                }
            }
            if !word.is_empty() {
                words.push(word);
            }
        }

        Transcoded {
            text: words.join(" "),
            misses,
        }
    }
}

/// Encodes with the default miss policy.
pub fn encode(line: &str, table: &SymbolTable) -> String {
    Transcoder::new(table, MissPolicy::default()).encode(line)
}

/// Decodes with the default miss policy.
pub fn decode(line: &str, table: &SymbolTable) -> String {
    Transcoder::new(table, MissPolicy::default()).decode(line)
}
