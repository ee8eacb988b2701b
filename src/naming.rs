use std::path::{Path, PathBuf};

use glob::glob;

use crate::error::{Error, Result};
use crate::transcode::Mode;

pub const PLAIN_EXTENSION: &str = "txt";
pub const ENCODED_EXTENSION: &str = "mor";

/// Derives the output file for `input`: `message.txt` encodes to `message.mor`
/// and `message.mor` decodes to `message.txt`. Any other name gets the target
/// extension appended.
pub fn output_path(input: &Path, mode: Mode) -> PathBuf {
    let (from, to) = match mode {
        Mode::Encode => (PLAIN_EXTENSION, ENCODED_EXTENSION),
        Mode::Decode => (ENCODED_EXTENSION, PLAIN_EXTENSION),
    };

    let has_source_ext = input
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(from));

    if has_source_ext {
        input.with_extension(to)
    } else {
        let mut name = input.as_os_str().to_owned();
        name.push(".");
        name.push(to);
        PathBuf::from(name)
    }
}

/// Expands message arguments. An argument naming an existing file is taken
/// as-is; anything else is treated as a glob pattern that must match.
pub fn expand_inputs<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();
    for pattern in patterns {
        let pattern = pattern.as_ref();
        if Path::new(pattern).is_file() {
            inputs.push(PathBuf::from(pattern));
            continue;
        }

        let before = inputs.len();
        for entry in glob(pattern)? {
            let path = entry?;
            if path.is_file() {
                inputs.push(path);
            }
        }
        if inputs.len() == before {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no message file matches {}", pattern),
            )));
        }
    }
    Ok(inputs)
}
