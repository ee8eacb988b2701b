use std::fs;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::config::RunConfig;
use crate::error::{Error, Result};
use crate::table::SymbolTable;
use crate::text::decode_bytes;
use crate::transcode::{MissPolicy, Mode, Transcoder};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub lines: usize,
    /// Characters or code-words that were not in the table.
    pub misses: usize,
}

/// Transcodes `reader` into `writer`, one output line per input line.
///
/// A read error aborts immediately. A write error is returned after one
/// attempt to flush whatever was already buffered.
pub fn transcode_stream<R: BufRead, W: Write>(
    transcoder: &Transcoder<'_>,
    mode: Mode,
    reader: R,
    writer: W,
) -> Result<RunStats> {
    let mut writer = BufWriter::new(writer);
    let mut stats = RunStats::default();

    for line in reader.lines() {
        let line = line?;
        let out = transcoder.transcode(mode, &line);
        stats.lines += 1;
        stats.misses += out.misses;

        if let Err(e) = writeln!(writer, "{}", out.text) {
            let _ = writer.flush();
            return Err(e.into());
        }
    }

    writer.flush()?;
    Ok(stats)
}

/// Transcodes the file at `input` into `writer`, decoding it with the
/// configured encoding first.
pub fn transcode_file_to<W: Write>(
    table: &SymbolTable,
    config: &RunConfig,
    input: &Path,
    writer: W,
) -> Result<RunStats> {
    let bytes = fs::read(input)?;
    let text = decode_bytes(&bytes, config.encoding);
    let transcoder = Transcoder::new(table, config.policy);

    let stats = transcode_stream(&transcoder, config.mode, text.as_bytes(), writer)?;
    log_stats(&input.display().to_string(), &stats, config.policy);
    Ok(stats)
}

/// Logs a finished run over `source`, warning when lookups missed.
pub fn log_stats(source: &str, stats: &RunStats, policy: MissPolicy) {
    if stats.misses > 0 {
        tracing::warn!(
            "{}: {} symbols not found in table ({:?} policy)",
            source,
            stats.misses,
            policy
        );
    }
    tracing::debug!("{}: {} lines transcoded", source, stats.lines);
}

/// Transcodes `input` into `output`. The output is written to a temporary
/// file next to it and renamed into place only when the whole run succeeded.
pub fn transcode_file(
    table: &SymbolTable,
    config: &RunConfig,
    input: &Path,
    output: &Path,
) -> Result<RunStats> {
    if is_same_file(input, output) {
        return Err(Error::OutputConflict(output.to_path_buf()));
    }

    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let tmp = create_temp_output(dir, output)?;
    let stats = transcode_file_to(table, config, input, tmp.as_file())?;
    tmp.persist(output)?;
    Ok(stats)
}

/// Temporary file that will become `output`. It gets the mode a plain
/// `File::create` would give, or the mode of the output it replaces.
#[cfg(unix)]
fn create_temp_output(dir: &Path, output: &Path) -> Result<NamedTempFile> {
    use std::os::unix::fs::PermissionsExt;

    let existing = fs::metadata(output).ok().map(|m| m.permissions());
    // open(2) masks this with the umask
    let tmp = tempfile::Builder::new()
        .permissions(fs::Permissions::from_mode(0o666))
        .tempfile_in(dir)?;
    if let Some(perms) = existing {
        fs::set_permissions(tmp.path(), perms)?;
    }
    Ok(tmp)
}

#[cfg(not(unix))]
fn create_temp_output(dir: &Path, _output: &Path) -> Result<NamedTempFile> {
    Ok(NamedTempFile::new_in(dir)?)
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
