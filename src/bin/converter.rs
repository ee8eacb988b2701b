use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use morse::merge::{merge_tables, table_files};
use morse::text::encoding_for_label;
use morse::SymbolTable;
use regex::Regex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Merges a directory of code tables into one canonical UTF-8 table.
#[derive(Parser)]
#[command(name = "converter")]
#[command(version)]
struct Cli {
    /// Directory holding the table files
    input_dir: PathBuf,

    /// Canonical table to write
    output: PathBuf,

    /// File name pattern inside the input directory
    #[arg(long, default_value = "*.txt")]
    pattern: String,

    /// Text encoding of the input tables
    #[arg(long, default_value = "utf-8")]
    encoding: String,

    /// Keep only keys matching this regular expression
    #[arg(long)]
    keys: Option<Regex>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "converter=info,morse=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    let cli = Cli::parse();
    let encoding = encoding_for_label(&cli.encoding)?;

    println!("Processing table files from {}...", cli.input_dir.display());
    let paths = table_files(&cli.input_dir, &cli.pattern).context("Failed to read glob pattern")?;
    for path in &paths {
        println!("Processing {}...", path.display());
    }

    let merged = merge_tables(&paths, encoding, cli.keys.as_ref()).with_context(|| {
        format!(
            "No definitions found in {}",
            cli.input_dir.join(&cli.pattern).display()
        )
    })?;
    let table = &merged.table;
    let report = table.report();
    println!(
        "Merged {} definitions from {} files into {} symbols",
        report.definitions,
        merged.files.len(),
        table.len()
    );
    if merged.filtered > 0 {
        println!("Filtered out {} definitions by key", merged.filtered);
    }
    if report.skipped > 0 {
        println!("Skipped {} malformed lines", report.skipped);
    }
    if !report.is_clean() {
        println!(
            "Table defects: {} redefined keys, {} code collisions, {} undecodable codes",
            report.redefined.len(),
            report.collisions.len(),
            report.unsafe_codes.len()
        );
    }

    write_table(&cli.output, table)
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;
    println!("Wrote {}", cli.output.display());

    println!("Conversion complete!");
    Ok(())
}

fn write_table(path: &Path, table: &SymbolTable) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "# {} symbols", table.len())?;
    table.write_definitions(&mut writer)?;
    writer.flush()
}
