use std::path::PathBuf;

use thiserror::Error;

/// Failure to build a [`crate::SymbolTable`]. Fatal for a run.
#[derive(Error, Debug)]
pub enum TableLoadError {
    #[error("cannot read symbol table{}: {source}", display_path(.path))]
    Unreadable {
        path: Option<PathBuf>,
        #[source]
        source: std::io::Error,
    },

    #[error("symbol table contains no valid KEY:VALUE entries")]
    Empty,
}

fn display_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => format!(" {}", p.display()),
        None => String::new(),
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    TableLoad(#[from] TableLoadError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unknown text encoding: {0}")]
    UnknownEncoding(String),

    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("cannot read glob entry: {0}")]
    Glob(#[from] glob::GlobError),

    #[error("output {0} would overwrite its own input")]
    OutputConflict(PathBuf),

    #[error("cannot replace output file: {0}")]
    Persist(#[from] tempfile::PersistError),
}

pub type Result<T> = std::result::Result<T, Error>;
