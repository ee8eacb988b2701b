pub mod config;
pub mod error;
pub mod merge;
pub mod naming;
pub mod pipeline;
pub mod table;
pub mod text;
pub mod transcode;

pub use config::RunConfig;
pub use error::{Error, Result, TableLoadError};
pub use naming::output_path;
pub use pipeline::{log_stats, transcode_file, transcode_file_to, transcode_stream, RunStats};
pub use table::{LoadReport, SymbolTable, TableBuilder};
pub use transcode::{decode, encode, MissPolicy, Mode, Transcoder};
