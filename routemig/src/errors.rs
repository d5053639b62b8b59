use std::path::PathBuf;

use routemig_scan::ParseError;
use thiserror::Error;

use crate::tooling::MigrationStep;

/// Errors produced by a pipeline run.
#[derive(Debug, Error)]
pub enum MigratorError {
    /// A route file could not be parsed.
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    /// An external migration command exited unsuccessfully.
    #[error("{step} failed ({}){}", exit_description(*exit_code), stderr_suffix(stderr))]
    ExternalTool {
        step: MigrationStep,
        /// `None` when the process was terminated by a signal.
        exit_code: Option<i32>,
        stderr: String,
    },

    /// An external migration command could not be started.
    #[error("could not start {step}: {source}")]
    ToolLaunch {
        step: MigrationStep,
        #[source]
        source: std::io::Error,
    },

    /// A file the toolchain should have produced does not exist.
    #[error("expected artifact not found: {}", path.display())]
    MissingArtifact { path: PathBuf },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    /// The file watcher reported an error.
    #[error("watch error: {0}")]
    Watch(#[from] notify_debouncer_full::notify::Error),
}

impl MigratorError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

fn exit_description(exit_code: Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {trimmed}")
    }
}

pub type Result<T, E = MigratorError> = std::result::Result<T, E>;
