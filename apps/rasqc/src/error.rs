//! Error taxonomy shared across the crate.
//!
//! Only configuration problems are allowed to stop a run, and they are all
//! detected while the registry and schema are being built. Everything that
//! happens while checkers execute is reported through results instead.

use std::path::PathBuf;
use thiserror::Error;

/// Startup-time configuration failures. Fatal before any checker runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown check suite '{name}' (known suites: {known})")]
    UnknownSuite { name: String, known: String },

    #[error("checker '{checker}' depends on '{dependency}', which is not registered before it in suite '{suite}'")]
    UnknownDependency {
        checker: String,
        dependency: String,
        suite: String,
    },

    #[error("checker '{checker}' is registered twice in suite '{suite}'")]
    DuplicateChecker { checker: String, suite: String },

    #[error("convention schema has no property '{property}' (required by checker '{checker}')")]
    MissingSchemaProperty { property: String, checker: String },

    #[error("convention schema property '{property}' has an invalid pattern: {source}")]
    InvalidPattern {
        property: String,
        #[source]
        source: regex::Error,
    },

    #[error("convention schema example '{example}' does not validate against its own property '{property}'")]
    SchemaSelfTest { property: String, example: String },

    #[error("failed to load convention schema from {origin}: {message}")]
    SchemaLoad { origin: String, message: String },

    #[error("unknown color theme '{0}' (expected nineties|arcade|adams|arctic)")]
    UnknownTheme(String),
}

/// Failures of the model data-access layer.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid STAC item {}: {message}", path.display())]
    InvalidStac { path: PathBuf, message: String },

    #[error("no project file found under {}", .0.display())]
    NoProject(PathBuf),
}

/// Failures while writing reports to disk.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error writing {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("workbook archive error: {0}")]
    Workbook(#[from] zip::result::ZipError),
}

impl ExportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExportError::Io {
            path: path.into(),
            source,
        }
    }
}
