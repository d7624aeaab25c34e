//! Error types for the compiler.
//!
//! Fatal conditions only. Everything recoverable is a [`crate::diagnostics::Diagnostic`].

use std::path::PathBuf;
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// REGISTRY ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Resolution data was requested before `finalize()` ran. Caller sequencing bug.
    #[error("internal invariant violated: class '{0}' queried before registry finalize")]
    NotFinalized(String),

    #[error("registry is already finalized; cannot {0}")]
    AlreadyFinalized(&'static str),

    #[error("unknown class '{0}'")]
    UnknownClass(String),
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPILE ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("{unit}: failed to parse fragment: {message}")]
    Parse { unit: String, message: String },

    #[error("{unit}: class '{class}' has no usable body")]
    EmptyClass { unit: String, class: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

// ═══════════════════════════════════════════════════════════════════════════════
// PIPELINE ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "output root {} exists but was not produced by {generator}; refusing to overwrite",
        root.display()
    )]
    StampMismatch { root: PathBuf, generator: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }
}
