//! The crate's error kinds (spec §7) and the exit-code mapping for `main`.

use std::path::PathBuf;

/// Everything that can go wrong, grouped the way spec.md §7 groups them.
#[derive(Debug, thiserror::Error)]
pub enum RefinerError {
    /// Missing config file, missing external executable. Fatal at startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed threshold expression, unknown clusterer, missing
    /// required parameter for the chosen clusterer. Fatal before any work.
    #[error("invalid input: {0}")]
    InputValidation(String),

    /// Unreadable input graph, unwritable working directory.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Non-zero exit or missing output file from a clusterer subprocess.
    /// (The cut oracle degrades instead of erroring; see `oracle.rs`.)
    #[error("external tool failed: {0}")]
    ExternalTool(String),

    /// Hydrator size mismatch, empty suffix, duplicate index. Indicates a
    /// bug rather than bad input; `main` debug-asserts on this variant,
    /// so it panics under a debug build and exits non-zero in release.
    #[error("internal invariant violated: {0}")]
    Internal(String),
}

impl RefinerError {
    /// Maps an error to the process exit code described in spec.md §6.
    pub fn exit_code(&self) -> i32 {
        match self {
            RefinerError::Config(_) => 2,
            RefinerError::InputValidation(_) => 3,
            RefinerError::Io { .. } => 4,
            RefinerError::ExternalTool(_) => 5,
            RefinerError::Internal(_) => 70,
        }
    }
}

pub type Result<T> = std::result::Result<T, RefinerError>;
