//! Error types for the grid splitter.

use std::path::PathBuf;

/// Top-level error type for a splitting session.
#[derive(Debug, thiserror::Error)]
pub enum SplitError {
    /// Invalid grid, crop or config values.
    #[error("config error: {0}")]
    Config(String),

    /// The source image could not be read or decoded.
    #[error("cannot decode {}: {source}", path.display())]
    Decode {
        /// Path of the source image.
        path: PathBuf,
        /// Underlying decoder error.
        #[source]
        source: image::ImageError,
    },

    /// A required input directory, file or selection is missing.
    #[error("missing input: {0}")]
    MissingInput(String),

    /// Persisting an artifact failed part way through a batch.
    ///
    /// `written` artifacts from earlier cells remain on disk.
    #[error(
        "failed to write {} ({written} file(s) already written remain on disk): {source}",
        path.display()
    )]
    Write {
        /// Artifact or directory that could not be written.
        path: PathBuf,
        /// Number of artifacts written before the failure.
        written: usize,
        /// Underlying encoder or I/O error.
        #[source]
        source: image::ImageError,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SplitError {
    /// Process exit code for this error.
    ///
    /// Missing input exits with `1`; every other failure with `2`.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MissingInput(_) => 1,
            _ => 2,
        }
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, SplitError>;
