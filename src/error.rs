use std::io;

use thiserror::Error;

/// Error taxonomy for the split/merge core.
///
/// Individual unparsable lines are never represented here - they are silently
/// dropped by the reader and the chunk stream. Only conditions that abort a
/// run reach this type.
#[derive(Error, Debug)]
pub enum SortError {
    /// Bad configuration discovered before any work starts: missing input,
    /// an invalid numeric argument, an unwritable temp/output location.
    #[error("configuration error: {0}")]
    Config(String),

    /// A fatal I/O failure in a pipeline stage (reader, sorter, writer,
    /// chunk stream, merge writer). Disk-full and open-file-limit errors
    /// surface through this variant as well.
    #[error("I/O error while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// The shared cancellation token was set; the stage that returns this
    /// observed it at its next suspension point and unwound.
    #[error("sort cancelled")]
    Cancelled,
}

impl SortError {
    pub fn config(message: impl Into<String>) -> SortError {
        SortError::Config(message.into())
    }

    pub fn io(context: impl Into<String>, source: io::Error) -> SortError {
        SortError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, SortError::Cancelled)
    }
}
