use std::path::PathBuf;

/// Failures of the background sort pipeline.
///
/// Precondition violations (zero capacity, more splats than capacity) are not
/// represented here; they panic at the call site.
#[derive(Debug, thiserror::Error)]
pub enum SortError {
    #[error("sort manager was cancelled")]
    Cancelled,
    #[error("sorted indices receiver was dropped")]
    ResultChannelClosed,
    #[error("failed to spawn sort worker")]
    Spawn(#[source] std::io::Error),
    #[error("sort worker panicked: {0}")]
    WorkerPanicked(String),
}

impl SortError {
    /// Cancellation and a vanished consumer are both a clean shutdown.
    pub fn is_shutdown(&self) -> bool {
        matches!(self, Self::Cancelled | Self::ResultChannelClosed)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read '{path}'")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{format} parse error: {message}")]
    Format {
        format: &'static str,
        message: String,
    },
    #[error("unsupported input '{0}'. Use a .ply or .splat file")]
    Unsupported(PathBuf),
}

impl LoadError {
    pub(crate) fn ply(message: impl Into<String>) -> Self {
        Self::Format {
            format: "PLY",
            message: message.into(),
        }
    }

    pub(crate) fn splat(message: impl Into<String>) -> Self {
        Self::Format {
            format: "SPLAT",
            message: message.into(),
        }
    }
}
