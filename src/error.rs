//! Error types.
//!
//! Only configuration and recording failures ever reach a caller. Capture
//! failures are recovered inside the gesture detector and only logged.

pub type WishResult<T> = Result<T, WishError>;

#[derive(thiserror::Error, Debug)]
pub enum WishError {
    #[error("config error: {0}")]
    Config(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("recording error: {0}")]
    Recording(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl WishError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn recording(msg: impl Into<String>) -> Self {
        Self::Recording(msg.into())
    }
}

/// Reasons an audio capture pipeline could not be opened or kept alive.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// The host refused access to the input device.
    #[error("capture permission denied: {0}")]
    PermissionDenied(String),

    /// No usable input device or format.
    #[error("capture unavailable: {0}")]
    Unavailable(String),

    /// The stream stopped delivering samples.
    #[error("capture stream ended")]
    StreamEnded,
}

impl CaptureError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }
}
