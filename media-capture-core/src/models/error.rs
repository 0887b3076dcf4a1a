use thiserror::Error;

/// Errors that can occur across the capture, compression, and upload pipeline.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("camera/microphone permission denied")]
    PermissionDenied,

    #[error("media device unavailable: {0}")]
    ResourceUnavailable(String),

    #[error("compression failed: {0}")]
    CompressionFailed(String),

    #[error("artifact is {size} bytes, over the {limit}-byte upload ceiling")]
    SizeExceeded { size: u64, limit: u64 },

    #[error("authentication required")]
    AuthRequired,

    #[error("session expired, re-authentication required")]
    AuthExpired,

    #[error("server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("network error: {0}")]
    NetworkError(String),

    #[error("transcription failed: {0}")]
    TranscriptionFailed(String),

    #[error("encoding failed: {0}")]
    EncodingFailed(String),

    #[error("configuration invalid: {0}")]
    ConfigurationInvalid(String),

    #[error("{operation} is not valid in the {state} state")]
    InvalidState {
        operation: &'static str,
        state: String,
    },
}

impl CaptureError {
    /// Whether re-invoking the failed operation is a sensible user action.
    ///
    /// Upload failures are never retried automatically: the server may have
    /// partially applied the request, so the retry decision belongs to the
    /// caller.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ServerError { .. } | Self::NetworkError(_))
    }

    /// Recoverable conditions degrade gracefully instead of interrupting
    /// the capture flow.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::CompressionFailed(_) | Self::TranscriptionFailed(_)
        )
    }
}

/// Non-fatal conditions surfaced to the UI without interrupting the flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureWarning {
    /// Compression errored; the raw artifact is used instead.
    CompressionFellBack { reason: String },
    /// The compressor ran to its quality floor without meeting the budget.
    BudgetNotMet { size: u64, budget: u64 },
    /// A voice clip could not be transcribed; the comment is unchanged.
    TranscriptionFailed { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(CaptureError::NetworkError("timeout".into()).is_retryable());
        assert!(CaptureError::ServerError {
            status: 502,
            message: "bad gateway".into()
        }
        .is_retryable());
        assert!(!CaptureError::AuthExpired.is_retryable());
        assert!(!CaptureError::PermissionDenied.is_retryable());
    }

    #[test]
    fn recoverable_classification() {
        assert!(CaptureError::CompressionFailed("seek".into()).is_recoverable());
        assert!(CaptureError::TranscriptionFailed("empty".into()).is_recoverable());
        assert!(!CaptureError::NetworkError("down".into()).is_recoverable());
    }

    #[test]
    fn auth_expired_is_distinct_from_server_error() {
        let expired = CaptureError::AuthExpired;
        let server = CaptureError::ServerError {
            status: 500,
            message: "oops".into(),
        };
        assert_ne!(expired, server);
        assert!(expired.to_string().contains("re-authentication"));
    }
}
