use std::fmt;

use super::error::CaptureError;

/// What kind of artifact a session produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureMode {
    Photo,
    Video,
}

/// Capture session state machine.
///
/// State transitions:
/// ```text
/// live → recording → captured → uploading → editing → done
///  ↑    (video only)    │           │
///  └──── discard ───────┘        error ──(confirm retries / discard)
/// ```
///
/// Photo mode goes straight from `Live` to `Captured`. A failed upload parks
/// the session in `Error` with the artifact retained so `confirm()` can be
/// re-invoked.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Preview streaming, no artifact yet.
    Live,
    /// Video/audio actively being sampled.
    Recording { elapsed_secs: u64 },
    /// Artifact finalized, awaiting the user's decision.
    Captured,
    /// Streaming the artifact to the backend.
    Uploading { progress: f32 },
    /// Artifact uploaded, metadata editable.
    Editing,
    Done,
    Error(CaptureError),
}

impl SessionState {
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording { .. })
    }

    pub fn is_captured(&self) -> bool {
        matches!(self, Self::Captured)
    }

    pub fn is_editing(&self) -> bool {
        matches!(self, Self::Editing)
    }

    /// `Done` is the only terminal state; `Error` still allows retry and
    /// discard.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Seconds recorded so far, if currently recording.
    pub fn elapsed_secs(&self) -> Option<u64> {
        match self {
            Self::Recording { elapsed_secs } => Some(*elapsed_secs),
            _ => None,
        }
    }

    /// Upload progress fraction, if currently uploading.
    pub fn progress(&self) -> Option<f32> {
        match self {
            Self::Uploading { progress } => Some(*progress),
            _ => None,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Live => write!(f, "live"),
            Self::Recording { .. } => write!(f, "recording"),
            Self::Captured => write!(f, "captured"),
            Self::Uploading { .. } => write!(f, "uploading"),
            Self::Editing => write!(f, "editing"),
            Self::Done => write!(f, "done"),
            Self::Error(_) => write!(f, "error"),
        }
    }
}
