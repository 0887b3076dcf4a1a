pub mod capture;
pub mod voice;

pub use capture::{CaptureSession, Collaborators};
pub use voice::VoiceRecorder;

use crate::models::metadata::NoteMetadata;
use crate::models::state::SessionState;

/// Counters for debugging capture sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionDiagnostics {
    pub frames_sampled: u64,
    pub compression_passes: u64,
    pub recording_ticks: u64,
    pub voice_ticks: u64,
    pub bytes_uploaded: u64,
    pub voice_notes_transcribed: u64,
}

/// Mutable session state shared with timer and transcription worker
/// threads, protected by `parking_lot::Mutex`.
pub(crate) struct SharedSession {
    pub(crate) state: SessionState,
    pub(crate) note: Option<NoteMetadata>,
    pub(crate) transcription_pending: bool,
    pub(crate) diagnostics: SessionDiagnostics,
}

impl SharedSession {
    pub(crate) fn new() -> Self {
        Self {
            state: SessionState::Live,
            note: None,
            transcription_pending: false,
            diagnostics: SessionDiagnostics::default(),
        }
    }
}
