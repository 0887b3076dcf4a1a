use crate::models::error::{CaptureError, CaptureWarning};
use crate::models::state::SessionState;

/// Event delegate for capture session notifications.
///
/// Tick, progress, and transcription callbacks fire from worker threads,
/// not the thread driving the session. Implementations should marshal to
/// the UI thread if needed.
pub trait SessionDelegate: Send + Sync {
    /// Called on every state transition.
    fn on_state_changed(&self, state: &SessionState);

    /// Called when an operation fails with a user-visible error.
    fn on_error(&self, error: &CaptureError);

    /// Called once per second while recording.
    fn on_recording_tick(&self, _elapsed_secs: u64) {}

    /// Called once per second while a voice note is recording.
    fn on_voice_tick(&self, _elapsed_secs: u64) {}

    /// Called with a monotonically non-decreasing fraction during upload.
    fn on_upload_progress(&self, _fraction: f32) {}

    /// Called for recoverable conditions the user should see but that do
    /// not interrupt the flow.
    fn on_warning(&self, _warning: &CaptureWarning) {}

    /// Called after a voice-note transcription lands in the comment.
    fn on_comment_appended(&self, _comment: &str) {}
}
