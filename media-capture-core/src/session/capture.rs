use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::models::artifact::{ArtifactKind, MediaArtifact};
use crate::models::config::CaptureConfig;
use crate::models::error::{CaptureError, CaptureWarning};
use crate::models::metadata::NoteMetadata;
use crate::models::state::{CaptureMode, SessionState};
use crate::processing::compress::AdaptiveCompressor;
use crate::session::voice::VoiceRecorder;
use crate::session::{SessionDiagnostics, SharedSession};
use crate::traits::backend::{
    AuthTokenProvider, NoteBackend, NoteDetails, ProgressSink, Transcriber, UploadRequest,
};
use crate::traits::codec::{select_codec, EncoderFactory, VideoCodec};
use crate::traits::delegate::SessionDelegate;
use crate::traits::media_source::{MediaSourceHandle, MediaSourceProvider, StreamConstraints};

/// External collaborators a session is wired to.
#[derive(Clone)]
pub struct Collaborators {
    pub source: Arc<dyn MediaSourceProvider>,
    pub encoders: Arc<dyn EncoderFactory>,
    pub backend: Arc<dyn NoteBackend>,
    pub transcriber: Arc<dyn Transcriber>,
    pub auth: Arc<dyn AuthTokenProvider>,
}

/// End-to-end state machine for producing, uploading, and annotating one
/// media artifact.
///
/// One session per capture screen. Orchestrates the device media source,
/// the adaptive compressor, the upload path, and the metadata reconciler;
/// see [`SessionState`] for the lifecycle. Every exit path — discard,
/// successful save, or drop — releases the device handle and cancels the
/// timers.
pub struct CaptureSession {
    id: Uuid,
    mode: CaptureMode,
    project_id: String,
    subarea_id: Option<String>,
    config: CaptureConfig,
    started_at: DateTime<Utc>,

    collab: Collaborators,
    delegate: Option<Arc<dyn SessionDelegate>>,
    shared: Arc<Mutex<SharedSession>>,

    handle: Option<Box<dyn MediaSourceHandle>>,
    codec: Option<VideoCodec>,
    raw_artifact: Option<MediaArtifact>,
    artifact: Option<MediaArtifact>,

    timer_running: Arc<AtomicBool>,
    timer_handle: Option<JoinHandle<()>>,

    voice: VoiceRecorder,
}

impl CaptureSession {
    pub fn new(
        mode: CaptureMode,
        project_id: impl Into<String>,
        subarea_id: Option<String>,
        config: CaptureConfig,
        collab: Collaborators,
    ) -> Result<Self, CaptureError> {
        config.validate().map_err(CaptureError::ConfigurationInvalid)?;

        let shared = Arc::new(Mutex::new(SharedSession::new()));
        let voice = VoiceRecorder::new(
            Arc::clone(&collab.source),
            Arc::clone(&collab.transcriber),
            Arc::clone(&shared),
            config.voice_max_duration_secs,
        );

        Ok(Self {
            id: Uuid::new_v4(),
            mode,
            project_id: project_id.into(),
            subarea_id,
            config,
            started_at: Utc::now(),
            collab,
            delegate: None,
            shared,
            handle: None,
            codec: None,
            raw_artifact: None,
            artifact: None,
            timer_running: Arc::new(AtomicBool::new(false)),
            timer_handle: None,
            voice,
        })
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn SessionDelegate>) {
        self.voice.set_delegate(Some(Arc::clone(&delegate)));
        self.delegate = Some(delegate);
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn state(&self) -> SessionState {
        self.shared.lock().state.clone()
    }

    pub fn diagnostics(&self) -> SessionDiagnostics {
        self.shared.lock().diagnostics.clone()
    }

    /// The note created by a successful upload, if any.
    pub fn note(&self) -> Option<NoteMetadata> {
        self.shared.lock().note.clone()
    }

    /// The finalized artifact awaiting upload, if any.
    pub fn artifact(&self) -> Option<&MediaArtifact> {
        self.artifact.as_ref()
    }

    /// The uncompressed recording, kept alongside the compressed artifact.
    pub fn raw_artifact(&self) -> Option<&MediaArtifact> {
        self.raw_artifact.as_ref()
    }

    /// Which codec the fallback chain resolved to at acquisition.
    pub fn selected_codec(&self) -> Option<VideoCodec> {
        self.codec
    }

    /// Acquires the device media source for this session's mode.
    ///
    /// Video mode also resolves the codec fallback chain, once; compression
    /// attempts never re-probe. Acquisition fails fast when the device is
    /// busy or permission is denied.
    pub fn start_capture(&mut self) -> Result<(), CaptureError> {
        self.ensure_state("start_capture", |s| s.is_live())?;
        if self.handle.is_some() {
            return Err(CaptureError::InvalidState {
                operation: "start_capture",
                state: "already streaming".into(),
            });
        }

        let constraints = match self.mode {
            CaptureMode::Photo => StreamConstraints::photo(&self.config),
            CaptureMode::Video => StreamConstraints::video(&self.config),
        };
        let handle = self.collab.source.acquire(&constraints)?;

        if self.mode == CaptureMode::Video {
            // The handle is still local here: a failed probe drops it and
            // stops the tracks before the error propagates.
            self.codec = Some(select_codec(self.collab.encoders.as_ref())?);
        }

        info!(
            "capture started: session={} mode={:?} codec={:?}",
            self.id, self.mode, self.codec
        );
        self.handle = Some(handle);
        Ok(())
    }

    /// Samples exactly one frame and finalizes it as a JPEG artifact.
    /// Photos never pass through the video compressor.
    pub fn take_photo(&mut self) -> Result<(), CaptureError> {
        if self.mode != CaptureMode::Photo {
            return Err(CaptureError::InvalidState {
                operation: "take_photo",
                state: "video mode".into(),
            });
        }
        self.ensure_state("take_photo", |s| s.is_live())?;

        let handle = self.active_handle("take_photo")?;
        let frame = handle.grab_frame()?;
        let jpeg = self
            .collab
            .encoders
            .encode_still(&frame, self.config.photo_quality)?;

        let artifact = MediaArtifact::new(ArtifactKind::Photo, "image/jpeg", jpeg);
        debug!("photo captured: {} bytes", artifact.len());
        self.shared.lock().diagnostics.frames_sampled += 1;
        self.artifact = Some(artifact);
        self.set_state(SessionState::Captured);
        Ok(())
    }

    /// Begins recording and starts the once-per-second tick timer.
    pub fn start_recording(&mut self) -> Result<(), CaptureError> {
        if self.mode != CaptureMode::Video {
            return Err(CaptureError::InvalidState {
                operation: "start_recording",
                state: "photo mode".into(),
            });
        }
        self.ensure_state("start_recording", |s| s.is_live())?;

        self.active_handle("start_recording")?.start_recording()?;
        self.set_state(SessionState::Recording { elapsed_secs: 0 });
        self.start_recording_timer();
        Ok(())
    }

    /// Finalizes the raw artifact, runs the adaptive compressor, and moves
    /// to `Captured`.
    ///
    /// Compression failure is recoverable: the raw artifact is kept and a
    /// warning is surfaced instead of blocking the user.
    pub fn stop_recording(&mut self) -> Result<(), CaptureError> {
        self.ensure_state("stop_recording", |s| s.is_recording())?;
        self.stop_recording_timer();

        let handle = self.active_handle("stop_recording")?;
        let mime = handle.recording_mime().to_string();
        let bytes = match handle.stop_recording() {
            Ok(bytes) => bytes,
            Err(e) => {
                self.set_state(SessionState::Error(e.clone()));
                self.notify_error(&e);
                return Err(e);
            }
        };

        let raw = MediaArtifact::new(ArtifactKind::Video, mime, bytes);
        info!("recording finalized: {} raw bytes", raw.len());

        let codec = self.codec.ok_or_else(|| {
            CaptureError::EncodingFailed("no codec resolved at acquisition".into())
        })?;
        let compressor =
            AdaptiveCompressor::new(self.collab.encoders.as_ref(), codec, &self.config);
        match compressor.compress(&raw, self.config.video_byte_budget) {
            Ok(outcome) => {
                self.shared.lock().diagnostics.compression_passes +=
                    outcome.attempts.len() as u64;
                if !outcome.budget_met {
                    self.notify_warning(&CaptureWarning::BudgetNotMet {
                        size: outcome.artifact.len(),
                        budget: self.config.video_byte_budget,
                    });
                }
                self.artifact = Some(outcome.artifact);
            }
            Err(e) => {
                warn!("compression failed, keeping raw artifact: {}", e);
                self.notify_warning(&CaptureWarning::CompressionFellBack {
                    reason: e.to_string(),
                });
                self.artifact = Some(raw.clone());
            }
        }
        self.raw_artifact = Some(raw);
        self.set_state(SessionState::Captured);
        Ok(())
    }

    /// Drops the artifact, releases the device and timers, and returns to
    /// `Live`.
    pub fn discard(&mut self) -> Result<(), CaptureError> {
        self.ensure_state("discard", |s| {
            matches!(
                s,
                SessionState::Captured | SessionState::Editing | SessionState::Error(_)
            )
        })?;

        self.voice.abort();
        self.stop_recording_timer();
        self.handle = None; // drop stops all tracks
        self.artifact = None;
        self.raw_artifact = None;
        {
            let mut shared = self.shared.lock();
            shared.note = None;
            shared.transcription_pending = false;
        }
        info!("session {} discarded", self.id);
        self.set_state(SessionState::Live);
        Ok(())
    }

    /// Uploads the finalized artifact and, on success, seeds the editable
    /// note metadata and enters `Editing`.
    ///
    /// Valid from `Captured`, and from `Error` as an explicit retry — the
    /// backend is never retried automatically. Oversized artifacts are
    /// rejected before any network activity, and a missing credential
    /// surfaces before the upload starts.
    pub fn confirm(&mut self) -> Result<(), CaptureError> {
        self.ensure_state("confirm", |s| {
            matches!(s, SessionState::Captured | SessionState::Error(_))
        })?;
        let artifact = self.artifact.clone().ok_or(CaptureError::InvalidState {
            operation: "confirm",
            state: "no finalized artifact".into(),
        })?;

        if artifact.len() > self.config.upload_byte_ceiling {
            let err = CaptureError::SizeExceeded {
                size: artifact.len(),
                limit: self.config.upload_byte_ceiling,
            };
            self.notify_error(&err);
            return Err(err);
        }

        // Surface a signed-out user before any bytes move.
        if let Err(e) = self.collab.auth.bearer_token() {
            self.notify_error(&e);
            return Err(e);
        }

        self.set_state(SessionState::Uploading { progress: 0.0 });
        let progress = self.progress_sink();

        let request = UploadRequest {
            artifact: &artifact,
            project_id: &self.project_id,
            subarea_id: self.subarea_id.as_deref(),
        };
        match self.collab.backend.upload(&request, progress) {
            Ok(receipt) => {
                info!(
                    "upload complete: note={} {} bytes",
                    receipt.note_id,
                    artifact.len()
                );
                {
                    let mut shared = self.shared.lock();
                    shared.diagnostics.bytes_uploaded += artifact.len();
                    shared.note = Some(NoteMetadata::new(
                        receipt.note_id,
                        receipt.media_url,
                        receipt.ai,
                    ));
                }
                // The artifact is final; the camera is no longer needed.
                self.handle = None;
                self.set_state(SessionState::Editing);
                Ok(())
            }
            Err(e) => {
                self.set_state(SessionState::Error(e.clone()));
                self.notify_error(&e);
                Err(e)
            }
        }
    }

    /// Overwrites the user comment. The AI output is untouched.
    pub fn set_comment(&mut self, text: &str) -> Result<(), CaptureError> {
        self.ensure_state("set_comment", |s| s.is_editing())?;
        self.with_note("set_comment", |note| note.set_comment(text))
    }

    pub fn set_subarea(&mut self, subarea: Option<String>) -> Result<(), CaptureError> {
        self.ensure_state("set_subarea", |s| s.is_editing())?;
        self.with_note("set_subarea", |note| note.set_subarea(subarea))
    }

    /// Pushes the user-edited fields through the update-details endpoint
    /// and finishes the session. `Done` is only entered after the call
    /// succeeds; the update path structurally cannot touch AI fields.
    pub fn save_details(&mut self) -> Result<(), CaptureError> {
        self.ensure_state("save_details", |s| s.is_editing())?;

        let (note_id, details) = {
            let shared = self.shared.lock();
            let note = shared.note.as_ref().ok_or(CaptureError::InvalidState {
                operation: "save_details",
                state: "no note".into(),
            })?;
            let details = NoteDetails {
                comment: Some(note.user_comment().to_string()),
                subarea: note.user_subarea().map(str::to_string),
            };
            (note.note_id().to_string(), details)
        };

        match self.collab.backend.update_details(&note_id, &details) {
            Ok(()) => {
                self.set_state(SessionState::Done);
                Ok(())
            }
            Err(e) => {
                // Still editing; the user decides whether to retry.
                self.notify_error(&e);
                Err(e)
            }
        }
    }

    /// Starts a voice note. Only valid while editing; rejected while a
    /// previous clip's transcription is still pending.
    pub fn start_voice_note(&mut self) -> Result<(), CaptureError> {
        self.ensure_state("start_voice_note", |s| s.is_editing())?;
        self.voice.start()
    }

    /// Stops the voice note; the transcription lands in the comment
    /// asynchronously.
    pub fn stop_voice_note(&mut self) -> Result<(), CaptureError> {
        self.ensure_state("stop_voice_note", |s| s.is_editing())?;
        self.voice.stop()
    }

    pub fn voice_recording(&self) -> bool {
        self.voice.is_recording()
    }

    pub fn voice_transcription_pending(&self) -> bool {
        self.voice.transcription_pending()
    }

    /// Blocks until an in-flight voice transcription resolves. Test helper.
    #[doc(hidden)]
    pub fn wait_for_voice_transcription(&mut self) {
        self.voice.wait_for_transcription();
    }

    // --- Internal helpers ---

    fn set_state(&self, new_state: SessionState) {
        {
            self.shared.lock().state = new_state.clone();
        }
        if let Some(ref delegate) = self.delegate {
            delegate.on_state_changed(&new_state);
        }
    }

    fn notify_error(&self, error: &CaptureError) {
        if let Some(ref delegate) = self.delegate {
            delegate.on_error(error);
        }
    }

    fn notify_warning(&self, warning: &CaptureWarning) {
        warn!("capture warning: {:?}", warning);
        if let Some(ref delegate) = self.delegate {
            delegate.on_warning(warning);
        }
    }

    fn ensure_state(
        &self,
        operation: &'static str,
        valid: impl Fn(&SessionState) -> bool,
    ) -> Result<(), CaptureError> {
        let state = self.shared.lock().state.clone();
        if valid(&state) {
            Ok(())
        } else {
            Err(CaptureError::InvalidState {
                operation,
                state: state.to_string(),
            })
        }
    }

    fn active_handle(
        &mut self,
        operation: &'static str,
    ) -> Result<&mut Box<dyn MediaSourceHandle>, CaptureError> {
        self.handle
            .as_mut()
            .ok_or_else(|| CaptureError::ResourceUnavailable(format!(
                "{}: media source not acquired",
                operation
            )))
    }

    fn with_note(
        &mut self,
        operation: &'static str,
        apply: impl FnOnce(&mut NoteMetadata),
    ) -> Result<(), CaptureError> {
        let mut shared = self.shared.lock();
        match shared.note.as_mut() {
            Some(note) => {
                apply(note);
                Ok(())
            }
            None => Err(CaptureError::InvalidState {
                operation,
                state: "no note".into(),
            }),
        }
    }

    /// Byte-level progress reported by the backend, clamped monotonic
    /// before it reaches the state machine and the delegate.
    fn progress_sink(&self) -> ProgressSink {
        let shared = Arc::clone(&self.shared);
        let delegate = self.delegate.clone();
        let last = Mutex::new(0.0f32);
        Arc::new(move |fraction: f32| {
            let clamped = {
                let mut last = last.lock();
                *last = fraction.clamp(0.0, 1.0).max(*last);
                *last
            };
            {
                let mut s = shared.lock();
                if let SessionState::Uploading { .. } = s.state {
                    s.state = SessionState::Uploading { progress: clamped };
                }
            }
            if let Some(ref d) = delegate {
                d.on_upload_progress(clamped);
            }
        })
    }

    /// One-second recording tick, cancelled on stop and on every abnormal
    /// exit path.
    fn start_recording_timer(&mut self) {
        self.timer_running.store(true, Ordering::SeqCst);

        let running = Arc::clone(&self.timer_running);
        let shared = Arc::clone(&self.shared);
        let delegate = self.delegate.clone();
        let started = Instant::now();

        let handle = thread::Builder::new()
            .name("recording-timer".into())
            .spawn(move || {
                while running.load(Ordering::SeqCst) {
                    thread::sleep(Duration::from_secs(1));
                    if !running.load(Ordering::SeqCst) {
                        break;
                    }

                    let elapsed = started.elapsed().as_secs();
                    let notify = {
                        let mut s = shared.lock();
                        if s.state.is_recording() {
                            s.state = SessionState::Recording {
                                elapsed_secs: elapsed,
                            };
                            s.diagnostics.recording_ticks += 1;
                            true
                        } else {
                            false
                        }
                    };
                    if notify {
                        if let Some(ref d) = delegate {
                            d.on_recording_tick(elapsed);
                        }
                    }
                }
            })
            .expect("failed to spawn recording timer thread");

        self.timer_handle = Some(handle);
    }

    fn stop_recording_timer(&mut self) {
        self.timer_running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.timer_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        // The handle and voice recorder release their own resources on
        // drop; the timer thread needs its flag lowered or it would keep
        // running.
        self.timer_running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.timer_handle.take() {
            let _ = handle.join();
        }
    }
}
