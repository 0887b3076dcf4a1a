use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, warn};
use parking_lot::Mutex;

use crate::models::artifact::{ArtifactKind, MediaArtifact};
use crate::models::error::{CaptureError, CaptureWarning};
use crate::session::SharedSession;
use crate::traits::backend::Transcriber;
use crate::traits::delegate::SessionDelegate;
use crate::traits::media_source::{MediaSourceHandle, MediaSourceProvider, StreamConstraints};

/// Nested audio-only recorder used while the enclosing session is editing.
///
/// Runs its own one-second tick counter and a single auto-stop bound
/// (`max_duration_secs`); both are independent of the enclosing recording
/// timer. Finished clips go to the transcription collaborator on a worker
/// thread and the result is appended to the note's comment — while that is
/// in flight, starting another clip is rejected.
pub struct VoiceRecorder {
    provider: Arc<dyn MediaSourceProvider>,
    transcriber: Arc<dyn Transcriber>,
    shared: Arc<Mutex<SharedSession>>,
    delegate: Option<Arc<dyn SessionDelegate>>,
    max_duration_secs: u64,

    // The handle lives behind a shared slot so the tick thread can
    // finalize on auto-stop.
    handle: Arc<Mutex<Option<Box<dyn MediaSourceHandle>>>>,
    tick_running: Arc<AtomicBool>,
    tick_handle: Option<JoinHandle<()>>,
    transcribe_handle: Option<JoinHandle<()>>,
}

impl VoiceRecorder {
    pub(crate) fn new(
        provider: Arc<dyn MediaSourceProvider>,
        transcriber: Arc<dyn Transcriber>,
        shared: Arc<Mutex<SharedSession>>,
        max_duration_secs: u64,
    ) -> Self {
        Self {
            provider,
            transcriber,
            shared,
            delegate: None,
            max_duration_secs,
            handle: Arc::new(Mutex::new(None)),
            tick_running: Arc::new(AtomicBool::new(false)),
            tick_handle: None,
            transcribe_handle: None,
        }
    }

    pub(crate) fn set_delegate(&mut self, delegate: Option<Arc<dyn SessionDelegate>>) {
        self.delegate = delegate;
    }

    pub fn is_recording(&self) -> bool {
        self.handle.lock().is_some()
    }

    pub fn transcription_pending(&self) -> bool {
        self.shared.lock().transcription_pending
    }

    /// Acquires a microphone stream and starts the tick counter.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        if self.transcription_pending() {
            return Err(CaptureError::InvalidState {
                operation: "start_voice_note",
                state: "transcription pending".into(),
            });
        }
        if self.is_recording() {
            return Err(CaptureError::InvalidState {
                operation: "start_voice_note",
                state: "voice recording".into(),
            });
        }

        let mut handle = self.provider.acquire(&StreamConstraints::audio_only())?;
        handle.start_recording()?;
        *self.handle.lock() = Some(handle);

        self.start_tick_thread();
        debug!("voice note recording started");
        Ok(())
    }

    /// Finalizes the clip, releases the microphone, and hands the artifact
    /// to the transcription worker.
    pub fn stop(&mut self) -> Result<(), CaptureError> {
        self.stop_tick_thread();
        let worker = Self::finalize(
            &self.handle,
            &self.transcriber,
            &self.shared,
            &self.delegate,
        )?;
        self.transcribe_handle = Some(worker);
        Ok(())
    }

    /// Stops recording without transcribing. Used on discard and teardown.
    pub(crate) fn abort(&mut self) {
        self.stop_tick_thread();
        // Dropping the handle stops the microphone tracks.
        *self.handle.lock() = None;
    }

    fn start_tick_thread(&mut self) {
        self.tick_running.store(true, Ordering::SeqCst);

        let running = Arc::clone(&self.tick_running);
        let shared = Arc::clone(&self.shared);
        let handle_slot = Arc::clone(&self.handle);
        let transcriber = Arc::clone(&self.transcriber);
        let delegate = self.delegate.clone();
        let max_duration = self.max_duration_secs;
        let started = Instant::now();

        let tick = thread::Builder::new()
            .name("voice-timer".into())
            .spawn(move || {
                while running.load(Ordering::SeqCst) {
                    thread::sleep(Duration::from_secs(1));
                    if !running.load(Ordering::SeqCst) {
                        break;
                    }

                    let elapsed = started.elapsed().as_secs();
                    shared.lock().diagnostics.voice_ticks += 1;
                    if let Some(ref d) = delegate {
                        d.on_voice_tick(elapsed);
                    }

                    if elapsed >= max_duration {
                        debug!("voice note auto-stop after {}s", elapsed);
                        running.store(false, Ordering::SeqCst);
                        match Self::finalize(&handle_slot, &transcriber, &shared, &delegate) {
                            // Detached: the worker clears the pending flag
                            // when it resolves.
                            Ok(_worker) => {}
                            Err(e) => warn!("voice auto-stop failed: {}", e),
                        }
                    }
                }
            })
            .expect("failed to spawn voice timer thread");

        self.tick_handle = Some(tick);
    }

    fn stop_tick_thread(&mut self) {
        self.tick_running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.tick_handle.take() {
            let _ = handle.join();
        }
    }

    /// Takes the active handle, finalizes the audio artifact, and spawns
    /// the transcription worker.
    fn finalize(
        handle_slot: &Arc<Mutex<Option<Box<dyn MediaSourceHandle>>>>,
        transcriber: &Arc<dyn Transcriber>,
        shared: &Arc<Mutex<SharedSession>>,
        delegate: &Option<Arc<dyn SessionDelegate>>,
    ) -> Result<JoinHandle<()>, CaptureError> {
        let mut handle = handle_slot.lock().take().ok_or(CaptureError::InvalidState {
            operation: "stop_voice_note",
            state: "idle".into(),
        })?;

        let bytes = handle.stop_recording()?;
        let mime = handle.recording_mime().to_string();
        drop(handle); // releases the microphone

        let artifact = MediaArtifact::new(ArtifactKind::Audio, mime, bytes);
        shared.lock().transcription_pending = true;

        let transcriber = Arc::clone(transcriber);
        let shared = Arc::clone(shared);
        let delegate = delegate.clone();

        let worker = thread::Builder::new()
            .name("voice-transcribe".into())
            .spawn(move || match transcriber.transcribe(&artifact) {
                Ok(text) => {
                    let comment = {
                        let mut s = shared.lock();
                        s.transcription_pending = false;
                        let appended = match s.note.as_mut() {
                            Some(note) => {
                                note.append_voice_transcription(&text);
                                Some(note.user_comment().to_string())
                            }
                            None => None,
                        };
                        if appended.is_some() {
                            s.diagnostics.voice_notes_transcribed += 1;
                        }
                        appended
                    };
                    if let (Some(comment), Some(d)) = (comment, delegate.as_ref()) {
                        d.on_comment_appended(&comment);
                    }
                }
                Err(e) => {
                    shared.lock().transcription_pending = false;
                    warn!("voice transcription failed: {}", e);
                    if let Some(d) = delegate.as_ref() {
                        d.on_warning(&CaptureWarning::TranscriptionFailed {
                            reason: e.to_string(),
                        });
                    }
                }
            })
            .expect("failed to spawn transcription thread");

        Ok(worker)
    }

    /// Blocks until an in-flight transcription resolves. Test helper.
    #[doc(hidden)]
    pub fn wait_for_transcription(&mut self) {
        if let Some(handle) = self.transcribe_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for VoiceRecorder {
    fn drop(&mut self) {
        self.abort();
    }
}
