//! Simulated devices, codecs, and collaborators for development and tests
//! without hardware.
//!
//! Payloads produced here are self-describing: simulated video buffers
//! start with a small header carrying dimensions and duration, so the
//! simulated seeker can reopen anything the simulated recorder or encoder
//! produced. Encoded sizes follow a deterministic model
//! (`bitrate * quality * size_factor`), which lets tests drive the
//! compressor through exact over/under-budget traces.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;

use crate::models::artifact::{ArtifactKind, MediaArtifact};
use crate::models::error::CaptureError;
use crate::models::metadata::AiMetadata;
use crate::traits::backend::{
    AuthTokenProvider, NoteBackend, NoteDetails, ProgressSink, Transcriber, UploadReceipt,
    UploadRequest,
};
use crate::traits::codec::{
    EncoderFactory, EncoderSettings, VideoCodec, VideoEncoder, VideoFrameSeeker,
};
use crate::traits::media_source::{
    MediaSourceHandle, MediaSourceProvider, RasterFrame, StreamConstraints,
};

const SIM_MAGIC: &[u8; 4] = b"SIMV";
const SIM_HEADER_LEN: usize = 20;

fn encode_sim_header(width: u32, height: u32, duration_secs: f64) -> [u8; SIM_HEADER_LEN] {
    let mut header = [0u8; SIM_HEADER_LEN];
    header[..4].copy_from_slice(SIM_MAGIC);
    header[4..8].copy_from_slice(&width.to_le_bytes());
    header[8..12].copy_from_slice(&height.to_le_bytes());
    header[12..20].copy_from_slice(&duration_secs.to_le_bytes());
    header
}

fn decode_sim_header(data: &[u8]) -> Option<(u32, u32, f64)> {
    if data.len() < SIM_HEADER_LEN || &data[..4] != SIM_MAGIC {
        return None;
    }
    let width = u32::from_le_bytes(data[4..8].try_into().ok()?);
    let height = u32::from_le_bytes(data[8..12].try_into().ok()?);
    let duration = f64::from_le_bytes(data[12..20].try_into().ok()?);
    Some((width, height, duration))
}

fn sim_video_payload(width: u32, height: u32, duration_secs: f64, total_len: u64) -> Bytes {
    let len = (total_len as usize).max(SIM_HEADER_LEN);
    let mut data = vec![0u8; len];
    data[..SIM_HEADER_LEN].copy_from_slice(&encode_sim_header(width, height, duration_secs));
    Bytes::from(data)
}

/// A finalized simulated video artifact of the given payload size.
pub fn sim_video_artifact(
    width: u32,
    height: u32,
    duration_secs: f64,
    total_len: u64,
) -> MediaArtifact {
    MediaArtifact::new(
        ArtifactKind::Video,
        VideoCodec::Webm.mime_type(),
        sim_video_payload(width, height, duration_secs, total_len),
    )
}

/// Simulated camera/microphone.
///
/// Enforces the exclusive single-holder policy: a second `acquire` while a
/// handle is alive fails fast instead of queueing. `active_streams` lets
/// tests assert that every exit path released the device.
pub struct SimMediaSource {
    available: bool,
    permission_granted: bool,
    width: u32,
    height: u32,
    recording_duration_secs: f64,
    raw_recording_len: u64,
    active: Arc<AtomicUsize>,
}

impl SimMediaSource {
    pub fn new() -> Self {
        Self {
            available: true,
            permission_granted: true,
            width: 1280,
            height: 720,
            recording_duration_secs: 10.0,
            raw_recording_len: 1024 * 1024,
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Every recording this device produces has the given simulated
    /// duration and raw container size.
    pub fn with_recording(mut self, duration_secs: f64, raw_len: u64) -> Self {
        self.recording_duration_secs = duration_secs;
        self.raw_recording_len = raw_len;
        self
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    pub fn without_permission() -> Self {
        Self {
            permission_granted: false,
            ..Self::new()
        }
    }

    /// Number of streams currently held open.
    pub fn active_streams(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

impl Default for SimMediaSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaSourceProvider for SimMediaSource {
    fn is_available(&self) -> bool {
        self.available
    }

    fn acquire(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn MediaSourceHandle>, CaptureError> {
        if !self.available {
            return Err(CaptureError::ResourceUnavailable("no device".into()));
        }
        if !self.permission_granted {
            return Err(CaptureError::PermissionDenied);
        }
        if self.active.fetch_add(1, Ordering::SeqCst) > 0 {
            self.active.fetch_sub(1, Ordering::SeqCst);
            return Err(CaptureError::ResourceUnavailable("device busy".into()));
        }

        let width = self.width.min(constraints.max_width.max(2));
        let height = self.height.min(constraints.max_height.max(2));
        Ok(Box::new(SimStreamHandle {
            has_video: constraints.video,
            width,
            height,
            recording: false,
            recording_duration_secs: self.recording_duration_secs,
            raw_recording_len: self.raw_recording_len,
            frame_template: None,
            active: Arc::clone(&self.active),
            stopped: false,
        }))
    }
}

struct SimStreamHandle {
    has_video: bool,
    width: u32,
    height: u32,
    recording: bool,
    recording_duration_secs: f64,
    raw_recording_len: u64,
    // Shared zeroed raster reused across grabs; `Bytes` clones are
    // refcounted so repeated frames cost nothing.
    frame_template: Option<Bytes>,
    active: Arc<AtomicUsize>,
    stopped: bool,
}

impl MediaSourceHandle for SimStreamHandle {
    fn video_dimensions(&self) -> Option<(u32, u32)> {
        self.has_video.then_some((self.width, self.height))
    }

    fn recording_mime(&self) -> &str {
        if self.has_video {
            "video/webm"
        } else {
            "audio/webm"
        }
    }

    fn grab_frame(&mut self) -> Result<RasterFrame, CaptureError> {
        if !self.has_video {
            return Err(CaptureError::ResourceUnavailable("no video track".into()));
        }
        let len = (self.width * self.height * 4) as usize;
        let pixels = self
            .frame_template
            .get_or_insert_with(|| Bytes::from(vec![0u8; len]))
            .clone();
        Ok(RasterFrame {
            width: self.width,
            height: self.height,
            pixels,
        })
    }

    fn start_recording(&mut self) -> Result<(), CaptureError> {
        if self.recording {
            return Err(CaptureError::InvalidState {
                operation: "start_recording",
                state: "recording".into(),
            });
        }
        self.recording = true;
        Ok(())
    }

    fn stop_recording(&mut self) -> Result<Bytes, CaptureError> {
        if !self.recording {
            return Err(CaptureError::InvalidState {
                operation: "stop_recording",
                state: "idle".into(),
            });
        }
        self.recording = false;
        if self.has_video {
            Ok(sim_video_payload(
                self.width,
                self.height,
                self.recording_duration_secs,
                self.raw_recording_len,
            ))
        } else {
            // 64 kbps worth of simulated audio.
            let len = (self.recording_duration_secs * 8_000.0) as usize;
            Ok(Bytes::from(vec![0u8; len.max(1)]))
        }
    }

    fn stop_all_tracks(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.recording = false;
            self.active.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Drop for SimStreamHandle {
    fn drop(&mut self) {
        self.stop_all_tracks();
    }
}

/// Simulated codec factory with a deterministic size model.
pub struct SimCodecFactory {
    supported: Vec<VideoCodec>,
    size_factor: f64,
    still_size_factor: f64,
    fail_encodes: bool,
    video_encoders_created: AtomicUsize,
}

impl SimCodecFactory {
    pub fn new() -> Self {
        Self {
            supported: VideoCodec::PREFERENCE.to_vec(),
            size_factor: 1.0,
            still_size_factor: 0.05,
            fail_encodes: false,
            video_encoders_created: AtomicUsize::new(0),
        }
    }

    /// Scales encoded video size; tests tune this to model source
    /// complexity.
    pub fn with_size_factor(mut self, factor: f64) -> Self {
        self.size_factor = factor;
        self
    }

    /// Scales encoded still size relative to `width * height * quality`.
    pub fn with_still_size_factor(mut self, factor: f64) -> Self {
        self.still_size_factor = factor;
        self
    }

    pub fn supporting(mut self, codecs: Vec<VideoCodec>) -> Self {
        self.supported = codecs;
        self
    }

    /// Every video encode pass fails, exercising the raw-fallback path.
    pub fn failing_encodes(mut self) -> Self {
        self.fail_encodes = true;
        self
    }

    pub fn video_encoders_created(&self) -> usize {
        self.video_encoders_created.load(Ordering::SeqCst)
    }
}

impl Default for SimCodecFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl EncoderFactory for SimCodecFactory {
    fn supports(&self, codec: VideoCodec) -> bool {
        self.supported.contains(&codec)
    }

    fn new_video_encoder(
        &self,
        _codec: VideoCodec,
        settings: &EncoderSettings,
    ) -> Result<Box<dyn VideoEncoder>, CaptureError> {
        self.video_encoders_created.fetch_add(1, Ordering::SeqCst);
        if self.fail_encodes {
            return Err(CaptureError::EncodingFailed("simulated encoder failure".into()));
        }
        Ok(Box::new(SimVideoEncoder {
            settings: settings.clone(),
            size_factor: self.size_factor,
            frames: 0,
        }))
    }

    fn open_seeker(
        &self,
        artifact: &MediaArtifact,
    ) -> Result<Box<dyn VideoFrameSeeker>, CaptureError> {
        let (width, height, duration_secs) = decode_sim_header(artifact.data())
            .ok_or_else(|| CaptureError::EncodingFailed("unrecognized container".into()))?;
        Ok(Box::new(SimSeeker {
            width,
            height,
            duration_secs,
            frame_template: Mutex::new(None),
        }))
    }

    fn encode_still(&self, frame: &RasterFrame, quality: f32) -> Result<Bytes, CaptureError> {
        let area = f64::from(frame.width) * f64::from(frame.height);
        let len = ((area * f64::from(quality) * self.still_size_factor) as usize).max(4);
        let mut data = vec![0u8; len];
        // JPEG start/end markers.
        data[0] = 0xFF;
        data[1] = 0xD8;
        data[len - 2] = 0xFF;
        data[len - 1] = 0xD9;
        Ok(Bytes::from(data))
    }
}

struct SimVideoEncoder {
    settings: EncoderSettings,
    size_factor: f64,
    frames: u64,
}

impl VideoEncoder for SimVideoEncoder {
    fn push_frame(&mut self, _timestamp_secs: f64, frame: &RasterFrame) -> Result<(), CaptureError> {
        if frame.width % 2 != 0 || frame.height % 2 != 0 {
            return Err(CaptureError::EncodingFailed(format!(
                "odd frame dimensions {}x{}",
                frame.width, frame.height
            )));
        }
        if frame.width != self.settings.width || frame.height != self.settings.height {
            return Err(CaptureError::EncodingFailed(
                "frame does not match encoder dimensions".into(),
            ));
        }
        self.frames += 1;
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Bytes, CaptureError> {
        let duration = self.frames as f64 / f64::from(self.settings.frame_rate.max(1));
        let video_bits =
            f64::from(self.settings.video_bitrate) * f64::from(self.settings.quality) * self.size_factor;
        let audio_bits = f64::from(self.settings.audio_bitrate);
        let len = (duration * (video_bits + audio_bits) / 8.0) as u64;
        Ok(sim_video_payload(
            self.settings.width,
            self.settings.height,
            duration,
            len,
        ))
    }
}

struct SimSeeker {
    width: u32,
    height: u32,
    duration_secs: f64,
    frame_template: Mutex<Option<(u32, u32, Bytes)>>,
}

impl VideoFrameSeeker for SimSeeker {
    fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn frame_at(
        &mut self,
        timestamp_secs: f64,
        width: u32,
        height: u32,
    ) -> Result<RasterFrame, CaptureError> {
        if timestamp_secs > self.duration_secs {
            return Err(CaptureError::EncodingFailed(format!(
                "seek past end: {:.2}s > {:.2}s",
                timestamp_secs, self.duration_secs
            )));
        }
        let pixels = {
            let mut template = self.frame_template.lock();
            match template.as_ref() {
                Some((w, h, bytes)) if *w == width && *h == height => bytes.clone(),
                _ => {
                    let fresh = Bytes::from(vec![0u8; (width * height * 4) as usize]);
                    *template = Some((width, height, fresh.clone()));
                    fresh
                }
            }
        };
        Ok(RasterFrame {
            width,
            height,
            pixels,
        })
    }
}

/// Simulated note backend recording every call it receives.
pub struct SimNoteBackend {
    ai_label: String,
    ai_transcription: String,
    progress_script: Mutex<Vec<f32>>,
    fail_next_upload: Mutex<Option<CaptureError>>,
    fail_next_update: Mutex<Option<CaptureError>>,
    uploads: Mutex<Vec<(ArtifactKind, u64)>>,
    updates: Mutex<Vec<(String, NoteDetails)>>,
    next_note: AtomicUsize,
}

impl SimNoteBackend {
    pub fn new() -> Self {
        Self {
            ai_label: "simulated label".into(),
            ai_transcription: "simulated transcription".into(),
            progress_script: Mutex::new(vec![0.25, 0.5, 0.75, 1.0]),
            fail_next_upload: Mutex::new(None),
            fail_next_update: Mutex::new(None),
            uploads: Mutex::new(Vec::new()),
            updates: Mutex::new(Vec::new()),
            next_note: AtomicUsize::new(1),
        }
    }

    pub fn with_ai(mut self, label: impl Into<String>, transcription: impl Into<String>) -> Self {
        self.ai_label = label.into();
        self.ai_transcription = transcription.into();
        self
    }

    /// The fractions reported to the progress sink during upload; tests can
    /// script non-monotonic values to exercise the clamp.
    pub fn set_progress_script(&self, script: Vec<f32>) {
        *self.progress_script.lock() = script;
    }

    /// Fail exactly the next upload with `err`, then succeed again.
    pub fn fail_next_upload(&self, err: CaptureError) {
        *self.fail_next_upload.lock() = Some(err);
    }

    pub fn fail_next_update(&self, err: CaptureError) {
        *self.fail_next_update.lock() = Some(err);
    }

    pub fn uploads(&self) -> Vec<(ArtifactKind, u64)> {
        self.uploads.lock().clone()
    }

    pub fn updates(&self) -> Vec<(String, NoteDetails)> {
        self.updates.lock().clone()
    }
}

impl Default for SimNoteBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl NoteBackend for SimNoteBackend {
    fn upload(
        &self,
        request: &UploadRequest<'_>,
        progress: ProgressSink,
    ) -> Result<UploadReceipt, CaptureError> {
        if let Some(err) = self.fail_next_upload.lock().take() {
            return Err(err);
        }

        for fraction in self.progress_script.lock().iter() {
            progress(*fraction);
        }

        let artifact = request.artifact;
        self.uploads.lock().push((artifact.kind(), artifact.len()));

        let ai = match artifact.kind() {
            ArtifactKind::Photo => AiMetadata::Photo {
                label: self.ai_label.clone(),
            },
            ArtifactKind::Video => AiMetadata::Video {
                transcription: self.ai_transcription.clone(),
            },
            ArtifactKind::Audio => AiMetadata::Text,
        };
        let note_number = self.next_note.fetch_add(1, Ordering::SeqCst);
        Ok(UploadReceipt {
            note_id: format!("note-{}", note_number),
            media_url: Some(format!("https://media.example/{}", artifact.file_name())),
            file_name: artifact.file_name(),
            mime_type: artifact.mime_type().to_string(),
            file_size: artifact.len(),
            ai,
        })
    }

    fn update_details(&self, note_id: &str, details: &NoteDetails) -> Result<(), CaptureError> {
        if let Some(err) = self.fail_next_update.lock().take() {
            return Err(err);
        }
        self.updates
            .lock()
            .push((note_id.to_string(), details.clone()));
        Ok(())
    }
}

/// Simulated transcription collaborator.
///
/// The gated variant blocks inside `transcribe` until the test releases it,
/// which keeps a transcription deterministically "in flight".
pub struct SimTranscriber {
    result: Mutex<Result<String, CaptureError>>,
    gate: Option<Mutex<mpsc::Receiver<()>>>,
    calls: AtomicUsize,
}

impl SimTranscriber {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            result: Mutex::new(Ok(text.into())),
            gate: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(err: CaptureError) -> Self {
        Self {
            result: Mutex::new(Err(err)),
            gate: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Returns the transcriber and the sender that releases each call.
    pub fn gated(text: impl Into<String>) -> (Self, mpsc::Sender<()>) {
        let (tx, rx) = mpsc::channel();
        (
            Self {
                result: Mutex::new(Ok(text.into())),
                gate: Some(Mutex::new(rx)),
                calls: AtomicUsize::new(0),
            },
            tx,
        )
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transcriber for SimTranscriber {
    fn transcribe(&self, _artifact: &MediaArtifact) -> Result<String, CaptureError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(ref gate) = self.gate {
            // Bounded wait so a forgotten release fails the test instead of
            // hanging it.
            let _ = gate.lock().recv_timeout(Duration::from_secs(5));
        }
        self.result.lock().clone()
    }
}

/// Simulated credential provider.
pub struct SimAuth {
    token: Option<String>,
}

impl SimAuth {
    pub fn signed_in() -> Self {
        Self {
            token: Some("sim-bearer-token".into()),
        }
    }

    pub fn signed_out() -> Self {
        Self { token: None }
    }
}

impl AuthTokenProvider for SimAuth {
    fn bearer_token(&self) -> Result<String, CaptureError> {
        self.token.clone().ok_or(CaptureError::AuthRequired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_header_round_trips() {
        let payload = sim_video_payload(1280, 720, 42.5, 4096);
        assert_eq!(payload.len(), 4096);
        assert_eq!(decode_sim_header(&payload), Some((1280, 720, 42.5)));
    }

    #[test]
    fn header_rejects_foreign_data() {
        assert_eq!(decode_sim_header(b"not a container"), None);
        assert_eq!(decode_sim_header(b""), None);
    }

    #[test]
    fn acquisition_is_exclusive() {
        let source = SimMediaSource::new();
        let constraints = StreamConstraints::audio_only();

        let first = source.acquire(&constraints).unwrap();
        assert_eq!(source.active_streams(), 1);

        // Fail fast, never queue.
        let second = source.acquire(&constraints);
        assert!(matches!(second, Err(CaptureError::ResourceUnavailable(_))));

        drop(first);
        assert_eq!(source.active_streams(), 0);
        assert!(source.acquire(&constraints).is_ok());
    }

    #[test]
    fn dropping_a_handle_stops_tracks() {
        let source = SimMediaSource::new();
        {
            let mut handle = source
                .acquire(&StreamConstraints::audio_only())
                .unwrap();
            handle.start_recording().unwrap();
        }
        assert_eq!(source.active_streams(), 0);
    }

    #[test]
    fn permission_and_availability_errors() {
        let denied = SimMediaSource::without_permission();
        assert!(matches!(
            denied.acquire(&StreamConstraints::audio_only()),
            Err(CaptureError::PermissionDenied)
        ));

        let missing = SimMediaSource::unavailable();
        assert!(!missing.is_available());
        assert!(matches!(
            missing.acquire(&StreamConstraints::audio_only()),
            Err(CaptureError::ResourceUnavailable(_))
        ));
    }

    #[test]
    fn recorded_video_is_reopenable() {
        let source = SimMediaSource::new().with_recording(12.0, 2048);
        let config = crate::models::config::CaptureConfig::default();
        let mut handle = source
            .acquire(&StreamConstraints::video(&config))
            .unwrap();
        handle.start_recording().unwrap();
        let bytes = handle.stop_recording().unwrap();

        assert_eq!(decode_sim_header(&bytes), Some((1280, 720, 12.0)));
        assert_eq!(bytes.len(), 2048);
    }

    #[test]
    fn encoder_size_model_scales_with_quality() {
        let factory = SimCodecFactory::new();
        let sizes: Vec<u64> = [0.7f32, 0.5, 0.3]
            .iter()
            .map(|&quality| {
                let settings = EncoderSettings {
                    width: 640,
                    height: 360,
                    frame_rate: 15,
                    video_bitrate: 345_600,
                    audio_bitrate: 64_000,
                    quality,
                };
                let mut encoder = factory
                    .new_video_encoder(VideoCodec::Vp9, &settings)
                    .unwrap();
                let frame = RasterFrame {
                    width: 640,
                    height: 360,
                    pixels: Bytes::from(vec![0u8; 640 * 360 * 4]),
                };
                for i in 0..150 {
                    encoder.push_frame(i as f64 / 15.0, &frame).unwrap();
                }
                encoder.finish().unwrap().len() as u64
            })
            .collect();
        assert!(sizes[0] > sizes[1]);
        assert!(sizes[1] > sizes[2]);
    }

    #[test]
    fn encoder_rejects_odd_dimensions() {
        let factory = SimCodecFactory::new();
        let settings = EncoderSettings {
            width: 641,
            height: 360,
            frame_rate: 15,
            video_bitrate: 345_600,
            audio_bitrate: 64_000,
            quality: 0.7,
        };
        let mut encoder = factory
            .new_video_encoder(VideoCodec::Vp9, &settings)
            .unwrap();
        let frame = RasterFrame {
            width: 641,
            height: 360,
            pixels: Bytes::new(),
        };
        assert!(matches!(
            encoder.push_frame(0.0, &frame),
            Err(CaptureError::EncodingFailed(_))
        ));
    }

    #[test]
    fn stills_look_like_jpegs() {
        let factory = SimCodecFactory::new();
        let frame = RasterFrame {
            width: 640,
            height: 480,
            pixels: Bytes::from(vec![0u8; 640 * 480 * 4]),
        };
        let jpeg = factory.encode_still(&frame, 0.8).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        assert_eq!(&jpeg[jpeg.len() - 2..], &[0xFF, 0xD9]);
    }

    #[test]
    fn backend_reports_scripted_progress() {
        let backend = SimNoteBackend::new();
        let artifact = sim_video_artifact(640, 360, 5.0, 1024);
        let request = UploadRequest {
            artifact: &artifact,
            project_id: "p1",
            subarea_id: None,
        };

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink: ProgressSink = {
            let seen = Arc::clone(&seen);
            Arc::new(move |f| seen.lock().push(f))
        };
        let receipt = backend.upload(&request, sink).unwrap();

        assert_eq!(*seen.lock(), vec![0.25, 0.5, 0.75, 1.0]);
        assert_eq!(receipt.note_id, "note-1");
        assert!(matches!(receipt.ai, AiMetadata::Video { .. }));
    }

    #[test]
    fn fail_next_upload_fails_exactly_once() {
        let backend = SimNoteBackend::new();
        backend.fail_next_upload(CaptureError::AuthExpired);
        let artifact = sim_video_artifact(640, 360, 5.0, 1024);
        let request = UploadRequest {
            artifact: &artifact,
            project_id: "p1",
            subarea_id: None,
        };
        let sink: ProgressSink = Arc::new(|_| {});

        assert_eq!(
            backend.upload(&request, Arc::clone(&sink)).unwrap_err(),
            CaptureError::AuthExpired
        );
        assert!(backend.upload(&request, sink).is_ok());
    }
}
