//! # media-capture-core
//!
//! Platform-agnostic media capture core library.
//!
//! Turns a live camera/microphone feed into a size-bounded binary artifact,
//! tracks it through a capture → preview → edit → upload lifecycle, and
//! reconciles AI-produced metadata with user edits. Platform integrations
//! (device streams, hardware codecs) and transport backends implement the
//! traits in `traits/` and plug into the generic session.
//!
//! ## Architecture
//!
//! ```text
//! media-capture-core (this crate)
//! ├── traits/       ← MediaSourceProvider, EncoderFactory, NoteBackend,
//! │                   Transcriber, AuthTokenProvider, SessionDelegate
//! ├── models/       ← CaptureError, SessionState, CaptureConfig,
//! │                   MediaArtifact, NoteMetadata
//! ├── processing/   ← FrameSampler, AdaptiveCompressor
//! ├── session/      ← CaptureSession (orchestrator), VoiceRecorder
//! └── sim           ← simulated devices/codecs for development and tests
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod sim;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::artifact::{ArtifactKind, MediaArtifact};
pub use models::config::CaptureConfig;
pub use models::error::{CaptureError, CaptureWarning};
pub use models::metadata::{AiMetadata, NoteMetadata};
pub use models::state::{CaptureMode, SessionState};
pub use processing::compress::{AdaptiveCompressor, CompressionAttempt, CompressionOutcome};
pub use processing::sampler::FrameSampler;
pub use session::{CaptureSession, Collaborators, SessionDiagnostics, VoiceRecorder};
pub use traits::backend::{
    AuthTokenProvider, NoteBackend, NoteDetails, ProgressSink, Transcriber, UploadReceipt,
    UploadRequest,
};
pub use traits::codec::{
    select_codec, EncoderFactory, EncoderSettings, VideoCodec, VideoEncoder, VideoFrameSeeker,
};
pub use traits::delegate::SessionDelegate;
pub use traits::media_source::{
    MediaSourceHandle, MediaSourceProvider, RasterFrame, StreamConstraints,
};
