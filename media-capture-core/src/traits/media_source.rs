use bytes::Bytes;

use crate::models::config::CaptureConfig;
use crate::models::error::CaptureError;

/// Constraints requested when acquiring the device media source.
///
/// Capture requests the lowest viable resolution/frame rate for the mode so
/// raw recordings stay small; the voice sub-recorder requests audio only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConstraints {
    pub video: bool,
    pub audio: bool,
    pub max_width: u32,
    pub max_height: u32,
    pub frame_rate: u32,
}

impl StreamConstraints {
    /// Photo mode: video track only, any frame will do.
    pub fn photo(config: &CaptureConfig) -> Self {
        Self {
            video: true,
            audio: false,
            max_width: config.max_capture_width,
            max_height: config.max_capture_height,
            frame_rate: config.capture_frame_rate,
        }
    }

    /// Video mode: bounded frame rate plus an audio channel.
    pub fn video(config: &CaptureConfig) -> Self {
        Self {
            video: true,
            audio: true,
            max_width: config.max_capture_width,
            max_height: config.max_capture_height,
            frame_rate: config.capture_frame_rate,
        }
    }

    /// Voice notes: microphone only.
    pub fn audio_only() -> Self {
        Self {
            video: false,
            audio: true,
            max_width: 0,
            max_height: 0,
            frame_rate: 0,
        }
    }
}

/// One decoded video frame drawn into an off-screen raster buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterFrame {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA pixels, row-major.
    pub pixels: Bytes,
}

/// Exclusive handle to an acquired camera/microphone stream.
///
/// Dropping the handle stops every underlying track, so release happens on
/// all exit paths — discard, successful save, navigation away, teardown,
/// and panic unwind. Implementations must make `stop_all_tracks` idempotent
/// and call it from their `Drop`.
pub trait MediaSourceHandle: Send {
    /// Native dimensions of the video track, if one was requested.
    fn video_dimensions(&self) -> Option<(u32, u32)>;

    /// Container MIME type recordings from this stream are finalized as.
    fn recording_mime(&self) -> &str;

    /// Grab the current preview frame (still-photo path).
    fn grab_frame(&mut self) -> Result<RasterFrame, CaptureError>;

    /// Begin routing the stream into the platform recorder.
    fn start_recording(&mut self) -> Result<(), CaptureError>;

    /// Finalize the recording and return the raw container bytes.
    ///
    /// Stopping mid-flight is a first-class transition, not an error; the
    /// returned buffer is always a complete, finalized container.
    fn stop_recording(&mut self) -> Result<Bytes, CaptureError>;

    /// Stop all tracks. Idempotent; also invoked on drop.
    fn stop_all_tracks(&mut self);
}

/// Platform (or simulated) factory for device media streams.
///
/// The device is an exclusive, single-holder resource: `acquire` fails fast
/// with `ResourceUnavailable`/`PermissionDenied` when the hardware is busy
/// or access was denied — it never queues.
pub trait MediaSourceProvider: Send + Sync {
    fn is_available(&self) -> bool;

    fn acquire(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn MediaSourceHandle>, CaptureError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn photo_constraints_skip_audio() {
        let constraints = StreamConstraints::photo(&CaptureConfig::default());
        assert!(constraints.video);
        assert!(!constraints.audio);
        assert_eq!(constraints.max_width, 1280);
    }

    #[test]
    fn video_constraints_request_audio() {
        let constraints = StreamConstraints::video(&CaptureConfig::default());
        assert!(constraints.video);
        assert!(constraints.audio);
        assert_eq!(constraints.frame_rate, 24);
    }

    #[test]
    fn voice_constraints_are_audio_only() {
        let constraints = StreamConstraints::audio_only();
        assert!(!constraints.video);
        assert!(constraints.audio);
    }
}
