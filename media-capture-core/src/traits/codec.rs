use bytes::Bytes;

use crate::models::artifact::MediaArtifact;
use crate::models::error::CaptureError;
use crate::traits::media_source::RasterFrame;

/// Video codecs the pipeline knows how to ask the platform for, ordered by
/// preference in [`VideoCodec::PREFERENCE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoCodec {
    /// Efficient modern codec, preferred when the platform supports it.
    Vp9,
    /// Broad-compatibility fallback.
    Vp8,
    /// Container default with no explicit codec parameters.
    Webm,
}

impl VideoCodec {
    /// Fallback chain, most preferred first. Evaluated once per device
    /// acquisition via [`select_codec`], never re-probed per compression
    /// attempt.
    pub const PREFERENCE: [VideoCodec; 3] = [VideoCodec::Vp9, VideoCodec::Vp8, VideoCodec::Webm];

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Vp9 => "video/webm;codecs=vp9",
            Self::Vp8 => "video/webm;codecs=vp8",
            Self::Webm => "video/webm",
        }
    }
}

/// Walks the preference chain and returns the first codec the platform
/// supports.
pub fn select_codec(factory: &dyn EncoderFactory) -> Result<VideoCodec, CaptureError> {
    VideoCodec::PREFERENCE
        .iter()
        .copied()
        .find(|codec| factory.supports(*codec))
        .ok_or_else(|| CaptureError::EncodingFailed("no supported video codec".into()))
}

/// Settings for one re-encode pass.
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderSettings {
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
    /// Computed video bitrate in bits per second.
    pub video_bitrate: u32,
    /// Audio bitrate passed through unchanged (bps).
    pub audio_bitrate: u32,
    /// VBR quality knob in 0.0..=1.0; falls with each compression attempt.
    pub quality: f32,
}

/// One encoder instance, fed frame by frame and finalized into a container
/// buffer.
pub trait VideoEncoder: Send {
    fn push_frame(&mut self, timestamp_secs: f64, frame: &RasterFrame) -> Result<(), CaptureError>;

    fn finish(self: Box<Self>) -> Result<Bytes, CaptureError>;
}

/// Pull-based access to the decoded frames of a finalized video artifact.
///
/// The compressor drives this by seeking to successive timestamps; the next
/// frame is decoded only after the previous one has been consumed, which
/// gives the encoder backpressure over the decode loop.
pub trait VideoFrameSeeker: Send {
    fn duration_secs(&self) -> f64;

    /// Native dimensions of the encoded stream.
    fn dimensions(&self) -> (u32, u32);

    /// Decode the frame nearest `timestamp_secs`, scaled into a
    /// `width` x `height` raster.
    fn frame_at(
        &mut self,
        timestamp_secs: f64,
        width: u32,
        height: u32,
    ) -> Result<RasterFrame, CaptureError>;
}

/// Platform codec factory: probing, encoding, decoding, and stills.
pub trait EncoderFactory: Send + Sync {
    fn supports(&self, codec: VideoCodec) -> bool;

    fn new_video_encoder(
        &self,
        codec: VideoCodec,
        settings: &EncoderSettings,
    ) -> Result<Box<dyn VideoEncoder>, CaptureError>;

    fn open_seeker(
        &self,
        artifact: &MediaArtifact,
    ) -> Result<Box<dyn VideoFrameSeeker>, CaptureError>;

    /// Encode one raster frame as a JPEG still at the given quality.
    fn encode_still(&self, frame: &RasterFrame, quality: f32) -> Result<Bytes, CaptureError>;
}
