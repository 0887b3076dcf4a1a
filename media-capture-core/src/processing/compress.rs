use log::{debug, info, warn};

use crate::models::artifact::{ArtifactKind, MediaArtifact};
use crate::models::config::CaptureConfig;
use crate::models::error::CaptureError;
use crate::processing::sampler::FrameSampler;
use crate::traits::codec::{EncoderFactory, EncoderSettings, VideoCodec};

/// Quality band split: above this the ceiling is the full capture
/// resolution, below it the encode drops to the reduced ceiling.
const QUALITY_BAND_SPLIT: f32 = 0.5;
const CEILING_HIGH: u32 = 1280;
const CEILING_LOW: u32 = 640;

const MIN_VIDEO_BITRATE: u32 = 200_000;
const MAX_VIDEO_BITRATE: u32 = 800_000;

/// One re-encode pass, recorded for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionAttempt {
    pub quality: f32,
    pub width: u32,
    pub height: u32,
    pub video_bitrate: u32,
    pub output_bytes: u64,
}

/// Result of a compression run.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionOutcome {
    pub artifact: MediaArtifact,
    /// False when the quality floor was reached without meeting the budget;
    /// the artifact is then the best (last) attempt.
    pub budget_met: bool,
    pub attempts: Vec<CompressionAttempt>,
}

/// Re-encodes a raw video artifact at decreasing quality/resolution until a
/// byte budget is met or the quality floor is reached.
///
/// The codec is resolved once at device acquisition and handed in here; the
/// ladder never re-probes support. Failures are recoverable: the caller
/// falls back to the raw artifact instead of interrupting the capture flow.
pub struct AdaptiveCompressor<'a> {
    factory: &'a dyn EncoderFactory,
    codec: VideoCodec,
    config: &'a CaptureConfig,
}

impl<'a> AdaptiveCompressor<'a> {
    pub fn new(factory: &'a dyn EncoderFactory, codec: VideoCodec, config: &'a CaptureConfig) -> Self {
        Self {
            factory,
            codec,
            config,
        }
    }

    pub fn compress(
        &self,
        source: &MediaArtifact,
        budget: u64,
    ) -> Result<CompressionOutcome, CaptureError> {
        if source.len() <= budget {
            debug!(
                "compression no-op: {} bytes within {} byte budget",
                source.len(),
                budget
            );
            return Ok(CompressionOutcome {
                artifact: source.clone(),
                budget_met: true,
                attempts: Vec::new(),
            });
        }

        let mut seeker = self
            .factory
            .open_seeker(source)
            .map_err(|e| CaptureError::CompressionFailed(e.to_string()))?;
        let (src_width, src_height) = seeker.dimensions();

        let mut quality = self.config.initial_quality;
        let mut attempts = Vec::new();
        let mut best: Option<MediaArtifact> = None;

        loop {
            let (width, height) =
                target_dimensions(src_width, src_height, resolution_ceiling(quality));
            let settings = EncoderSettings {
                width,
                height,
                frame_rate: self.config.sample_fps,
                video_bitrate: video_bitrate(width, height, self.config.sample_fps),
                audio_bitrate: self.config.audio_bitrate,
                quality,
            };

            let encoded = {
                let sampler =
                    FrameSampler::new(seeker.as_mut(), settings.frame_rate, width, height);
                let mut encoder = self
                    .factory
                    .new_video_encoder(self.codec, &settings)
                    .map_err(|e| CaptureError::CompressionFailed(e.to_string()))?;
                let mut result = Ok(());
                for item in sampler {
                    match item.and_then(|(ts, frame)| encoder.push_frame(ts, &frame)) {
                        Ok(()) => {}
                        Err(e) => {
                            result = Err(e);
                            break;
                        }
                    }
                }
                result
                    .and_then(|()| encoder.finish())
                    .map_err(|e| CaptureError::CompressionFailed(e.to_string()))?
            };

            let artifact =
                MediaArtifact::new(ArtifactKind::Video, self.codec.mime_type(), encoded);
            let output_bytes = artifact.len();
            debug!(
                "compression attempt q={:.1} {}x{} -> {} bytes (budget {})",
                quality, width, height, output_bytes, budget
            );
            attempts.push(CompressionAttempt {
                quality,
                width,
                height,
                video_bitrate: settings.video_bitrate,
                output_bytes,
            });
            best = Some(artifact);

            if output_bytes <= budget {
                info!(
                    "compression met budget after {} attempt(s): {} bytes",
                    attempts.len(),
                    output_bytes
                );
                return Ok(CompressionOutcome {
                    artifact: best.unwrap_or_else(|| source.clone()),
                    budget_met: true,
                    attempts,
                });
            }

            // f32 ladder steps accumulate error; compare with a small slack
            // so the floor attempt itself still runs.
            if quality - self.config.quality_step < self.config.quality_floor - 1e-4 {
                warn!(
                    "compression reached quality floor without meeting budget: {} bytes > {}",
                    output_bytes, budget
                );
                return Ok(CompressionOutcome {
                    artifact: best.unwrap_or_else(|| source.clone()),
                    budget_met: false,
                    attempts,
                });
            }
            quality -= self.config.quality_step;
        }
    }
}

/// Long-edge ceiling for the given quality band.
pub(crate) fn resolution_ceiling(quality: f32) -> u32 {
    if quality > QUALITY_BAND_SPLIT {
        CEILING_HIGH
    } else {
        CEILING_LOW
    }
}

/// Scales the source to fit the ceiling, preserving aspect ratio and
/// rounding both dimensions down to even numbers (codec constraint). Never
/// upscales.
pub(crate) fn target_dimensions(src_width: u32, src_height: u32, ceiling: u32) -> (u32, u32) {
    let long_edge = src_width.max(src_height).max(1);
    let scale = (f64::from(ceiling) / f64::from(long_edge)).min(1.0);
    let width = make_even((f64::from(src_width) * scale) as u32);
    let height = make_even((f64::from(src_height) * scale) as u32);
    (width, height)
}

fn make_even(value: u32) -> u32 {
    (value & !1).max(2)
}

/// Bitrate from the raster area at the sampling rate, clamped to the range
/// the encoder handles well.
pub(crate) fn video_bitrate(width: u32, height: u32, fps: u32) -> u32 {
    let raw = f64::from(width) * f64::from(height) * 0.1 * f64::from(fps);
    (raw as u32).clamp(MIN_VIDEO_BITRATE, MAX_VIDEO_BITRATE)
}
