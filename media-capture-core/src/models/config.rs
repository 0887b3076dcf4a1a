/// Hard cap the backend enforces on uploaded files.
pub const DEFAULT_UPLOAD_CEILING: u64 = 25 * 1024 * 1024;
/// Compression target, kept a safety margin under the upload ceiling.
pub const DEFAULT_VIDEO_BUDGET: u64 = 20 * 1024 * 1024;

/// Tunables for a capture session.
///
/// Defaults reflect the deployed policy; `validate()` is called when a
/// session is created.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Byte budget the compressor aims for.
    pub video_byte_budget: u64,

    /// Hard cap enforced before an upload is confirmed.
    pub upload_byte_ceiling: u64,

    /// Frame sampling rate during re-encode passes.
    pub sample_fps: u32,

    /// Quality ladder: start, floor, and step of the re-encode loop.
    pub initial_quality: f32,
    pub quality_floor: f32,
    pub quality_step: f32,

    /// Audio bitrate passed through unchanged on every pass (bps).
    pub audio_bitrate: u32,

    /// Fixed JPEG quality for still photos.
    pub photo_quality: f32,

    /// Preview/recording constraints requested from the device. Kept at the
    /// lowest viable values so raw recordings stay small.
    pub max_capture_width: u32,
    pub max_capture_height: u32,
    pub capture_frame_rate: u32,

    /// Single auto-stop bound for voice notes, in seconds.
    pub voice_max_duration_secs: u64,
}

impl CaptureConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.video_byte_budget == 0 {
            return Err("video byte budget must be positive".into());
        }
        if self.upload_byte_ceiling < self.video_byte_budget {
            return Err("upload ceiling must not be below the compression budget".into());
        }
        if self.sample_fps == 0 || self.capture_frame_rate == 0 {
            return Err("frame rates must be positive".into());
        }
        if !(0.0..=1.0).contains(&self.quality_floor)
            || !(0.0..=1.0).contains(&self.initial_quality)
            || !(0.0..=1.0).contains(&self.photo_quality)
        {
            return Err("qualities must be within 0.0..=1.0".into());
        }
        if self.quality_floor > self.initial_quality {
            return Err("quality floor must not exceed the initial quality".into());
        }
        if self.quality_step <= 0.0 {
            return Err("quality step must be positive".into());
        }
        if self.voice_max_duration_secs == 0 {
            return Err("voice max duration must be positive".into());
        }
        Ok(())
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            video_byte_budget: DEFAULT_VIDEO_BUDGET,
            upload_byte_ceiling: DEFAULT_UPLOAD_CEILING,
            sample_fps: 15,
            initial_quality: 0.7,
            quality_floor: 0.3,
            quality_step: 0.1,
            audio_bitrate: 64_000,
            photo_quality: 0.8,
            max_capture_width: 1280,
            max_capture_height: 720,
            capture_frame_rate: 24,
            voice_max_duration_secs: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(CaptureConfig::default().validate().is_ok());
    }

    #[test]
    fn budget_must_fit_under_ceiling() {
        let config = CaptureConfig {
            video_byte_budget: 30 * 1024 * 1024,
            upload_byte_ceiling: 25 * 1024 * 1024,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn floor_above_initial_rejected() {
        let config = CaptureConfig {
            initial_quality: 0.4,
            quality_floor: 0.6,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_step_rejected() {
        let config = CaptureConfig {
            quality_step: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_voice_duration_rejected() {
        let config = CaptureConfig {
            voice_max_duration_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
