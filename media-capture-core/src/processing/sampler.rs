use crate::models::error::CaptureError;
use crate::traits::codec::VideoFrameSeeker;
use crate::traits::media_source::RasterFrame;

/// Pull-based iterator over `(timestamp, frame)` pairs sampled at a fixed
/// rate from a finalized video stream.
///
/// Each call to `next` seeks the source to the following timestamp and
/// decodes exactly one frame into the target raster dimensions, so the
/// consumer controls the pace of the decode loop. A decode error yields one
/// `Err` item and ends the iteration.
pub struct FrameSampler<'a> {
    seeker: &'a mut dyn VideoFrameSeeker,
    width: u32,
    height: u32,
    interval_secs: f64,
    // Timestamps derive from the frame index so they do not accumulate
    // floating-point drift over long clips.
    frame_index: u64,
    duration_secs: f64,
    failed: bool,
}

impl<'a> FrameSampler<'a> {
    pub fn new(seeker: &'a mut dyn VideoFrameSeeker, fps: u32, width: u32, height: u32) -> Self {
        let duration_secs = seeker.duration_secs();
        Self {
            seeker,
            width,
            height,
            interval_secs: 1.0 / f64::from(fps.max(1)),
            frame_index: 0,
            duration_secs,
            failed: false,
        }
    }

    pub fn frames_emitted(&self) -> u64 {
        self.frame_index
    }
}

impl Iterator for FrameSampler<'_> {
    type Item = Result<(f64, RasterFrame), CaptureError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let timestamp = self.frame_index as f64 * self.interval_secs;
        if timestamp >= self.duration_secs {
            return None;
        }
        match self.seeker.frame_at(timestamp, self.width, self.height) {
            Ok(frame) => {
                self.frame_index += 1;
                Some(Ok((timestamp, frame)))
            }
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}
