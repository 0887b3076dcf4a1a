use std::io::{self, Read};

use media_capture_core::ProgressSink;

/// `Read` adapter that reports cumulative bytes to a progress sink as a
/// fraction of the total.
///
/// Fractions derive from bytes handed to the transport, so they are
/// naturally non-decreasing; the session clamps them again on its side
/// before they reach the UI.
pub struct ProgressReader<R> {
    inner: R,
    sent: u64,
    total: u64,
    sink: ProgressSink,
}

impl<R: Read> ProgressReader<R> {
    pub fn new(inner: R, total: u64, sink: ProgressSink) -> Self {
        Self {
            inner,
            sent: 0,
            total,
            sink,
        }
    }
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 && self.total > 0 {
            self.sent += n as u64;
            let fraction = (self.sent as f64 / self.total as f64).min(1.0) as f32;
            (self.sink)(fraction);
        }
        Ok(n)
    }
}
