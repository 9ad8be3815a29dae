/// Byte accumulator that turns arbitrarily fragmented chunks into fixed-size frames.
///
/// Holds the pending bytes of a partially received frame plus any bytes already received for
/// the frames after it. `len <= capacity` always holds; capacity grows to fit oversized chunks
/// and never shrinks.
#[derive(Debug)]
pub struct ReassemblyBuffer {
    buf: Vec<u8>,
    len: usize,
    frame_len: usize,
}

impl ReassemblyBuffer {
    /// Create a buffer for frames of exactly `frame_len` bytes (must be non-zero).
    pub fn new(frame_len: usize) -> Self {
        debug_assert!(frame_len > 0);
        Self {
            buf: vec![0u8; frame_len],
            len: 0,
            frame_len,
        }
    }

    /// Size of one frame in bytes.
    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    /// Number of valid buffered bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` when no bytes are buffered.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Allocated capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// `true` when at least one full frame is buffered.
    pub fn has_frame(&self) -> bool {
        self.len >= self.frame_len
    }

    /// Append a received chunk, growing capacity first if it does not fit.
    pub fn append(&mut self, bytes: &[u8]) {
        let needed = self.len + bytes.len();
        if needed > self.buf.len() {
            let grown = needed.max(self.buf.len() * 2);
            self.buf.resize(grown, 0);
        }
        self.buf[self.len..needed].copy_from_slice(bytes);
        self.len = needed;
    }

    /// Remove and return the first `n` buffered bytes, shifting the rest to the front.
    ///
    /// Returns `None` (and leaves the buffer untouched) when fewer than `n` bytes are buffered.
    pub fn take(&mut self, n: usize) -> Option<Vec<u8>> {
        if n > self.len {
            return None;
        }
        let out = self.buf[..n].to_vec();
        self.buf.copy_within(n..self.len, 0);
        self.len -= n;
        Some(out)
    }

    /// Take one complete frame, if buffered.
    pub fn take_frame(&mut self) -> Option<Vec<u8>> {
        self.take(self.frame_len)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/reassembly.rs"]
mod tests;
