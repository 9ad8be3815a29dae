use crate::foundation::core::{Fps, FrameIndex, RawFrame};
use crate::foundation::error::{WavyteError, WavyteResult};

/// Configuration handed to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frames-per-second.
    pub fps: Fps,
}

/// Consumer of composed frames, e.g. an encoder.
///
/// Ordering contract: `push_frame` is called in strictly increasing `FrameIndex` order.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> WavyteResult<()>;
    /// Push one frame.
    fn push_frame(&mut self, idx: FrameIndex, frame: &RawFrame) -> WavyteResult<()>;
    /// Called once after the last frame is pushed.
    fn end(&mut self) -> WavyteResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, RawFrame)>,
    ended: bool,
}

impl InMemorySink {
    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    /// Captured frames in push order.
    pub fn frames(&self) -> &[(FrameIndex, RawFrame)] {
        &self.frames
    }

    /// `true` once `end` was called.
    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> WavyteResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.ended = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &RawFrame) -> WavyteResult<()> {
        let Some(cfg) = self.cfg else {
            return Err(WavyteError::evaluation("push_frame called before begin"));
        };
        if let Some((last, _)) = self.frames.last()
            && idx <= *last
        {
            return Err(WavyteError::evaluation(format!(
                "frame {} pushed after frame {}",
                idx.0, last.0
            )));
        }
        if (frame.width, frame.height) != (cfg.width, cfg.height) {
            return Err(WavyteError::integrity(format!(
                "sink expects {}x{} frames, got {}x{}",
                cfg.width, cfg.height, frame.width, frame.height
            )));
        }
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> WavyteResult<()> {
        self.ended = true;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
