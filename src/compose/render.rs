use crate::compose::compositor::Compositor;
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{WavyteError, WavyteResult};

/// Render statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Frames pushed to the sink.
    pub frames_total: u64,
}

/// Number of output frames for a clip of `duration` seconds: `floor(duration * fps)`, at least 1.
pub fn frame_count(compositor: &Compositor, duration: f64) -> u64 {
    compositor.fps().secs_to_frames_floor(duration).max(1)
}

/// Compose every frame of a `duration`-second clip into `sink`.
///
/// Frame `i` is composed at `t = i / fps` and pushed in strictly increasing index order. The
/// compositor is closed afterwards whether or not rendering succeeded; a render error takes
/// precedence over a close error.
#[tracing::instrument(skip(compositor, sink))]
pub fn render_clip(
    compositor: &mut Compositor,
    duration: f64,
    sink: &mut dyn FrameSink,
) -> WavyteResult<RenderStats> {
    let rendered = render_frames(compositor, duration, sink);
    let closed = compositor.close();
    let stats = rendered?;
    closed?;
    Ok(stats)
}

fn render_frames(
    compositor: &mut Compositor,
    duration: f64,
    sink: &mut dyn FrameSink,
) -> WavyteResult<RenderStats> {
    if !duration.is_finite() || duration <= 0.0 {
        return Err(WavyteError::validation("render duration must be > 0"));
    }
    let fps = compositor.fps();
    let frames = frame_count(compositor, duration);
    tracing::debug!(frames, %fps, "rendering clip");

    sink.begin(SinkConfig {
        width: compositor.width(),
        height: compositor.height(),
        fps,
    })?;
    for i in 0..frames {
        let frame = compositor.read_next_frame(fps.frames_to_secs(i))?;
        sink.push_frame(FrameIndex(i), &frame)?;
    }
    sink.end()?;

    Ok(RenderStats {
        frames_total: frames,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/compose/render.rs"]
mod tests;
