use crate::canvas::surface::Canvas;
use crate::foundation::core::{RawFrame, frame_byte_len};
use crate::foundation::error::{WavyteError, WavyteResult};
use crate::source::color::Color;
use crate::source::{FrameOutput, FrameSource, SourceContext};

/// Params of a `linear-gradient` layer.
#[derive(Clone, Copy, Debug, serde::Deserialize)]
pub struct GradientParams {
    /// Start (top-left) and end (bottom-right) colors.
    #[serde(default = "default_colors")]
    pub colors: [Color; 2],
}

fn default_colors() -> [Color; 2] {
    [Color::BLACK, Color::WHITE]
}

/// Diagonal two-color gradient returned as a full-canvas raw buffer.
///
/// The frame only depends on the output size, so it is rendered once at setup.
#[derive(Clone, Debug)]
pub struct LinearGradientSource {
    frame: RawFrame,
}

impl LinearGradientSource {
    /// Render the gradient for a `width x height` output.
    pub fn new(width: u32, height: u32, colors: [Color; 2]) -> WavyteResult<Self> {
        if width == 0 || height == 0 {
            return Err(WavyteError::validation(
                "gradient width/height must be non-zero",
            ));
        }
        let mut data = Vec::with_capacity(frame_byte_len(width, height)?);
        let span = f64::from(width - 1) + f64::from(height - 1);
        for y in 0..height {
            for x in 0..width {
                let t = if span > 0.0 {
                    f64::from(x + y) / span
                } else {
                    0.0
                };
                data.extend_from_slice(&colors[0].lerp(colors[1], t).0);
            }
        }
        Ok(Self {
            frame: RawFrame::new(width, height, data)?,
        })
    }
}

impl FrameSource for LinearGradientSource {
    fn read_next_frame(
        &mut self,
        _progress: f64,
        _canvas: &mut Canvas,
        _time: f64,
    ) -> WavyteResult<FrameOutput> {
        Ok(FrameOutput::Raw(self.frame.clone()))
    }
}

pub(crate) fn create(ctx: &SourceContext<'_>) -> WavyteResult<Box<dyn FrameSource>> {
    let params: GradientParams = ctx.params()?;
    Ok(Box::new(LinearGradientSource::new(
        ctx.width,
        ctx.height,
        params.colors,
    )?))
}

#[cfg(test)]
#[path = "../../tests/unit/source/gradient.rs"]
mod tests;
