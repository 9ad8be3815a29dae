use crate::canvas::surface::Canvas;
use crate::foundation::error::WavyteResult;
use crate::source::color::Color;
use crate::source::{FrameOutput, FrameSource, SourceContext};

/// Params of a `fill-color` layer.
#[derive(Clone, Copy, Debug, serde::Deserialize)]
pub struct FillParams {
    /// Fill color; opaque black when omitted.
    #[serde(default = "black")]
    pub color: Color,
}

fn black() -> Color {
    Color::BLACK
}

/// Paints one color over the whole canvas.
#[derive(Clone, Copy, Debug)]
pub struct FillColorSource {
    color: Color,
}

impl FillColorSource {
    /// Source painting `color`.
    pub fn new(color: Color) -> Self {
        Self { color }
    }
}

impl FrameSource for FillColorSource {
    fn read_next_frame(
        &mut self,
        _progress: f64,
        canvas: &mut Canvas,
        _time: f64,
    ) -> WavyteResult<FrameOutput> {
        canvas.fill(self.color.0)?;
        Ok(FrameOutput::DrawnToCanvas)
    }
}

pub(crate) fn create(ctx: &SourceContext<'_>) -> WavyteResult<Box<dyn FrameSource>> {
    let params: FillParams = ctx.params()?;
    Ok(Box::new(FillColorSource::new(params.color)))
}

#[cfg(test)]
#[path = "../../tests/unit/source/fill.rs"]
mod tests;
