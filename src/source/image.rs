use std::path::{Path, PathBuf};

use anyhow::Context;
use image::{RgbaImage, imageops::FilterType};

use crate::canvas::surface::{Canvas, PlacedImage};
use crate::foundation::error::WavyteResult;
use crate::geometry::resize::{
    OriginX, OriginY, ResizeMode, ResizePlan, base_position, resolve_requested,
};
use crate::source::placement::LayerPlacement;
use crate::source::{FrameOutput, FrameSource, SourceContext};

/// Params of an `image` layer. Geometry keys mean the same as for `video`.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageParams {
    /// Image file (any format the `image` crate decodes).
    pub path: PathBuf,
    /// Box width as a fraction of the canvas width.
    #[serde(default)]
    pub width: Option<f64>,
    /// Box height as a fraction of the canvas height.
    #[serde(default)]
    pub height: Option<f64>,
    /// Anchor x as a fraction of the canvas width.
    #[serde(default)]
    pub left: f64,
    /// Anchor y as a fraction of the canvas height.
    #[serde(default)]
    pub top: f64,
    /// Horizontal anchor.
    #[serde(default)]
    pub origin_x: OriginX,
    /// Vertical anchor.
    #[serde(default)]
    pub origin_y: OriginY,
    /// Fit policy.
    #[serde(default)]
    pub resize_mode: ResizeMode,
}

/// A still image decoded and fitted once, then drawn on every pull.
#[derive(Debug)]
pub struct ImageFrameSource {
    placement: LayerPlacement,
    image: PlacedImage,
    background: Option<PlacedImage>,
}

impl ImageFrameSource {
    /// Decode the file and prepare the placed image.
    #[tracing::instrument(skip_all, fields(layer = %ctx.layer.kind))]
    pub fn new(ctx: &SourceContext<'_>) -> WavyteResult<Self> {
        let params: ImageParams = ctx.params()?;
        let decoded = load_rgba(&params.path)?;
        let plan = ResizePlan::compute(
            decoded.width(),
            decoded.height(),
            resolve_requested(params.width, ctx.width),
            resolve_requested(params.height, ctx.height),
            params.resize_mode,
        )?;
        let base = base_position(params.left, params.top, ctx.width, ctx.height);
        let placement = LayerPlacement::new(
            plan,
            base,
            params.origin_x,
            params.origin_y,
            ctx.layer.post_process.clone(),
        );
        Self::from_rgba(placement, &decoded)
    }

    /// Fit an already decoded image to `placement`'s plan.
    pub fn from_rgba(placement: LayerPlacement, decoded: &RgbaImage) -> WavyteResult<Self> {
        let fitted = fit(decoded, placement.plan());
        let image = placement.decode(fitted.into_raw())?;
        let background = placement.background(&image)?;
        Ok(Self {
            placement,
            image,
            background,
        })
    }
}

impl FrameSource for ImageFrameSource {
    fn read_next_frame(
        &mut self,
        progress: f64,
        canvas: &mut Canvas,
        time: f64,
    ) -> WavyteResult<FrameOutput> {
        self.placement.draw(
            self.image.clone(),
            self.background.as_ref(),
            canvas,
            progress,
            time,
        )?;
        Ok(FrameOutput::DrawnToCanvas)
    }
}

fn load_rgba(path: &Path) -> WavyteResult<RgbaImage> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
    let img = image::load_from_memory(&bytes)
        .with_context(|| format!("decode image '{}'", path.display()))?;
    Ok(img.to_rgba8())
}

/// Scale (and for `cover`, crop) the way the video decoder's filter chain would.
fn fit(src: &RgbaImage, plan: &ResizePlan) -> RgbaImage {
    let scaled = image::imageops::resize(
        src,
        plan.scaled_width,
        plan.scaled_height,
        FilterType::Triangle,
    );
    match plan.crop {
        Some(c) => image::imageops::crop_imm(&scaled, c.x, c.y, c.width, c.height).to_image(),
        None => scaled,
    }
}

pub(crate) fn create(ctx: &SourceContext<'_>) -> WavyteResult<Box<dyn FrameSource>> {
    Ok(Box::new(ImageFrameSource::new(ctx)?))
}

#[cfg(test)]
#[path = "../../tests/unit/source/image.rs"]
mod tests;
