use std::sync::Arc;

use crate::canvas::composite::over_in_place;
use crate::foundation::core::{RawFrame, Rect};
use crate::foundation::error::{WavyteError, WavyteResult};
use crate::foundation::math::{premultiply, unpremultiply};
use crate::geometry::resize::{OriginX, OriginY};

/// Per-frame drawing surface holding premultiplied RGBA8 pixels.
///
/// Created blank for every output frame, painted in layer order, then serialized back to
/// straight-alpha RGBA with [`Canvas::into_raw_frame`]. Drawing goes through `vello_cpu`: each
/// draw is rendered into a scratch pixmap and then composited over what is already there.
pub struct Canvas {
    pixmap: vello_cpu::Pixmap,
    scratch: vello_cpu::Pixmap,
    ctx: Option<vello_cpu::RenderContext>,
}

impl std::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvas")
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .finish()
    }
}

impl Canvas {
    /// Transparent canvas of the given size. Both sides must fit in `u16`.
    pub fn new(width: u32, height: u32) -> WavyteResult<Self> {
        if width == 0 || height == 0 {
            return Err(WavyteError::validation("canvas width/height must be non-zero"));
        }
        let (w, h) = pixmap_size(width, height)?;
        Ok(Self {
            pixmap: vello_cpu::Pixmap::new(w, h),
            scratch: vello_cpu::Pixmap::new(w, h),
            ctx: None,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        u32::from(self.pixmap.width())
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        u32::from(self.pixmap.height())
    }

    /// Premultiplied pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let i = (y as usize * self.width() as usize + x as usize) * 4;
        let data = self.pixmap.data_as_u8_slice();
        Some([data[i], data[i + 1], data[i + 2], data[i + 3]])
    }

    /// `true` when no pixel has been painted.
    pub fn is_blank(&self) -> bool {
        self.pixmap.data_as_u8_slice().iter().all(|&b| b == 0)
    }

    /// Paint a straight-alpha color over the whole canvas.
    pub fn fill(&mut self, rgba: [u8; 4]) -> WavyteResult<()> {
        let full = Rect::new(0.0, 0.0, f64::from(self.width()), f64::from(self.height()));
        self.fill_rect(full, rgba)
    }

    /// Paint a straight-alpha color over `rect`, antialiased at fractional edges.
    pub fn fill_rect(&mut self, rect: Rect, rgba: [u8; 4]) -> WavyteResult<()> {
        if rgba[3] == 0 || rect.abs().area() <= 0.0 {
            return Ok(());
        }
        let [r, g, b, a] = rgba;
        self.render(|ctx| {
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(rect.x0, rect.y0, rect.x1, rect.y1));
        })
    }

    /// Composite a placed image over the canvas.
    ///
    /// The image is drawn as an image paint under the affine given by its anchor, position and
    /// scale; opacity below one goes through an opacity layer.
    pub fn add(&mut self, img: &PlacedImage) -> WavyteResult<()> {
        let bounds = img.bounds();
        if !(bounds.width() > 0.0 && bounds.height() > 0.0) {
            return Ok(());
        }
        let opacity = img.opacity.clamp(0.0, 1.0) as f32;
        if opacity <= 0.0 {
            return Ok(());
        }
        let canvas = Rect::new(0.0, 0.0, f64::from(self.width()), f64::from(self.height()));
        if bounds.intersect(canvas).area() <= 0.0 {
            return Ok(());
        }

        let transform = vello_cpu::kurbo::Affine::translate((bounds.x0, bounds.y0))
            * vello_cpu::kurbo::Affine::scale_non_uniform(img.scale_x, img.scale_y);
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(img.pixmap.clone()),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        let (w, h) = (f64::from(img.width), f64::from(img.height));
        self.render(|ctx| {
            ctx.set_transform(transform);
            ctx.set_paint(paint);
            if opacity < 1.0 {
                ctx.push_opacity_layer(opacity);
            }
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, w, h));
            if opacity < 1.0 {
                ctx.pop_layer();
            }
        })
    }

    /// Serialize to straight-alpha RGBA.
    pub fn into_raw_frame(self) -> RawFrame {
        let mut data = self.pixmap.data_as_u8_slice().to_vec();
        for px in data.chunks_exact_mut(4) {
            let out = unpremultiply([px[0], px[1], px[2], px[3]]);
            px.copy_from_slice(&out);
        }
        RawFrame {
            width: self.width(),
            height: self.height(),
            data,
        }
    }

    /// `vello_cpu` renders into a fresh buffer, so draw into the scratch pixmap and composite
    /// it over the canvas.
    fn render(&mut self, draw: impl FnOnce(&mut vello_cpu::RenderContext)) -> WavyteResult<()> {
        let (w, h) = (self.pixmap.width(), self.pixmap.height());
        let mut ctx = match self.ctx.take() {
            Some(ctx) => ctx,
            None => vello_cpu::RenderContext::new(w, h),
        };
        ctx.reset();
        ctx.set_blend_mode(vello_cpu::peniko::BlendMode::default());
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        draw(&mut ctx);
        ctx.flush();

        self.scratch.data_as_u8_slice_mut().fill(0);
        ctx.render_to_pixmap(&mut self.scratch);
        self.ctx = Some(ctx);
        over_in_place(
            self.pixmap.data_as_u8_slice_mut(),
            self.scratch.data_as_u8_slice(),
            1.0,
        )
    }
}

/// An image ready to be added to a [`Canvas`], with its drawing parameters.
///
/// `left`/`top` locate the anchor point given by `origin_x`/`origin_y`; the drawn size is the
/// pixel size times `scale_x`/`scale_y`. Post-processing hooks may change any public field.
#[derive(Clone)]
pub struct PlacedImage {
    width: u32,
    height: u32,
    pixmap: Arc<vello_cpu::Pixmap>,
    /// Anchor x in canvas pixels.
    pub left: f64,
    /// Anchor y in canvas pixels.
    pub top: f64,
    /// Horizontal anchor.
    pub origin_x: OriginX,
    /// Vertical anchor.
    pub origin_y: OriginY,
    /// Horizontal scale factor.
    pub scale_x: f64,
    /// Vertical scale factor.
    pub scale_y: f64,
    /// Opacity multiplier in `[0, 1]`.
    pub opacity: f64,
}

impl std::fmt::Debug for PlacedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlacedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("left", &self.left)
            .field("top", &self.top)
            .field("origin_x", &self.origin_x)
            .field("origin_y", &self.origin_y)
            .field("scale_x", &self.scale_x)
            .field("scale_y", &self.scale_y)
            .field("opacity", &self.opacity)
            .finish()
    }
}

impl PlacedImage {
    /// Wrap straight-alpha RGBA bytes; the length must be exactly `width * height * 4`.
    pub fn from_rgba(width: u32, height: u32, mut rgba: Vec<u8>) -> WavyteResult<Self> {
        for px in rgba.chunks_exact_mut(4) {
            let out = premultiply([px[0], px[1], px[2], px[3]]);
            px.copy_from_slice(&out);
        }
        Self::from_premul(width, height, &rgba)
    }

    pub(crate) fn from_premul(width: u32, height: u32, premul: &[u8]) -> WavyteResult<Self> {
        let pixmap = pixmap_from_premul_bytes(premul, width, height)?;
        Ok(Self {
            width,
            height,
            pixmap: Arc::new(pixmap),
            left: 0.0,
            top: 0.0,
            origin_x: OriginX::Left,
            origin_y: OriginY::Top,
            scale_x: 1.0,
            scale_y: 1.0,
            opacity: 1.0,
        })
    }

    /// Intrinsic width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Intrinsic height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Premultiplied pixels.
    pub fn pixels(&self) -> &[u8] {
        self.pixmap.data_as_u8_slice()
    }

    /// Canvas-space rectangle the image covers.
    pub fn bounds(&self) -> Rect {
        let w = f64::from(self.width) * self.scale_x;
        let h = f64::from(self.height) * self.scale_y;
        let x0 = self.left - self.origin_x.fraction() * w;
        let y0 = self.top - self.origin_y.fraction() * h;
        Rect::new(x0, y0, x0 + w, y0 + h)
    }
}

fn pixmap_size(width: u32, height: u32) -> WavyteResult<(u16, u16)> {
    let w: u16 = width
        .try_into()
        .map_err(|_| WavyteError::validation(format!("pixmap width {width} exceeds u16")))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| WavyteError::validation(format!("pixmap height {height} exceeds u16")))?;
    Ok((w, h))
}

fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> WavyteResult<vello_cpu::Pixmap> {
    let expected = (width as usize)
        .saturating_mul(height as usize)
        .saturating_mul(4);
    if bytes.len() != expected || expected == 0 {
        return Err(WavyteError::integrity(format!(
            "image holds {} bytes, expected {expected} for {width}x{height} rgba",
            bytes.len()
        )));
    }
    let (w, h) = pixmap_size(width, height)?;
    let pixels = bytes
        .chunks_exact(4)
        .map(|px| vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]]))
        .collect::<Vec<_>>();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels, w, h, true,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/canvas/surface.rs"]
mod tests;
