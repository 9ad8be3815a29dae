use crate::foundation::core::{Point, Vec2};
use crate::foundation::error::{WavyteError, WavyteResult};

/// How a source's intrinsic size maps onto its requested box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeMode {
    /// Fit inside the box, preserving aspect ratio; margins stay transparent.
    Contain,
    /// Like [`ResizeMode::Contain`], with margins filled by a blurred, stretched copy.
    #[default]
    ContainBlur,
    /// Cover the whole box, preserving aspect ratio, cropping the overflow.
    Cover,
    /// Scale to the box exactly, ignoring aspect ratio.
    Stretch,
}

impl ResizeMode {
    /// `true` for the two `contain` variants, which are placed with a centering offset.
    pub fn is_contain(self) -> bool {
        matches!(self, Self::Contain | Self::ContainBlur)
    }
}

/// Horizontal anchor of a placed image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginX {
    /// `left` is the image's left edge.
    #[default]
    Left,
    /// `left` is the image's horizontal center.
    Center,
    /// `left` is the image's right edge.
    Right,
}

/// Vertical anchor of a placed image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginY {
    /// `top` is the image's top edge.
    #[default]
    Top,
    /// `top` is the image's vertical center.
    Center,
    /// `top` is the image's bottom edge.
    Bottom,
}

impl OriginX {
    /// Sign applied to the contain-mode centering offset: `+1` for `left`, `-1` otherwise.
    pub fn direction(self) -> f64 {
        match self {
            Self::Left => 1.0,
            Self::Center | Self::Right => -1.0,
        }
    }

    /// Fraction of the image width that lies left of the anchor.
    pub fn fraction(self) -> f64 {
        match self {
            Self::Left => 0.0,
            Self::Center => 0.5,
            Self::Right => 1.0,
        }
    }
}

impl OriginY {
    /// Sign applied to the contain-mode centering offset: `+1` for `top`, `-1` otherwise.
    pub fn direction(self) -> f64 {
        match self {
            Self::Top => 1.0,
            Self::Center | Self::Bottom => -1.0,
        }
    }

    /// Fraction of the image height that lies above the anchor.
    pub fn fraction(self) -> f64 {
        match self {
            Self::Top => 0.0,
            Self::Center => 0.5,
            Self::Bottom => 1.0,
        }
    }
}

/// Crop applied after scaling, in scaled-image pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Crop {
    /// Crop width.
    pub width: u32,
    /// Crop height.
    pub height: u32,
    /// Left edge of the crop window.
    pub x: u32,
    /// Top edge of the crop window.
    pub y: u32,
}

/// Scale/crop plan for one layer, fixed for the layer's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResizePlan {
    /// Policy the plan was computed for.
    pub mode: ResizeMode,
    /// Box requested by the layer, in canvas pixels.
    pub requested_width: u32,
    /// Box requested by the layer, in canvas pixels.
    pub requested_height: u32,
    /// Size the decoder scales to before any crop.
    pub scaled_width: u32,
    /// Size the decoder scales to before any crop.
    pub scaled_height: u32,
    /// Overflow crop (`cover` only).
    pub crop: Option<Crop>,
    /// Final decoded frame width.
    pub target_width: u32,
    /// Final decoded frame height.
    pub target_height: u32,
}

impl ResizePlan {
    /// Compute the plan for an `input_*` sized source placed into a `requested_*` box.
    pub fn compute(
        input_width: u32,
        input_height: u32,
        requested_width: u32,
        requested_height: u32,
        mode: ResizeMode,
    ) -> WavyteResult<Self> {
        if input_width == 0 || input_height == 0 {
            return Err(WavyteError::validation(
                "input width/height must be non-zero",
            ));
        }
        if requested_width == 0 || requested_height == 0 {
            return Err(WavyteError::validation(
                "requested width/height must be non-zero",
            ));
        }

        let ratio_w = f64::from(requested_width) / f64::from(input_width);
        let ratio_h = f64::from(requested_height) / f64::from(input_height);
        let aspect = f64::from(input_width) / f64::from(input_height);

        let mut plan = Self {
            mode,
            requested_width,
            requested_height,
            scaled_width: requested_width,
            scaled_height: requested_height,
            crop: None,
            target_width: requested_width,
            target_height: requested_height,
        };

        match mode {
            ResizeMode::Contain | ResizeMode::ContainBlur => {
                let (w, h) = if ratio_w > ratio_h {
                    (round_px(f64::from(requested_height) * aspect), requested_height)
                } else {
                    (requested_width, round_px(f64::from(requested_width) / aspect))
                };
                plan.target_width = w.min(requested_width);
                plan.target_height = h.min(requested_height);
                plan.scaled_width = plan.target_width;
                plan.scaled_height = plan.target_height;
            }
            ResizeMode::Cover => {
                let (w, h) = if ratio_w > ratio_h {
                    (requested_width, round_px(f64::from(requested_width) / aspect))
                } else {
                    (round_px(f64::from(requested_height) * aspect), requested_height)
                };
                plan.scaled_width = w.max(requested_width);
                plan.scaled_height = h.max(requested_height);
                // Anchored at the scaled image's top-left corner, not centered on the overflow.
                plan.crop = Some(Crop {
                    width: requested_width,
                    height: requested_height,
                    x: 0,
                    y: 0,
                });
            }
            ResizeMode::Stretch => {}
        }

        Ok(plan)
    }

    /// ffmpeg filter fragment producing frames of exactly `target_width x target_height`.
    pub fn scale_filter(&self) -> String {
        let mut s = format!("scale={}:{}", self.scaled_width, self.scaled_height);
        if let Some(c) = self.crop {
            s.push_str(&format!(",crop={}:{}:{}:{}", c.width, c.height, c.x, c.y));
        }
        s
    }

    /// Offset that keeps a contain-mode image centered in its box for the given anchor.
    ///
    /// Zero for `cover` and `stretch`, which always fill the box.
    pub fn center_offset(&self, origin_x: OriginX, origin_y: OriginY) -> Vec2 {
        if !self.mode.is_contain() {
            return Vec2::ZERO;
        }
        let dx = f64::from(self.requested_width) - f64::from(self.target_width);
        let dy = f64::from(self.requested_height) - f64::from(self.target_height);
        Vec2::new(
            origin_x.direction() * dx / 2.0,
            origin_y.direction() * dy / 2.0,
        )
    }

    /// Byte length of one decoded frame.
    pub fn frame_byte_len(&self) -> WavyteResult<usize> {
        crate::foundation::core::frame_byte_len(self.target_width, self.target_height)
    }
}

/// Resolve a relative-to-canvas size; `None` (or a non-positive fraction) means the full canvas
/// dimension.
pub fn resolve_requested(rel: Option<f64>, canvas: u32) -> u32 {
    match rel {
        Some(r) if r > 0.0 => round_px(r * f64::from(canvas)),
        _ => canvas,
    }
}

/// Base placement from relative left/top fractions of the canvas.
pub fn base_position(left_rel: f64, top_rel: f64, canvas_width: u32, canvas_height: u32) -> Point {
    Point::new(
        left_rel * f64::from(canvas_width),
        top_rel * f64::from(canvas_height),
    )
}

fn round_px(v: f64) -> u32 {
    if !v.is_finite() {
        return 1;
    }
    v.round().clamp(1.0, f64::from(u32::MAX)) as u32
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/resize.rs"]
mod tests;
