use std::sync::Arc;

use crate::canvas::blur::stretched_blur;
use crate::canvas::surface::{Canvas, PlacedImage};
use crate::foundation::core::Point;
use crate::foundation::error::{WavyteError, WavyteResult};
use crate::geometry::resize::{OriginX, OriginY, ResizeMode, ResizePlan};

type HookFn = dyn Fn(&mut PlacedImage, &Canvas, f64, f64) + Send + Sync;

/// Caller-supplied post-processing run on every placed image right before it is drawn.
///
/// Receives the image, the canvas painted so far, the layer progress, and the layer-local time,
/// and may change the image's drawing parameters.
#[derive(Clone)]
pub struct ImageHook(Arc<HookFn>);

impl ImageHook {
    /// Wrap a hook closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut PlacedImage, &Canvas, f64, f64) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    fn call(&self, img: &mut PlacedImage, canvas: &Canvas, progress: f64, time: f64) {
        (self.0)(img, canvas, progress, time)
    }
}

impl std::fmt::Debug for ImageHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ImageHook(..)")
    }
}

/// Turns decoded frames of one layer into positioned images on the canvas.
#[derive(Clone, Debug)]
pub struct LayerPlacement {
    plan: ResizePlan,
    base: Point,
    origin_x: OriginX,
    origin_y: OriginY,
    hook: Option<ImageHook>,
}

impl LayerPlacement {
    /// Placement for frames produced according to `plan`, anchored at `base`.
    pub fn new(
        plan: ResizePlan,
        base: Point,
        origin_x: OriginX,
        origin_y: OriginY,
        hook: Option<ImageHook>,
    ) -> Self {
        Self {
            plan,
            base,
            origin_x,
            origin_y,
            hook,
        }
    }

    /// The layer's resize plan.
    pub fn plan(&self) -> &ResizePlan {
        &self.plan
    }

    /// Wrap one decoded frame, positioned but not yet drawn.
    ///
    /// The frame must hold exactly `target_width * target_height * 4` bytes; anything else means
    /// the decoder's framing no longer matches the plan and is reported as an integrity
    /// violation.
    pub fn decode(&self, rgba: Vec<u8>) -> WavyteResult<PlacedImage> {
        let expected = self.plan.frame_byte_len()?;
        if rgba.len() != expected {
            return Err(WavyteError::integrity(format!(
                "decoded frame holds {} bytes, expected {expected} ({}x{} rgba)",
                rgba.len(),
                self.plan.target_width,
                self.plan.target_height
            )));
        }
        let img = PlacedImage::from_rgba(self.plan.target_width, self.plan.target_height, rgba)?;
        Ok(self.position(img))
    }

    /// Set anchor and position on an image whose size matches the plan's target.
    pub fn position(&self, mut img: PlacedImage) -> PlacedImage {
        let offset = self.plan.center_offset(self.origin_x, self.origin_y);
        img.origin_x = self.origin_x;
        img.origin_y = self.origin_y;
        img.left = self.base.x + offset.x;
        img.top = self.base.y + offset.y;
        img
    }

    /// Blurred box-filling copy for `contain-blur`, placed without the centering offset.
    pub fn background(&self, img: &PlacedImage) -> WavyteResult<Option<PlacedImage>> {
        if self.plan.mode != ResizeMode::ContainBlur {
            return Ok(None);
        }
        let (w, h) = (self.plan.requested_width, self.plan.requested_height);
        let fill = stretched_blur(img.pixels(), img.width(), img.height(), w, h)?;
        let mut bg = PlacedImage::from_premul(w, h, &fill)?;
        bg.origin_x = self.origin_x;
        bg.origin_y = self.origin_y;
        bg.left = self.base.x;
        bg.top = self.base.y;
        Ok(Some(bg))
    }

    /// Paint the background (if any) and then the image, running the hook in between.
    pub fn draw(
        &self,
        mut img: PlacedImage,
        background: Option<&PlacedImage>,
        canvas: &mut Canvas,
        progress: f64,
        time: f64,
    ) -> WavyteResult<()> {
        if let Some(bg) = background {
            canvas.add(bg)?;
        }
        if let Some(hook) = &self.hook {
            hook.call(&mut img, canvas, progress, time);
        }
        canvas.add(&img)
    }

    /// [`decode`](Self::decode), [`background`](Self::background) and [`draw`](Self::draw) in
    /// one step.
    pub fn place(
        &self,
        rgba: Vec<u8>,
        canvas: &mut Canvas,
        progress: f64,
        time: f64,
    ) -> WavyteResult<()> {
        let img = self.decode(rgba)?;
        let bg = self.background(&img)?;
        self.draw(img, bg.as_ref(), canvas, progress, time)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/placement.rs"]
mod tests;
