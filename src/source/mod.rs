pub(crate) mod color;
pub(crate) mod fill;
pub(crate) mod gradient;
pub(crate) mod image;
pub(crate) mod placement;
pub(crate) mod video;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::canvas::surface::Canvas;
use crate::foundation::core::{Fps, RawFrame};
use crate::foundation::error::{WavyteError, WavyteResult};
use crate::media::decoder::DecoderOpts;
use crate::scene::clip::Layer;

/// What a frame source produced for one output time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameOutput {
    /// A complete canvas-sized straight-alpha RGBA buffer, placed over the canvas by the caller.
    Raw(RawFrame),
    /// The source painted onto the canvas it was handed.
    DrawnToCanvas,
}

/// Per-layer producer of visual content.
///
/// A source is pulled at most once per output frame, only while its layer is active, and always
/// from one thread at a time.
pub trait FrameSource: Send {
    /// Produce content for layer-local `progress` in `[0, 1]` and layer-local `time` in seconds.
    fn read_next_frame(
        &mut self,
        progress: f64,
        canvas: &mut Canvas,
        time: f64,
    ) -> WavyteResult<FrameOutput>;

    /// Release any resources held by the source.
    fn close(&mut self) -> WavyteResult<()> {
        Ok(())
    }
}

/// Everything a factory gets to build the source for one layer.
#[derive(Clone, Copy, Debug)]
pub struct SourceContext<'a> {
    /// Output frame width.
    pub width: u32,
    /// Output frame height.
    pub height: u32,
    /// Clip duration in seconds.
    pub duration: f64,
    /// Bytes per pixel of raw frames.
    pub channels: usize,
    /// Output frame rate.
    pub fps: Fps,
    /// The layer being built.
    pub layer: &'a Layer,
    /// ffmpeg/ffprobe configuration.
    pub decoder: &'a DecoderOpts,
    /// Stall timeout for streaming decoders.
    pub frame_timeout: Duration,
    /// Emit per-frame timing logs.
    pub log_times: bool,
}

impl SourceContext<'_> {
    /// Decode the layer's type-specific params.
    pub fn params<T: serde::de::DeserializeOwned>(&self) -> WavyteResult<T> {
        serde_json::from_value(serde_json::Value::Object(self.layer.params.clone())).map_err(|e| {
            WavyteError::validation(format!("invalid params for '{}' layer: {e}", self.layer.kind))
        })
    }
}

/// Builds frame sources for one layer type.
pub trait SourceFactory: Send + Sync {
    /// Construct the source for `ctx.layer`.
    fn create(&self, ctx: &SourceContext<'_>) -> WavyteResult<Box<dyn FrameSource>>;
}

impl<F> SourceFactory for F
where
    F: Fn(&SourceContext<'_>) -> WavyteResult<Box<dyn FrameSource>> + Send + Sync,
{
    fn create(&self, ctx: &SourceContext<'_>) -> WavyteResult<Box<dyn FrameSource>> {
        self(ctx)
    }
}

/// Layer type name to source factory.
#[derive(Clone)]
pub struct SourceRegistry {
    factories: BTreeMap<String, Arc<dyn SourceFactory>>,
}

impl std::fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceRegistry")
            .field("types", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl SourceRegistry {
    /// Registry without any layer types.
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Registry with `video`, `image`, `fill-color` and `linear-gradient`.
    pub fn with_builtins() -> Self {
        let mut reg = Self::new();
        reg.register("video", video::create);
        reg.register("image", image::create);
        reg.register("fill-color", fill::create);
        reg.register("linear-gradient", gradient::create);
        reg
    }

    /// Register (or replace) the factory for `kind`.
    pub fn register<F>(&mut self, kind: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&SourceContext<'_>) -> WavyteResult<Box<dyn FrameSource>> + Send + Sync + 'static,
    {
        self.factories.insert(kind.into(), Arc::new(factory));
        self
    }

    /// `true` when `kind` has a factory.
    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Build the source for `ctx.layer`.
    pub fn create(&self, ctx: &SourceContext<'_>) -> WavyteResult<Box<dyn FrameSource>> {
        let kind = ctx.layer.kind.as_str();
        let factory = self
            .factories
            .get(kind)
            .ok_or_else(|| WavyteError::validation(format!("invalid layer type '{kind}'")))?;
        factory.create(ctx)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/registry.rs"]
mod tests;
