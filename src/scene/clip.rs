use crate::foundation::error::{WavyteError, WavyteResult};
use crate::source::placement::ImageHook;

/// Layer type that never reaches the compositor.
pub const AUDIO_LAYER_TYPE: &str = "audio";

/// One timed layer of a clip.
///
/// Everything other than `type`, `start` and `layerDuration` is kept as raw JSON and decoded by
/// the frame source registered for `type`.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    /// Layer type, e.g. `video` or `fill-color`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Offset of the layer's window from the clip start, in seconds.
    #[serde(default)]
    pub start: f64,
    /// Length of the layer's window in seconds; defaults to the rest of the clip.
    #[serde(default)]
    pub layer_duration: Option<f64>,
    /// Type-specific parameters.
    #[serde(flatten)]
    pub params: serde_json::Map<String, serde_json::Value>,
    /// Optional hook run on each placed image before it is drawn.
    #[serde(skip)]
    pub post_process: Option<ImageHook>,
}

impl Layer {
    /// Layer of `kind` with default timing and no params.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            start: 0.0,
            layer_duration: None,
            params: serde_json::Map::new(),
            post_process: None,
        }
    }

    /// Set one type-specific parameter.
    pub fn with_param(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(key.to_owned(), value.into());
        self
    }

    /// Set the active window.
    pub fn with_window(mut self, start: f64, layer_duration: f64) -> Self {
        self.start = start;
        self.layer_duration = Some(layer_duration);
        self
    }

    /// Attach a post-processing hook.
    pub fn with_post_process(mut self, hook: ImageHook) -> Self {
        self.post_process = Some(hook);
        self
    }

    /// `true` for layers that contribute pixels.
    pub fn is_visual(&self) -> bool {
        self.kind != AUDIO_LAYER_TYPE
    }

    /// Resolve the active window against the clip duration.
    pub fn window(&self, clip_duration: f64) -> WavyteResult<LayerWindow> {
        let duration = self.layer_duration.unwrap_or(clip_duration - self.start);
        if !self.start.is_finite() {
            return Err(WavyteError::validation(format!(
                "layer '{}' start must be finite",
                self.kind
            )));
        }
        if !duration.is_finite() || duration <= 0.0 {
            return Err(WavyteError::validation(format!(
                "layer '{}' duration must be > 0 (got {duration})",
                self.kind
            )));
        }
        Ok(LayerWindow {
            start: self.start,
            duration,
        })
    }
}

/// Resolved active window of a layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerWindow {
    /// Window start in clip seconds.
    pub start: f64,
    /// Window length in seconds, > 0.
    pub duration: f64,
}

impl LayerWindow {
    /// Local `(progress, offset_time)` at clip time `t`, or `None` when the layer is inactive.
    ///
    /// Both window ends are inclusive.
    pub fn sample(self, t: f64) -> Option<(f64, f64)> {
        let offset_time = t - self.start;
        let progress = offset_time / self.duration;
        (0.0..=1.0).contains(&progress).then_some((progress, offset_time))
    }
}

/// A clip: a duration and its layers in paint order.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    /// Clip length in seconds.
    pub duration: f64,
    /// Layers, bottom first.
    pub layers: Vec<Layer>,
}

impl Clip {
    /// Parse a clip from JSON.
    pub fn from_json_str(s: &str) -> WavyteResult<Self> {
        let clip: Self = serde_json::from_str(s)?;
        clip.validate()?;
        Ok(clip)
    }

    /// Check the duration and every visual layer's window.
    pub fn validate(&self) -> WavyteResult<()> {
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(WavyteError::validation("clip duration must be > 0"));
        }
        for layer in self.visual_layers() {
            layer.window(self.duration)?;
        }
        Ok(())
    }

    /// Layers that contribute pixels, in configuration order.
    pub fn visual_layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter().filter(|l| l.is_visual())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/clip.rs"]
mod tests;
