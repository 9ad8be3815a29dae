use std::time::{Duration, Instant};

use rayon::prelude::*;

use crate::canvas::surface::{Canvas, PlacedImage};
use crate::foundation::core::{CHANNELS, Fps, RawFrame, frame_byte_len};
use crate::foundation::error::{WavyteError, WavyteResult};
use crate::media::decoder::DecoderOpts;
use crate::media::demux::DEFAULT_FRAME_TIMEOUT;
use crate::scene::clip::{Clip, LayerWindow};
use crate::source::{FrameOutput, FrameSource, SourceContext, SourceRegistry};

/// Output geometry and decoder settings for one render.
#[derive(Clone, Debug)]
pub struct CompositorOpts {
    /// Output frame width.
    pub width: u32,
    /// Output frame height.
    pub height: u32,
    /// Output frame rate.
    pub fps: Fps,
    /// ffmpeg/ffprobe configuration shared by all video layers.
    pub decoder: DecoderOpts,
    /// How long a video layer may stall before it is treated as finished.
    pub frame_timeout: Duration,
    /// Log how long every layer took per frame.
    pub log_times: bool,
}

impl Default for CompositorOpts {
    fn default() -> Self {
        Self {
            width: 640,
            height: 360,
            fps: Fps { num: 25, den: 1 },
            decoder: DecoderOpts::default(),
            frame_timeout: DEFAULT_FRAME_TIMEOUT,
            log_times: false,
        }
    }
}

impl CompositorOpts {
    /// Options for a `width x height` output at `fps`, everything else default.
    pub fn new(width: u32, height: u32, fps: Fps) -> Self {
        Self {
            width,
            height,
            fps,
            ..Self::default()
        }
    }
}

struct LayerSlot {
    label: String,
    window: LayerWindow,
    source: Box<dyn FrameSource>,
}

/// Drives one frame source per visual layer and merges them into output frames.
pub struct Compositor {
    width: u32,
    height: u32,
    fps: Fps,
    layers: Vec<LayerSlot>,
    log_times: bool,
    closed: bool,
}

impl std::fmt::Debug for Compositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compositor")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("fps", &self.fps)
            .field(
                "layers",
                &self.layers.iter().map(|l| &l.label).collect::<Vec<_>>(),
            )
            .field("closed", &self.closed)
            .finish()
    }
}

impl Compositor {
    /// Build the sources for every visual layer of `clip`, one after another in clip order.
    ///
    /// If any layer fails, the sources built so far are closed before the error is returned.
    #[tracing::instrument(skip_all, fields(width = opts.width, height = opts.height, fps = %opts.fps))]
    pub fn new(clip: &Clip, opts: CompositorOpts, registry: &SourceRegistry) -> WavyteResult<Self> {
        check_size(opts.width, opts.height)?;
        clip.validate()?;

        let mut layers = Vec::new();
        if let Err(e) = build_layers(clip, &opts, registry, &mut layers) {
            if let Err(close_err) = close_layers(&mut layers) {
                tracing::debug!(error = %close_err, "error while closing partially built layers");
            }
            return Err(e);
        }
        tracing::debug!(layers = layers.len(), "compositor ready");

        Ok(Self {
            width: opts.width,
            height: opts.height,
            fps: opts.fps,
            layers,
            log_times: opts.log_times,
            closed: false,
        })
    }

    /// Compose already constructed sources, bottom first.
    pub fn from_sources(
        width: u32,
        height: u32,
        fps: Fps,
        sources: Vec<(LayerWindow, Box<dyn FrameSource>)>,
    ) -> WavyteResult<Self> {
        check_size(width, height)?;
        let layers = sources
            .into_iter()
            .enumerate()
            .map(|(i, (window, source))| LayerSlot {
                label: format!("layer{i}"),
                window,
                source,
            })
            .collect();
        Ok(Self {
            width,
            height,
            fps,
            layers,
            log_times: false,
            closed: false,
        })
    }

    /// Output frame width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Output frame height.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Output frame rate.
    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// Number of visual layers.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Indices of the layers active at clip time `t`, in paint order.
    pub fn active_layers(&self, t: f64) -> Vec<usize> {
        self.layers
            .iter()
            .enumerate()
            .filter(|(_, l)| l.window.sample(t).is_some())
            .map(|(i, _)| i)
            .collect()
    }

    /// Compose the output frame for clip time `t`.
    ///
    /// Layers are pulled in paint order and only while active. When the clip has exactly one
    /// visual layer and it hands back a raw frame, that frame is returned as is.
    pub fn read_next_frame(&mut self, t: f64) -> WavyteResult<RawFrame> {
        if self.closed {
            return Err(WavyteError::evaluation("compositor is closed"));
        }
        let expected_len = frame_byte_len(self.width, self.height)?;
        let passthrough = self.layers.len() == 1;
        let mut canvas = Canvas::new(self.width, self.height)?;

        for slot in &mut self.layers {
            let Some((progress, offset_time)) = slot.window.sample(t) else {
                continue;
            };
            let started = self.log_times.then(Instant::now);
            let out = slot
                .source
                .read_next_frame(progress, &mut canvas, offset_time)?;
            if let Some(started) = started {
                tracing::debug!(
                    layer = %slot.label,
                    t,
                    progress,
                    elapsed_us = started.elapsed().as_micros() as u64,
                    "layer frame"
                );
            }

            let FrameOutput::Raw(frame) = out else {
                continue;
            };
            if (frame.width, frame.height) != (self.width, self.height)
                || frame.data.len() != expected_len
            {
                return Err(WavyteError::integrity(format!(
                    "layer '{}' returned a {}x{} frame of {} bytes, expected {}x{} ({expected_len} bytes)",
                    slot.label,
                    frame.width,
                    frame.height,
                    frame.data.len(),
                    self.width,
                    self.height
                )));
            }
            if passthrough {
                return Ok(frame);
            }
            canvas.add(&PlacedImage::from_rgba(frame.width, frame.height, frame.data)?)?;
        }

        Ok(canvas.into_raw_frame())
    }

    /// Close every source concurrently. Idempotent; the first failure is returned.
    #[tracing::instrument(skip_all, fields(layers = self.layers.len()))]
    pub fn close(&mut self) -> WavyteResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        close_layers(&mut self.layers)
    }
}

impl Drop for Compositor {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::debug!(error = %e, "error while dropping compositor");
        }
    }
}

fn check_size(width: u32, height: u32) -> WavyteResult<()> {
    if width == 0 || height == 0 {
        return Err(WavyteError::validation(
            "output width/height must be non-zero",
        ));
    }
    if width > u32::from(u16::MAX) || height > u32::from(u16::MAX) {
        return Err(WavyteError::validation(format!(
            "output size {width}x{height} exceeds {}x{}",
            u16::MAX,
            u16::MAX
        )));
    }
    Ok(())
}

fn build_layers(
    clip: &Clip,
    opts: &CompositorOpts,
    registry: &SourceRegistry,
    out: &mut Vec<LayerSlot>,
) -> WavyteResult<()> {
    for (i, layer) in clip.visual_layers().enumerate() {
        let window = layer.window(clip.duration)?;
        let ctx = SourceContext {
            width: opts.width,
            height: opts.height,
            duration: clip.duration,
            channels: CHANNELS,
            fps: opts.fps,
            layer,
            decoder: &opts.decoder,
            frame_timeout: opts.frame_timeout,
            log_times: opts.log_times,
        };
        let source = registry.create(&ctx)?;
        tracing::debug!(index = i, kind = %layer.kind, ?window, "layer source created");
        out.push(LayerSlot {
            label: format!("{}#{i}", layer.kind),
            window,
            source,
        });
    }
    Ok(())
}

fn close_layers(layers: &mut [LayerSlot]) -> WavyteResult<()> {
    let results: Vec<WavyteResult<()>> = layers
        .par_iter_mut()
        .map(|l| l.source.close())
        .collect();
    results.into_iter().collect()
}

#[cfg(test)]
#[path = "../../tests/unit/compose/compositor.rs"]
mod tests;
