use std::path::PathBuf;
use std::time::Instant;

use crate::canvas::surface::Canvas;
use crate::foundation::error::{WavyteError, WavyteResult};
use crate::geometry::resize::{
    OriginX, OriginY, ResizeMode, ResizePlan, base_position, resolve_requested,
};
use crate::media::decoder::DecodeRequest;
use crate::media::demux::FrameDemuxer;
use crate::media::probe::{first_video_stream, input_decoder_for, probe_streams};
use crate::source::placement::LayerPlacement;
use crate::source::{FrameOutput, FrameSource, SourceContext};

/// Params of a `video` layer.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoParams {
    /// Source file.
    pub path: PathBuf,
    /// Trim start in source seconds.
    #[serde(default)]
    pub cut_from: Option<f64>,
    /// Trim end in source seconds.
    #[serde(default)]
    pub cut_to: Option<f64>,
    /// Playback slowdown factor (`2.0` plays at half speed).
    #[serde(default = "one")]
    pub speed_factor: f64,
    /// Intrinsic width; probed when absent.
    #[serde(default)]
    pub input_width: Option<u32>,
    /// Intrinsic height; probed when absent.
    #[serde(default)]
    pub input_height: Option<u32>,
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

fn one() -> f64 {
    1.0
}

impl VideoParams {
    /// Reject trims and speeds ffmpeg cannot honor.
    pub fn validate(&self) -> WavyteResult<()> {
        if !self.speed_factor.is_finite() || self.speed_factor <= 0.0 {
            return Err(WavyteError::validation(format!(
                "video speedFactor must be > 0 (got {})",
                self.speed_factor
            )));
        }
        let cut_from = self.cut_from.unwrap_or(0.0);
        if !cut_from.is_finite() || cut_from < 0.0 {
            return Err(WavyteError::validation("video cutFrom must be >= 0"));
        }
        if let Some(cut_to) = self.cut_to
            && !(cut_to.is_finite() && cut_to > cut_from)
        {
            return Err(WavyteError::validation(format!(
                "video cutTo must be greater than cutFrom ({cut_to} <= {cut_from})"
            )));
        }
        Ok(())
    }
}

/// Streams a video file through ffmpeg and draws one frame per pull.
#[derive(Debug)]
pub struct VideoFrameSource {
    placement: LayerPlacement,
    demuxer: FrameDemuxer,
    log_times: bool,
    frames: u64,
}

impl VideoFrameSource {
    /// Probe the file, plan the geometry and start decoding.
    #[tracing::instrument(skip_all, fields(layer = %ctx.layer.kind))]
    pub fn new(ctx: &SourceContext<'_>) -> WavyteResult<Self> {
        let params: VideoParams = ctx.params()?;
        params.validate()?;

        let streams = probe_streams(ctx.decoder, &params.path)?;
        let input_decoder = input_decoder_for(&streams);
        let probed = first_video_stream(&streams);
        let input_width = params
            .input_width
            .or_else(|| probed.and_then(|s| s.width))
            .ok_or_else(|| {
                WavyteError::validation(format!(
                    "no video stream with a known width in '{}'",
                    params.path.display()
                ))
            })?;
        let input_height = params
            .input_height
            .or_else(|| probed.and_then(|s| s.height))
            .ok_or_else(|| {
                WavyteError::validation(format!(
                    "no video stream with a known height in '{}'",
                    params.path.display()
                ))
            })?;

        let plan = ResizePlan::compute(
            input_width,
            input_height,
            resolve_requested(params.width, ctx.width),
            resolve_requested(params.height, ctx.height),
            params.resize_mode,
        )?;
        tracing::debug!(
            path = %params.path.display(),
            ?input_decoder,
            input_width,
            input_height,
            ?plan,
            "video layer planned"
        );

        let req = DecodeRequest {
            path: &params.path,
            input_decoder,
            cut_from: params.cut_from,
            cut_to: params.cut_to,
            speed_factor: params.speed_factor,
            fps: ctx.fps,
            plan: &plan,
        };
        let demuxer = FrameDemuxer::spawn(&req, ctx.decoder, ctx.frame_timeout)?;

        let base = base_position(params.left, params.top, ctx.width, ctx.height);
        let placement = LayerPlacement::new(
            plan,
            base,
            params.origin_x,
            params.origin_y,
            ctx.layer.post_process.clone(),
        );
        Ok(Self::from_parts(placement, demuxer, ctx.log_times))
    }

    /// Assemble a source from an already running demuxer.
    pub fn from_parts(placement: LayerPlacement, demuxer: FrameDemuxer, log_times: bool) -> Self {
        Self {
            placement,
            demuxer,
            log_times,
            frames: 0,
        }
    }
}

impl FrameSource for VideoFrameSource {
    fn read_next_frame(
        &mut self,
        progress: f64,
        canvas: &mut Canvas,
        time: f64,
    ) -> WavyteResult<FrameOutput> {
        let started = self.log_times.then(Instant::now);
        let Some(rgba) = self.demuxer.read_next_frame()? else {
            return Ok(FrameOutput::DrawnToCanvas);
        };
        self.placement.place(rgba, canvas, progress, time)?;
        self.frames += 1;

        if let Some(started) = started {
            tracing::debug!(
                frame = self.frames,
                elapsed_us = started.elapsed().as_micros() as u64,
                "video frame read and placed"
            );
        }
        Ok(FrameOutput::DrawnToCanvas)
    }

    fn close(&mut self) -> WavyteResult<()> {
        self.demuxer.close()
    }
}

pub(crate) fn create(ctx: &SourceContext<'_>) -> WavyteResult<Box<dyn FrameSource>> {
    Ok(Box::new(VideoFrameSource::new(ctx)?))
}

#[cfg(test)]
#[path = "../../tests/unit/source/video.rs"]
mod tests;
