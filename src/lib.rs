//! Wavyte layers turns a timed stack of visual layers into raw RGBA frames.
//!
//! Video layers are decoded by the system `ffmpeg` binary into fixed-size raw frames that are
//! reassembled from its output pipe, fitted into their box with a resize policy, and painted onto
//! a per-frame canvas together with every other layer active at that time.
//!
//! # Pipeline overview
//!
//! 1. **Plan**: intrinsic size + requested box + [`ResizeMode`] -> [`ResizePlan`]
//! 2. **Decode**: [`FrameDemuxer`] pulls exactly one frame per call from an ffmpeg pipe, with
//!    backpressure, a stall timeout and cancellation
//! 3. **Place**: [`LayerPlacement`] positions the frame (and a blurred fill for `contain-blur`)
//! 4. **Compose**: [`Compositor`] pulls every active layer in paint order and serializes the canvas
//! 5. **Render**: [`render_clip`] walks the clip at the output frame rate into a [`FrameSink`]
//!
//! Layer types are pluggable through [`SourceRegistry`]; any [`FrameSource`] either returns a
//! full-canvas [`RawFrame`] or paints straight onto the [`Canvas`] it is handed.
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Premultiplied RGBA8** on the canvas, straight RGBA8 at the crate boundary.
//! - **One pull at a time** per layer; decoders only make progress while a pull is waiting.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod canvas;
mod compose;
mod encode;
mod foundation;
mod geometry;
mod media;
mod scene;
mod source;

pub use canvas::blur::{blur_rgba8_premul, stretched_blur};
pub use canvas::composite::{PremulRgba8, over, over_in_place};
pub use canvas::surface::{Canvas, PlacedImage};
pub use compose::compositor::{Compositor, CompositorOpts};
pub use compose::render::{RenderStats, frame_count, render_clip};
pub use encode::sink::{FrameSink, InMemorySink, SinkConfig};
pub use foundation::core::{CHANNELS, Fps, FrameIndex, Point, RawFrame, Rect, Vec2, frame_byte_len};
pub use foundation::error::{WavyteError, WavyteResult};
pub use foundation::math::{premultiply, unpremultiply};
pub use geometry::resize::{
    Crop, OriginX, OriginY, ResizeMode, ResizePlan, base_position, resolve_requested,
};
pub use media::decoder::{
    DecodeRequest, DecoderOpts, DecoderProcess, decode_args, is_ffmpeg_on_path,
};
pub use media::demux::{DEFAULT_FRAME_TIMEOUT, FrameDemuxer};
pub use media::probe::{
    StreamInfo, first_video_stream, input_decoder_for, parse_probe_json, probe_streams,
};
pub use media::reassembly::ReassemblyBuffer;
pub use scene::clip::{AUDIO_LAYER_TYPE, Clip, Layer, LayerWindow};
pub use source::color::Color;
pub use source::fill::{FillColorSource, FillParams};
pub use source::gradient::{GradientParams, LinearGradientSource};
pub use source::image::{ImageFrameSource, ImageParams};
pub use source::placement::{ImageHook, LayerPlacement};
pub use source::video::{VideoFrameSource, VideoParams};
pub use source::{FrameOutput, FrameSource, SourceContext, SourceFactory, SourceRegistry};
