use std::path::Path;

use crate::foundation::error::{WavyteError, WavyteResult};
use crate::media::decoder::DecoderOpts;

/// One stream descriptor as reported by `ffprobe -show_streams`.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Deserialize)]
pub struct StreamInfo {
    /// `video`, `audio`, `data`, ...
    pub codec_type: Option<String>,
    /// Codec identifier, e.g. `h264` or `vp9`.
    pub codec_name: Option<String>,
    /// Width in pixels (video streams).
    pub width: Option<u32>,
    /// Height in pixels (video streams).
    pub height: Option<u32>,
}

impl StreamInfo {
    /// `true` for video streams.
    pub fn is_video(&self) -> bool {
        self.codec_type.as_deref() == Some("video")
    }
}

#[derive(serde::Deserialize)]
struct ProbeOut {
    #[serde(default)]
    streams: Vec<StreamInfo>,
}

/// List the streams of `source_path` through `ffprobe`.
pub fn probe_streams(opts: &DecoderOpts, source_path: &Path) -> WavyteResult<Vec<StreamInfo>> {
    let out = std::process::Command::new(&opts.ffprobe_path)
        .args(["-v", "error", "-of", "json", "-show_streams"])
        .arg(source_path)
        .output()
        .map_err(|e| WavyteError::process(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(WavyteError::process(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    parse_probe_json(&out.stdout)
}

/// Parse `ffprobe -of json -show_streams` output.
pub fn parse_probe_json(bytes: &[u8]) -> WavyteResult<Vec<StreamInfo>> {
    let parsed: ProbeOut = serde_json::from_slice(bytes)
        .map_err(|e| WavyteError::serde(format!("ffprobe json parse failed: {e}")))?;
    Ok(parsed.streams)
}

/// First video stream in probe order.
pub fn first_video_stream(streams: &[StreamInfo]) -> Option<&StreamInfo> {
    streams.iter().find(|s| s.is_video())
}

/// Explicit input decoder required to decode the first video stream, if any.
///
/// The native vp8/vp9 decoders drop the alpha channel, so those two codecs are routed through
/// libvpx. Everything else uses ffmpeg's default decoder.
pub fn input_decoder_for(streams: &[StreamInfo]) -> Option<&'static str> {
    match first_video_stream(streams)?.codec_name.as_deref()? {
        "vp8" => Some("libvpx"),
        "vp9" => Some("libvpx-vp9"),
        _ => None,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/probe.rs"]
mod tests;
