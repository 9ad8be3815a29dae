use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

use crate::foundation::core::Fps;
use crate::foundation::error::{WavyteError, WavyteResult};
use crate::geometry::resize::ResizePlan;

/// Where to find the ffmpeg tools and how chatty they should be.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DecoderOpts {
    /// `ffmpeg` binary, looked up on `PATH` unless absolute.
    pub ffmpeg_path: PathBuf,
    /// `ffprobe` binary, looked up on `PATH` unless absolute.
    pub ffprobe_path: PathBuf,
    /// Let ffmpeg print its banner and log to our stderr instead of capturing errors only.
    pub enable_ffmpeg_log: bool,
}

impl Default for DecoderOpts {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            enable_ffmpeg_log: false,
        }
    }
}

impl DecoderOpts {
    fn common_args(&self) -> &'static [&'static str] {
        if self.enable_ffmpeg_log {
            &[]
        } else {
            &["-hide_banner", "-loglevel", "error"]
        }
    }
}

/// Everything needed to build one raw-RGBA decode command.
#[derive(Clone, Debug)]
pub struct DecodeRequest<'a> {
    /// Source video.
    pub path: &'a Path,
    /// Explicit input decoder from [`crate::media::probe::input_decoder_for`].
    pub input_decoder: Option<&'a str>,
    /// Trim start in source seconds.
    pub cut_from: Option<f64>,
    /// Trim end in source seconds.
    pub cut_to: Option<f64>,
    /// Playback slowdown factor applied to presentation timestamps (`1.0` = unchanged).
    pub speed_factor: f64,
    /// Output frame rate.
    pub fps: Fps,
    /// Scale/crop plan for the layer.
    pub plan: &'a ResizePlan,
}

/// Build the ffmpeg argument list for `req`, in the order ffmpeg expects them.
pub fn decode_args(req: &DecodeRequest<'_>, opts: &DecoderOpts) -> Vec<OsString> {
    let mut args: Vec<OsString> = opts.common_args().iter().map(OsString::from).collect();

    if let Some(codec) = req.input_decoder {
        args.extend(["-vcodec".into(), codec.into()]);
    }
    let cut_from = req.cut_from.unwrap_or(0.0);
    if cut_from > 0.0 {
        args.extend(["-ss".into(), format!("{cut_from}").into()]);
    }
    args.extend(["-i".into(), req.path.as_os_str().to_owned()]);
    if let Some(cut_to) = req.cut_to {
        let duration = (cut_to - cut_from) * req.speed_factor;
        args.extend(["-t".into(), format!("{duration}").into()]);
    }

    let pts_filter = if req.speed_factor != 1.0 {
        format!("setpts={}*PTS,", req.speed_factor)
    } else {
        String::new()
    };
    let filter = format!("{pts_filter}fps={},{}", req.fps, req.plan.scale_filter());

    args.extend(
        [
            "-vf",
            filter.as_str(),
            "-map",
            "v:0",
            "-vcodec",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-f",
            "image2pipe",
            "-",
        ]
        .into_iter()
        .map(OsString::from),
    );
    args
}

/// A running ffmpeg decoder whose stdout carries raw frames.
///
/// Cancellation is a forced kill; a failure status caused by that kill is expected and never
/// reported. A failure status the decoder reached on its own is reported by
/// [`finish`](Self::finish) and again by every later [`cancel`](Self::cancel).
#[derive(Debug)]
pub struct DecoderProcess {
    label: String,
    child: Child,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,
    finished: bool,
    failure: Option<String>,
}

impl DecoderProcess {
    /// Spawn `ffmpeg args...` with stdin closed and stdout piped.
    pub fn spawn(
        label: impl Into<String>,
        opts: &DecoderOpts,
        args: &[OsString],
    ) -> WavyteResult<(Self, ChildStdout)> {
        let label = label.into();
        let mut cmd = Command::new(&opts.ffmpeg_path);
        cmd.args(args).stdin(Stdio::null()).stdout(Stdio::piped());
        if opts.enable_ffmpeg_log {
            cmd.stderr(Stdio::inherit());
        } else {
            cmd.stderr(Stdio::piped());
        }
        tracing::debug!(source = %label, ?args, "spawning ffmpeg decoder");

        let mut child = cmd.spawn().map_err(|e| {
            WavyteError::process(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| WavyteError::process("failed to open ffmpeg stdout (unexpected)"))?;
        let stderr_drain = child.stderr.take().map(|mut stderr| {
            std::thread::spawn(move || {
                let mut stderr_bytes = Vec::new();
                stderr.read_to_end(&mut stderr_bytes)?;
                Ok(stderr_bytes)
            })
        });

        Ok((
            Self {
                label,
                child,
                stderr_drain,
                finished: false,
                failure: None,
            },
            stdout,
        ))
    }

    /// Wait for a decoder whose stdout already reached end of file and check how it exited.
    ///
    /// A failure status is returned as [`WavyteError::Process`] carrying ffmpeg's stderr.
    pub fn finish(&mut self) -> WavyteResult<()> {
        if !self.finished {
            self.finished = true;
            let status = self.child.wait().map_err(|e| {
                WavyteError::process(format!(
                    "failed to wait for ffmpeg for '{}': {e}",
                    self.label
                ))
            })?;
            let stderr = self.join_stderr();
            if status.success() {
                tracing::debug!(source = %self.label, %status, "ffmpeg decoder exited");
            } else {
                self.failure = Some(format!(
                    "ffmpeg exited with status {status} for '{}': {}",
                    self.label,
                    String::from_utf8_lossy(&stderr).trim()
                ));
            }
        }
        match &self.failure {
            Some(msg) => Err(WavyteError::process(msg.clone())),
            None => Ok(()),
        }
    }

    /// Stop the decoder.
    ///
    /// A decoder that is still running is killed and the resulting status is swallowed. If it
    /// already exited on its own with a failure status, that is returned as an error unless
    /// `expect_abort` says we provoked it (e.g. by detaching from its output).
    pub fn cancel(&mut self, expect_abort: bool) -> WavyteResult<()> {
        if self.finished {
            return match &self.failure {
                Some(msg) if !expect_abort => Err(WavyteError::process(msg.clone())),
                _ => Ok(()),
            };
        }

        let early_exit = self.child.try_wait().map_err(|e| {
            WavyteError::process(format!("failed to poll ffmpeg for '{}': {e}", self.label))
        })?;
        if early_exit.is_some() {
            return match self.finish() {
                Err(_) if expect_abort => Ok(()),
                res => res,
            };
        }

        self.finished = true;
        if let Err(e) = self.child.kill()
            && e.kind() != std::io::ErrorKind::InvalidInput
        {
            return Err(WavyteError::process(format!(
                "failed to kill ffmpeg for '{}': {e}",
                self.label
            )));
        }
        let status = self
            .child
            .wait()
            .map_err(|e| WavyteError::process(format!("failed to wait for ffmpeg: {e}")))?;
        tracing::debug!(source = %self.label, %status, "ffmpeg decoder aborted");
        let _ = self.join_stderr();
        Ok(())
    }

    fn join_stderr(&mut self) -> Vec<u8> {
        match self.stderr_drain.take() {
            Some(handle) => handle.join().ok().and_then(|r| r.ok()).unwrap_or_default(),
            None => Vec::new(),
        }
    }
}

impl Drop for DecoderProcess {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    std::process::Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/media/decoder.rs"]
mod tests;
