use std::io::Read;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::time::{Duration, Instant};

use crate::foundation::error::{WavyteError, WavyteResult};
use crate::media::decoder::{DecodeRequest, DecoderOpts, DecoderProcess, decode_args};
use crate::media::reassembly::ReassemblyBuffer;

/// How long one pull may wait for a frame before the stream is treated as finished.
pub const DEFAULT_FRAME_TIMEOUT: Duration = Duration::from_secs(60);

const READ_CHUNK_BYTES: usize = 64 * 1024;

enum Chunk {
    Data(Vec<u8>),
    End,
    Error(std::io::Error),
}

/// Pull-based reader of fixed-size raw frames from an unstructured byte stream.
///
/// The stream is read by a pump thread that hands chunks over a rendezvous channel, so it only
/// makes progress while a pull is waiting. Between pulls the pump is parked on that channel and
/// at most one chunk is in flight.
pub struct FrameDemuxer {
    label: String,
    buffer: ReassemblyBuffer,
    rx: Option<Receiver<Chunk>>,
    pump: Option<std::thread::JoinHandle<()>>,
    process: Option<DecoderProcess>,
    timeout: Duration,
    ended: bool,
    detached: bool,
    closed: bool,
}

impl std::fmt::Debug for FrameDemuxer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameDemuxer")
            .field("label", &self.label)
            .field("frame_len", &self.buffer.frame_len())
            .field("buffered", &self.buffer.len())
            .field("ended", &self.ended)
            .field("detached", &self.detached)
            .field("closed", &self.closed)
            .finish()
    }
}

impl FrameDemuxer {
    /// Spawn an ffmpeg decoder for `req` and demux its stdout.
    #[tracing::instrument(skip_all, fields(source = %req.path.display()))]
    pub fn spawn(
        req: &DecodeRequest<'_>,
        opts: &DecoderOpts,
        timeout: Duration,
    ) -> WavyteResult<Self> {
        let frame_len = req.plan.frame_byte_len()?;
        let label = req.path.display().to_string();
        let args = decode_args(req, opts);
        let (process, stdout) = DecoderProcess::spawn(label.clone(), opts, &args)?;
        let mut demuxer = Self::from_reader(label, stdout, frame_len, timeout)?;
        demuxer.process = Some(process);
        Ok(demuxer)
    }

    /// Demux frames of `frame_len` bytes from any byte source.
    ///
    /// Without a decoder process attached, [`close`](Self::close) does not join the pump
    /// thread: it stops at its next send after the receiver is gone, so a reader blocked in
    /// `read` keeps the thread alive until that read returns.
    pub fn from_reader<R>(
        label: impl Into<String>,
        reader: R,
        frame_len: usize,
        timeout: Duration,
    ) -> WavyteResult<Self>
    where
        R: Read + Send + 'static,
    {
        if frame_len == 0 {
            return Err(WavyteError::validation("frame length must be non-zero"));
        }
        let label = label.into();
        let (tx, rx) = mpsc::sync_channel::<Chunk>(0);
        let pump = std::thread::Builder::new()
            .name(format!("demux:{label}"))
            .spawn(move || pump(reader, tx))
            .map_err(|e| WavyteError::evaluation(format!("failed to spawn demux thread: {e}")))?;

        Ok(Self {
            label,
            buffer: ReassemblyBuffer::new(frame_len),
            rx: Some(rx),
            pump: Some(pump),
            process: None,
            timeout,
            ended: false,
            detached: false,
            closed: false,
        })
    }

    /// Size of one frame in bytes.
    pub fn frame_len(&self) -> usize {
        self.buffer.frame_len()
    }

    /// `true` once the stream reported end-of-data, failed, or stalled past the timeout.
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Pull the next complete frame.
    ///
    /// `Ok(None)` means end of sequence: the stream ended, or no frame completed within the
    /// timeout. A transport error from the stream is returned as [`WavyteError::Stream`]; a
    /// decoder that exits with a failure status once its output ends is returned as
    /// [`WavyteError::Process`].
    pub fn read_next_frame(&mut self) -> WavyteResult<Option<Vec<u8>>> {
        if let Some(frame) = self.buffer.take_frame() {
            return Ok(Some(frame));
        }
        if self.ended {
            tracing::warn!(
                source = %self.label,
                "tried to read next video frame after ffmpeg video stream ended"
            );
            return Ok(None);
        }
        let Some(rx) = self.rx.as_ref() else {
            self.ended = true;
            return Ok(None);
        };

        let deadline = Instant::now() + self.timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok(Chunk::Data(bytes)) => {
                    self.buffer.append(&bytes);
                    if let Some(frame) = self.buffer.take_frame() {
                        return Ok(Some(frame));
                    }
                }
                Ok(Chunk::End) | Err(RecvTimeoutError::Disconnected) => {
                    self.mark_ended();
                    if let Some(process) = self.process.as_mut() {
                        process.finish()?;
                    }
                    return Ok(None);
                }
                Ok(Chunk::Error(e)) => {
                    self.ended = true;
                    self.rx = None;
                    return Err(WavyteError::stream(format!(
                        "reading decoder output for '{}' failed: {e}",
                        self.label
                    )));
                }
                Err(RecvTimeoutError::Timeout) => {
                    tracing::warn!(
                        source = %self.label,
                        timeout_ms = self.timeout.as_millis() as u64,
                        "timeout on read video frame"
                    );
                    self.detach();
                    return Ok(None);
                }
            }
        }
    }

    /// Abort the decoder and release the stream. Idempotent.
    ///
    /// The kill we issue here is expected and its exit status is ignored; a decoder that had
    /// already failed on its own is reported as [`WavyteError::Process`], even when the pull
    /// that saw the stream end reported it first.
    pub fn close(&mut self) -> WavyteResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.ended = true;

        let res = match self.process.as_mut() {
            Some(process) => process.cancel(self.detached),
            None => Ok(()),
        };
        self.rx = None;
        if self.process.is_some()
            && let Some(pump) = self.pump.take()
        {
            // The decoder is gone, so the pump sees EOF or a closed channel and returns.
            let _ = pump.join();
        }
        res
    }

    fn mark_ended(&mut self) {
        tracing::debug!(source = %self.label, "ffmpeg video stream ended");
        if !self.buffer.is_empty() {
            tracing::warn!(
                source = %self.label,
                trailing_bytes = self.buffer.len(),
                "video stream ended mid-frame"
            );
        }
        self.ended = true;
        self.rx = None;
    }

    fn detach(&mut self) {
        // Dropping the receiver makes the pump's next send fail, so nothing that arrives after
        // this point can surface as a frame.
        self.rx = None;
        self.ended = true;
        self.detached = true;
    }
}

impl Drop for FrameDemuxer {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::debug!(source = %self.label, error = %e, "error while dropping demuxer");
        }
    }
}

fn pump<R: Read>(mut reader: R, tx: SyncSender<Chunk>) {
    let mut scratch = vec![0u8; READ_CHUNK_BYTES];
    loop {
        let msg = match reader.read(&mut scratch) {
            Ok(0) => Chunk::End,
            Ok(n) => Chunk::Data(scratch[..n].to_vec()),
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => Chunk::Error(e),
        };
        let last = !matches!(msg, Chunk::Data(_));
        if tx.send(msg).is_err() || last {
            return;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/demux.rs"]
mod tests;
