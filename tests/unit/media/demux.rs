use super::*;
use std::io;

struct ChunkedReader {
    data: Vec<u8>,
    pos: usize,
    splits: Vec<usize>,
    next: usize,
}

impl ChunkedReader {
    fn new(data: Vec<u8>, splits: &[usize]) -> Self {
        Self {
            data,
            pos: 0,
            splits: splits.to_vec(),
            next: 0,
        }
    }
}

impl Read for ChunkedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos >= self.data.len() {
            return Ok(0);
        }
        let want = self.splits[self.next % self.splits.len()].max(1);
        self.next += 1;
        let n = want.min(buf.len()).min(self.data.len() - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// Blocks until the test hands it bytes; EOF once the sender is dropped.
struct ChannelReader {
    rx: mpsc::Receiver<Vec<u8>>,
}

impl Read for ChannelReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.rx.recv() {
            Ok(bytes) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                Ok(n)
            }
            Err(_) => Ok(0),
        }
    }
}

struct FailingReader {
    sent: bool,
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.sent {
            self.sent = true;
            buf[0] = 1;
            return Ok(1);
        }
        Err(io::Error::other("broken pipe"))
    }
}

fn frames_stream(frames: usize, frame_len: usize) -> Vec<u8> {
    (0..frames * frame_len).map(|i| (i % 253) as u8).collect()
}

fn drain(demuxer: &mut FrameDemuxer) -> Vec<Vec<u8>> {
    let mut out = Vec::new();
    while let Some(frame) = demuxer.read_next_frame().unwrap() {
        out.push(frame);
    }
    out
}

#[test]
fn frames_are_identical_for_any_fragmentation() {
    let frame_len = 4 * 3 * 2;
    let bytes = frames_stream(6, frame_len);
    let expected: Vec<Vec<u8>> = bytes.chunks(frame_len).map(<[u8]>::to_vec).collect();

    let patterns: [&[usize]; 6] = [&[1], &[5, 19], &[24], &[25], &[100], &[3, 70, 1, 44]];
    for splits in patterns {
        let reader = ChunkedReader::new(bytes.clone(), splits);
        let mut d =
            FrameDemuxer::from_reader("test", reader, frame_len, Duration::from_secs(5)).unwrap();
        assert_eq!(drain(&mut d), expected, "splits {splits:?}");
        assert!(d.is_ended());
        d.close().unwrap();
    }
}

#[test]
fn pull_after_end_returns_none_repeatedly() {
    let reader = ChunkedReader::new(frames_stream(1, 8), &[8]);
    let mut d = FrameDemuxer::from_reader("test", reader, 8, Duration::from_secs(5)).unwrap();
    assert!(d.read_next_frame().unwrap().is_some());
    assert!(d.read_next_frame().unwrap().is_none());
    assert!(d.read_next_frame().unwrap().is_none());
    assert!(d.read_next_frame().unwrap().is_none());
}

#[test]
fn trailing_partial_frame_is_never_emitted() {
    let mut bytes = frames_stream(2, 8);
    bytes.extend_from_slice(&[9, 9, 9]);
    let reader = ChunkedReader::new(bytes, &[5]);
    let mut d = FrameDemuxer::from_reader("test", reader, 8, Duration::from_secs(5)).unwrap();
    assert_eq!(drain(&mut d).len(), 2);
}

#[test]
fn stall_resolves_to_none_once_and_late_bytes_are_dropped() {
    let (tx, rx) = mpsc::channel::<Vec<u8>>();
    let mut d = FrameDemuxer::from_reader(
        "stalled",
        ChannelReader { rx },
        4,
        Duration::from_millis(50),
    )
    .unwrap();

    tx.send(vec![1, 2, 3, 4, 5, 6]).unwrap();
    assert_eq!(d.read_next_frame().unwrap(), Some(vec![1, 2, 3, 4]));

    let started = Instant::now();
    assert_eq!(d.read_next_frame().unwrap(), None);
    assert!(started.elapsed() >= Duration::from_millis(50));
    assert!(d.is_ended());

    let _ = tx.send(vec![7, 8, 9, 10, 11, 12]);
    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(d.read_next_frame().unwrap(), None);
    assert_eq!(d.read_next_frame().unwrap(), None);
    d.close().unwrap();
}

#[test]
fn transport_error_is_a_stream_error() {
    let mut d = FrameDemuxer::from_reader(
        "broken",
        FailingReader { sent: false },
        4,
        Duration::from_secs(5),
    )
    .unwrap();
    let err = d.read_next_frame().unwrap_err();
    assert!(matches!(err, WavyteError::Stream(_)), "{err}");
    assert!(d.read_next_frame().unwrap().is_none());
}

#[test]
fn close_is_idempotent_and_ends_the_sequence() {
    let reader = ChunkedReader::new(frames_stream(3, 4), &[2]);
    let mut d = FrameDemuxer::from_reader("test", reader, 4, Duration::from_secs(5)).unwrap();
    assert!(d.read_next_frame().unwrap().is_some());
    d.close().unwrap();
    d.close().unwrap();
    assert!(d.is_ended());
}

#[test]
fn zero_frame_length_is_rejected() {
    let reader = ChunkedReader::new(Vec::new(), &[1]);
    assert!(FrameDemuxer::from_reader("test", reader, 0, DEFAULT_FRAME_TIMEOUT).is_err());
}

#[test]
fn close_does_not_wait_for_a_reader_blocked_without_a_process() {
    let (tx, rx) = mpsc::channel::<Vec<u8>>();
    let mut d = FrameDemuxer::from_reader(
        "blocked",
        ChannelReader { rx },
        4,
        Duration::from_secs(30),
    )
    .unwrap();

    let started = Instant::now();
    d.close().unwrap();
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(d.read_next_frame().unwrap(), None);
    // Unblocks the pump, whose next send then fails and ends the thread.
    drop(tx);
}
