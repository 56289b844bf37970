//! Append-only output log shared between a PTY's I/O threads and readers.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

/// Accumulated output and exit state of one session.
///
/// Writers are the session's reader and waiter threads; everything else only
/// reads. The byte log never shrinks, so any position handed out stays valid.
#[derive(Debug, Default)]
pub struct OutputBuffer {
    inner: Mutex<OutputState>,
}

#[derive(Debug, Default)]
struct OutputState {
    bytes: Vec<u8>,
    last_output_at: Option<DateTime<Utc>>,
    exit_code: Option<i32>,
    stream_closed: bool,
}

/// A read of the log from some position to its current end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSlice {
    /// Decoded text between the requested position and `end`.
    pub text: String,

    /// Position to resume from.
    pub end: usize,

    /// Exit code, if the process had exited when the slice was taken.
    pub exit_code: Option<i32>,
}

/// Point-in-time view of the log without copying its contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputProgress {
    pub len: usize,
    pub stream_closed: bool,
    pub exit_code: Option<i32>,
    pub last_output_at: Option<DateTime<Utc>>,
}

impl OutputBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk of output.
    pub fn append(&self, chunk: &[u8]) {
        if chunk.is_empty() {
            return;
        }
        let mut state = self.inner.lock();
        state.bytes.extend_from_slice(chunk);
        state.last_output_at = Some(Utc::now());
    }

    /// Record the process exit code. Only the first call has any effect.
    pub fn record_exit(&self, code: i32) {
        let mut state = self.inner.lock();
        if state.exit_code.is_none() {
            state.exit_code = Some(code);
        }
    }

    /// Mark the output stream as finished; no more appends will follow.
    pub fn close_stream(&self) {
        self.inner.lock().stream_closed = true;
    }

    /// Current length in bytes.
    pub fn len(&self) -> usize {
        self.inner.lock().bytes.len()
    }

    /// Whether nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Exit code, once the process has exited.
    pub fn exit_code(&self) -> Option<i32> {
        self.inner.lock().exit_code
    }

    /// Snapshot of length, exit and stream state.
    pub fn progress(&self) -> OutputProgress {
        let state = self.inner.lock();
        OutputProgress {
            len: state.bytes.len(),
            stream_closed: state.stream_closed,
            exit_code: state.exit_code,
            last_output_at: state.last_output_at,
        }
    }

    /// Read everything from `from` to the end of the log.
    ///
    /// The returned `end` never splits a UTF-8 sequence: an incomplete
    /// trailing character stays unread until the rest of it arrives. A
    /// `from` past the end yields empty text and the current length.
    pub fn read_from(&self, from: usize) -> OutputSlice {
        let state = self.inner.lock();
        let len = state.bytes.len();

        if from >= len {
            return OutputSlice {
                text: String::new(),
                end: len,
                exit_code: state.exit_code,
            };
        }

        let end = if state.stream_closed {
            len
        } else {
            char_boundary_end(&state.bytes[from..]) + from
        };

        OutputSlice {
            text: String::from_utf8_lossy(&state.bytes[from..end]).into_owned(),
            end,
            exit_code: state.exit_code,
        }
    }
}

/// Length of `bytes` minus any incomplete UTF-8 sequence at its tail.
fn char_boundary_end(bytes: &[u8]) -> usize {
    let len = bytes.len();
    // A UTF-8 sequence is at most four bytes; look back over three.
    for back in 1..=len.min(3) {
        let byte = bytes[len - back];
        if byte & 0b1100_0000 == 0b1000_0000 {
            // continuation byte, keep looking for the lead byte
            continue;
        }
        let needed = match byte {
            b if b & 0b1000_0000 == 0 => 1,
            b if b & 0b1110_0000 == 0b1100_0000 => 2,
            b if b & 0b1111_0000 == 0b1110_0000 => 3,
            b if b & 0b1111_1000 == 0b1111_0000 => 4,
            // invalid lead byte, let lossy decoding deal with it
            _ => return len,
        };
        return if needed > back { len - back } else { len };
    }
    len
}
