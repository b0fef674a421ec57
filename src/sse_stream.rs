//! Stream adapter turning an HTTP byte stream into SSE `data:` payloads.

use crate::Error;
use futures_util::{Stream, StreamExt};
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

/// Payload the chat-completions backend sends to mark the end of a stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Largest partial line held while waiting for its newline.
const MAX_LINE_BYTES: usize = 1_000_000;

const DATA_PREFIX: &str = "data:";

/// A stream adapter that yields the payload of every `data:` line in a byte stream.
///
/// Lines are split on `\n` (a preceding `\r` is tolerated) and only complete
/// lines are decoded, so frames and multi-byte characters may be split across
/// reads. Other SSE fields, comments and blank lines are discarded.
///
/// Reads happen only when the consumer polls. Once the inner stream ends,
/// fails, or a configured sentinel frame is seen, the inner stream is dropped,
/// which releases the underlying connection.
pub struct SseStream<S> {
    /// The underlying byte stream, `None` once finished
    inner: Option<S>,
    /// Bytes of the current incomplete line
    buffer: Vec<u8>,
    /// Decoded payloads ready to be yielded
    frames: VecDeque<String>,
    /// Payload that ends the stream without being yielded
    sentinel: Option<&'static str>,
}

impl<S> SseStream<S> {
    /// Create a new SSE stream from a byte stream.
    pub fn new(stream: S) -> Self {
        Self {
            inner: Some(stream),
            buffer: Vec::new(),
            frames: VecDeque::new(),
            sentinel: None,
        }
    }

    /// End the stream at the first frame equal to `sentinel`.
    pub fn stop_at(mut self, sentinel: &'static str) -> Self {
        self.sentinel = Some(sentinel);
        self
    }

    /// Extract the payload of a single line, if it is a `data:` line.
    fn parse_line(line: &str) -> Option<String> {
        line.trim()
            .strip_prefix(DATA_PREFIX)
            .map(|payload| payload.trim().to_string())
    }

    /// Move every complete line out of the buffer.
    fn drain_lines(&mut self) -> Result<(), Error> {
        let mut start = 0;

        while let Some(pos) = memchr::memchr(b'\n', &self.buffer[start..]) {
            let line_end = start + pos;
            let line = std::str::from_utf8(&self.buffer[start..line_end])
                .map_err(|e| Error::stream(format!("Invalid UTF-8 in SSE line: {e}")))?;

            if let Some(frame) = Self::parse_line(line) {
                self.frames.push_back(frame);
            }

            start = line_end + 1;
        }

        if start > 0 {
            self.buffer.drain(..start);
        }

        Ok(())
    }

    /// Flush a final unterminated `data:` line once the input has ended.
    fn flush_tail(&mut self) -> Result<(), Error> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let tail = std::mem::take(&mut self.buffer);
        let text = std::str::from_utf8(&tail)
            .map_err(|e| Error::stream(format!("Invalid UTF-8 in SSE line: {e}")))?;
        if let Some(frame) = Self::parse_line(text) {
            self.frames.push_back(frame);
        }
        Ok(())
    }

    /// Drop the inner stream and everything still buffered.
    fn finish(&mut self) {
        self.inner = None;
        self.buffer.clear();
        self.frames.clear();
    }
}

impl<S, E> Stream for SseStream<S>
where
    S: Stream<Item = Result<bytes::Bytes, E>> + Unpin,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    type Item = Result<String, Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if let Some(frame) = self.frames.pop_front() {
                if self.sentinel == Some(frame.as_str()) {
                    self.finish();
                    return Poll::Ready(None);
                }
                return Poll::Ready(Some(Ok(frame)));
            }

            let Some(inner) = self.inner.as_mut() else {
                return Poll::Ready(None);
            };

            match ready!(inner.poll_next_unpin(cx)) {
                Some(Ok(chunk)) => {
                    self.buffer.extend_from_slice(&chunk);

                    if let Err(e) = self.drain_lines() {
                        self.finish();
                        return Poll::Ready(Some(Err(e)));
                    }

                    if self.buffer.len() > MAX_LINE_BYTES {
                        self.finish();
                        return Poll::Ready(Some(Err(Error::stream(
                            "SSE line exceeded maximum size",
                        ))));
                    }
                }
                Some(Err(e)) => {
                    self.finish();
                    let e: Box<dyn std::error::Error + Send + Sync> = e.into();
                    return Poll::Ready(Some(Err(Error::stream(format!(
                        "Failed to read SSE body: {e}"
                    )))));
                }
                None => {
                    self.inner = None;
                    if let Err(e) = self.flush_tail() {
                        return Poll::Ready(Some(Err(e)));
                    }
                }
            }
        }
    }
}

/// Extension trait to add SSE parsing to byte streams.
pub trait SseStreamExt: Stream {
    /// Parse this byte stream as SSE `data:` payloads.
    fn sse_frames(self) -> SseStream<Self>
    where
        Self: Sized,
    {
        SseStream::new(self)
    }
}

impl<S: Stream> SseStreamExt for S {}
