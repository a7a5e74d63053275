//! Byte- and time-bounded body reader
//!
//! Upstream seller pages can run to several hundred KB while the regions we
//! extract sit near the top. This reader stops buffering at a hard byte cap,
//! can stop early once a marker shows the wanted region has arrived, and
//! enforces a wall-clock deadline measured from the start of the request.

use crate::MirrorError;
use futures::{Stream, StreamExt};
use regex::Regex;
use std::time::Duration;
use tokio::time::Instant;

/// Content-based early termination
#[derive(Debug, Clone)]
pub struct EarlyAbort {
    /// Buffered bytes required before the marker is tested
    pub min_bytes: usize,

    /// Pattern tested against the buffer decoded as UTF-8
    pub marker: Regex,
}

/// Limits applied to a single body read
#[derive(Debug, Clone)]
pub struct StreamLimits {
    pub max_bytes: usize,
    pub timeout: Duration,
    pub early_abort: Option<EarlyAbort>,
}

impl StreamLimits {
    pub fn new(max_bytes: usize, timeout: Duration) -> Self {
        Self {
            max_bytes,
            timeout,
            early_abort: None,
        }
    }

    pub fn with_early_abort(mut self, min_bytes: usize, marker: Regex) -> Self {
        self.early_abort = Some(EarlyAbort { min_bytes, marker });
        self
    }
}

/// Why a read stopped before the stream ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    ByteCap,
    EarlyAbort,
}

/// A body read to completion or intentionally cut short
#[derive(Debug, Clone)]
pub struct BoundedBody {
    /// Buffered bytes, never longer than `max_bytes`
    pub buffer: Vec<u8>,

    /// Bytes received from the wire, including dropped excess
    pub byte_count: u64,

    pub elapsed_ms: u64,

    /// Set when the reader tore the stream down itself
    pub aborted: Option<AbortReason>,
}

impl BoundedBody {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.buffer).into_owned()
    }
}

/// Reads `stream` into memory under `limits`
///
/// `started` is when the request was sent; the timeout is measured from
/// there, not per chunk. Returning early drops the stream, which closes the
/// underlying connection. A byte-cap or early-abort stop is a successful
/// read. Timeout and stream errors fail the read.
pub async fn read_bounded<S, B, E>(
    url: &str,
    stream: S,
    limits: &StreamLimits,
    started: Instant,
) -> Result<BoundedBody, MirrorError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::error::Error + Send + Sync + 'static,
{
    let deadline = started + limits.timeout;
    let mut buffer: Vec<u8> = Vec::with_capacity(limits.max_bytes.min(64 * 1024));
    let mut byte_count: u64 = 0;
    let mut aborted = None;

    tokio::pin!(stream);

    loop {
        let next = match tokio::time::timeout_at(deadline, stream.next()).await {
            Ok(next) => next,
            Err(_) => {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                tracing::debug!("Body read for {} timed out after {}ms", url, elapsed_ms);
                return Err(MirrorError::Timeout {
                    url: url.to_string(),
                    elapsed_ms,
                });
            }
        };

        let chunk = match next {
            Some(Ok(chunk)) => chunk,
            Some(Err(e)) => {
                return Err(MirrorError::Stream {
                    url: url.to_string(),
                    source: Box::new(e),
                })
            }
            None => break,
        };

        let chunk = chunk.as_ref();
        byte_count += chunk.len() as u64;

        let room = limits.max_bytes.saturating_sub(buffer.len());
        buffer.extend_from_slice(&chunk[..chunk.len().min(room)]);

        if byte_count > limits.max_bytes as u64 {
            tracing::debug!(
                "Body for {} exceeded {} bytes, closing connection",
                url,
                limits.max_bytes
            );
            aborted = Some(AbortReason::ByteCap);
            break;
        }

        if let Some(early) = &limits.early_abort {
            if buffer.len() >= early.min_bytes
                && early.marker.is_match(&String::from_utf8_lossy(&buffer))
            {
                tracing::debug!("Early abort for {} at {} bytes", url, buffer.len());
                aborted = Some(AbortReason::EarlyAbort);
                break;
            }
        }
    }

    Ok(BoundedBody {
        buffer,
        byte_count,
        elapsed_ms: started.elapsed().as_millis() as u64,
        aborted,
    })
}
