//! Bounded request body reader.
//!
//! # Responsibilities
//! - Accumulate a streamed body up to `max_body_size` bytes
//! - Give up after `parse_timeout` (slow-loris guard)
//! - Report exactly one terminal outcome per request
//!
//! # Design Decisions
//! - [`BodyReadState`] is a synchronous state machine; [`read_bounded`] is the
//!   async driver feeding it chunk, end, error and timer events
//! - A chunk that crosses the limit is never buffered, so retained bytes stay
//!   at or below the limit whatever the peer keeps sending
//! - Returning from the driver drops both the stream and the timer

use std::fmt::Display;
use std::time::Duration;

use axum::body::Bytes;
use futures_util::{Stream, StreamExt};

/// Limits applied to a single body read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyLimits {
    pub max_body_size: usize,
    pub parse_timeout: Duration,
}

/// Terminal result of a body read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyOutcome {
    /// The whole body arrived within limits.
    Completed(Bytes),
    /// More than `limit` bytes were sent.
    SizeExceeded { received: usize, limit: usize },
    /// The body did not finish before the deadline.
    TimedOut,
    /// The underlying stream reported an error.
    TransportError(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadPhase {
    Reading,
    Completed,
    SizeExceeded,
    TimedOut,
    TransportError,
}

/// Per-request accumulation state.
///
/// Every event handler returns `Some` on the single terminal transition and
/// `None` otherwise, including for any event arriving after it.
#[derive(Debug)]
pub struct BodyReadState {
    buffer: Vec<u8>,
    byte_count: usize,
    max_body_size: usize,
    phase: ReadPhase,
}

impl BodyReadState {
    pub fn new(max_body_size: usize) -> Self {
        Self {
            buffer: Vec::new(),
            byte_count: 0,
            max_body_size,
            phase: ReadPhase::Reading,
        }
    }

    pub fn phase(&self) -> ReadPhase {
        self.phase
    }

    /// Bytes received so far, including a rejected chunk.
    pub fn byte_count(&self) -> usize {
        self.byte_count
    }

    /// Bytes currently buffered.
    pub fn retained(&self) -> usize {
        self.buffer.len()
    }

    pub fn on_chunk(&mut self, chunk: &[u8]) -> Option<BodyOutcome> {
        if self.phase != ReadPhase::Reading {
            return None;
        }

        self.byte_count = self.byte_count.saturating_add(chunk.len());
        if self.byte_count > self.max_body_size {
            self.phase = ReadPhase::SizeExceeded;
            self.buffer = Vec::new();
            return Some(BodyOutcome::SizeExceeded {
                received: self.byte_count,
                limit: self.max_body_size,
            });
        }

        self.buffer.extend_from_slice(chunk);
        None
    }

    pub fn on_end(&mut self) -> Option<BodyOutcome> {
        self.finish(ReadPhase::Completed)?;
        Some(BodyOutcome::Completed(Bytes::from(std::mem::take(
            &mut self.buffer,
        ))))
    }

    pub fn on_timeout(&mut self) -> Option<BodyOutcome> {
        self.finish(ReadPhase::TimedOut)?;
        self.buffer = Vec::new();
        Some(BodyOutcome::TimedOut)
    }

    pub fn on_error(&mut self, error: &dyn Display) -> Option<BodyOutcome> {
        self.finish(ReadPhase::TransportError)?;
        self.buffer = Vec::new();
        Some(BodyOutcome::TransportError(error.to_string()))
    }

    fn finish(&mut self, phase: ReadPhase) -> Option<()> {
        if self.phase != ReadPhase::Reading {
            return None;
        }
        self.phase = phase;
        Some(())
    }
}

/// Drive `stream` through a [`BodyReadState`] until a terminal outcome.
pub async fn read_bounded<S, E>(stream: S, limits: BodyLimits) -> BodyOutcome
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Display,
{
    let mut state = BodyReadState::new(limits.max_body_size);
    let deadline = tokio::time::sleep(limits.parse_timeout);
    tokio::pin!(deadline);
    tokio::pin!(stream);

    loop {
        let transition = tokio::select! {
            biased;
            () = &mut deadline => state.on_timeout(),
            next = stream.next() => match next {
                Some(Ok(chunk)) => state.on_chunk(&chunk),
                Some(Err(err)) => state.on_error(&err),
                None => state.on_end(),
            },
        };

        if let Some(outcome) = transition {
            return outcome;
        }
    }
}
