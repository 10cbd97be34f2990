// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Caller-owned audio output context.
//!
//! The context describes the output device (sample rate, channel count) and
//! owns its lifecycle. Only the caller resumes, suspends or closes it. A
//! bridge attaches a `RenderSource` so the device callback can pull
//! interleaved samples with `AudioContext::render`; it never touches the
//! lifecycle.

use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use ringbuf::traits::Consumer;
use ringbuf::HeapCons;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::config::consts::{DEFAULT_CHANNELS, DEFAULT_SAMPLE_RATE};
use crate::engine::SharedEngine;
use crate::observability::messages::engine::RenderFailed;

/// Lifecycle state of an `AudioContext`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ContextState {
    Suspended,
    Running,
    Closed,
}

/// Where rendered audio comes from, as attached by a bridge.
pub(crate) enum RenderSource {
    /// The engine renders on the thread calling `render`.
    Direct(SharedEngine),
    /// Samples arrive through a lock-free shared ring.
    Ring(HeapCons<f32>),
    /// Samples arrive as copied blocks.
    Blocks {
        receiver: Receiver<Vec<f32>>,
        pending: Vec<f32>,
        offset: usize,
    },
}

impl RenderSource {
    pub(crate) fn blocks(receiver: Receiver<Vec<f32>>) -> Self {
        Self::Blocks {
            receiver,
            pending: Vec::new(),
            offset: 0,
        }
    }

    fn fill(&mut self, out: &mut [f32]) -> usize {
        match self {
            Self::Direct(engine) => match engine.lock().render(out) {
                Ok(written) => written,
                Err(error) => {
                    tracing::warn!("{}", RenderFailed { error: &error });
                    0
                }
            },
            Self::Ring(consumer) => consumer.pop_slice(out),
            Self::Blocks {
                receiver,
                pending,
                offset,
            } => {
                let mut written = 0;
                while written < out.len() {
                    if *offset >= pending.len() {
                        match receiver.try_recv() {
                            Ok(block) => {
                                *pending = block;
                                *offset = 0;
                                continue;
                            }
                            Err(_) => break,
                        }
                    }
                    let n = (pending.len() - *offset).min(out.len() - written);
                    out[written..written + n].copy_from_slice(&pending[*offset..*offset + n]);
                    written += n;
                    *offset += n;
                }
                written
            }
        }
    }
}

struct Attachment {
    id: u64,
    source: RenderSource,
}

struct ContextInner {
    sample_rate: u32,
    channels: u16,
    state: Mutex<ContextState>,
    attachment: Mutex<Option<Attachment>>,
    next_attachment: AtomicU64,
}

/// Handle to an audio output context. Clones share the same context.
#[derive(Clone)]
pub struct AudioContext {
    inner: Arc<ContextInner>,
}

impl Default for AudioContext {
    /// Platform default output: 44.1 kHz stereo, initially suspended.
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE, DEFAULT_CHANNELS)
    }
}

impl std::fmt::Debug for AudioContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioContext")
            .field("sample_rate", &self.inner.sample_rate)
            .field("channels", &self.inner.channels)
            .field("state", &self.state())
            .field("attached", &self.is_attached())
            .finish()
    }
}

impl AudioContext {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                sample_rate,
                channels,
                state: Mutex::new(ContextState::Suspended),
                attachment: Mutex::new(None),
                next_attachment: AtomicU64::new(1),
            }),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.inner.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.inner.channels
    }

    pub fn state(&self) -> ContextState {
        *self.inner.state.lock()
    }

    /// Start pulling audio. No effect once closed.
    pub fn resume(&self) {
        let mut state = self.inner.state.lock();
        if *state != ContextState::Closed {
            *state = ContextState::Running;
        }
    }

    /// Stop pulling audio. No effect once closed.
    pub fn suspend(&self) {
        let mut state = self.inner.state.lock();
        if *state != ContextState::Closed {
            *state = ContextState::Suspended;
        }
    }

    /// Close the context for good and drop any attached source.
    pub fn close(&self) {
        *self.inner.state.lock() = ContextState::Closed;
        self.inner.attachment.lock().take();
    }

    /// Whether a bridge currently feeds this context.
    pub fn is_attached(&self) -> bool {
        self.inner.attachment.lock().is_some()
    }

    /// Device callback entry point.
    ///
    /// Fills `out` with interleaved samples and returns how many came from
    /// the engine. The remainder is zero-filled, as is the whole buffer while
    /// the context is not running or nothing is attached.
    ///
    /// A single-thread engine runs inside this call, so call it from a
    /// device thread or `spawn_blocking`, never from an async task.
    pub fn render(&self, out: &mut [f32]) -> usize {
        let written = if self.state() == ContextState::Running {
            match self.inner.attachment.lock().as_mut() {
                Some(attachment) => attachment.source.fill(out),
                None => 0,
            }
        } else {
            0
        };
        out[written..].fill(0.0);
        written
    }

    /// Attach a render source, replacing any previous one.
    ///
    /// Returns an id for `detach`.
    pub(crate) fn attach(&self, source: RenderSource) -> u64 {
        let id = self.inner.next_attachment.fetch_add(1, Ordering::Relaxed);
        *self.inner.attachment.lock() = Some(Attachment { id, source });
        id
    }

    /// Detach the source registered under `id`. A newer attachment is left
    /// in place.
    pub(crate) fn detach(&self, id: u64) {
        let mut attachment = self.inner.attachment.lock();
        if attachment.as_ref().map(|a| a.id) == Some(id) {
            attachment.take();
        }
    }
}
