// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Output transports between a background context and the audio context.

use crossbeam_channel::Sender;
use ringbuf::traits::{Observer, Producer, Split};
use ringbuf::{HeapProd, HeapRb};

use crate::config::consts::{MESSAGE_QUEUE_BLOCKS, SHARED_RING_QUANTA};
use crate::engine::ComputeEngine;
use crate::host::RenderSource;
use crate::observability::messages::engine::{BlockDropped, RenderFailed};
use crate::selector::Transport;

/// Producer half of a transport, owned by the background context.
pub(crate) enum OutputTransport {
    Shared(HeapProd<f32>),
    Messages(Sender<Vec<f32>>),
}

impl OutputTransport {
    /// Create both halves for blocks of `block_len` interleaved samples.
    pub(crate) fn create(transport: Transport, block_len: usize) -> (Self, RenderSource) {
        match transport {
            Transport::SharedMemory => {
                let (producer, consumer) = HeapRb::<f32>::new(block_len * SHARED_RING_QUANTA).split();
                (Self::Shared(producer), RenderSource::Ring(consumer))
            }
            Transport::MessagePassing => {
                let (sender, receiver) = crossbeam_channel::bounded(MESSAGE_QUEUE_BLOCKS);
                (Self::Messages(sender), RenderSource::blocks(receiver))
            }
        }
    }

    fn has_room(&self, block_len: usize) -> bool {
        match self {
            Self::Shared(producer) => producer.vacant_len() >= block_len,
            Self::Messages(sender) => !sender.is_full(),
        }
    }

    /// Render blocks until the transport is full or the engine has nothing
    /// to give. Returns the number of blocks delivered.
    pub(crate) fn pump(&mut self, engine: &mut dyn ComputeEngine, scratch: &mut [f32]) -> u64 {
        let mut blocks = 0;
        while self.has_room(scratch.len()) {
            let written = match engine.render(scratch) {
                Ok(0) => break,
                Ok(written) => written,
                Err(error) => {
                    tracing::warn!("{}", RenderFailed { error: &error });
                    break;
                }
            };

            let block = &scratch[..written];
            match self {
                Self::Shared(producer) => {
                    producer.push_slice(block);
                }
                Self::Messages(sender) => {
                    if sender.try_send(block.to_vec()).is_err() {
                        tracing::debug!("{}", BlockDropped { samples: written });
                        break;
                    }
                }
            }
            blocks += 1;
        }
        blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Operation;
    use crate::testing::ToneEngine;

    fn running_engine() -> ToneEngine {
        let mut engine = ToneEngine::new(2);
        engine.invoke(&Operation::Start).unwrap();
        engine
    }

    #[test]
    fn test_shared_ring_fills_to_capacity() {
        let (mut output, _source) = OutputTransport::create(Transport::SharedMemory, 8);
        let mut engine = running_engine();
        let mut scratch = vec![0.0; 8];

        assert_eq!(output.pump(&mut engine, &mut scratch), SHARED_RING_QUANTA as u64);
        assert_eq!(output.pump(&mut engine, &mut scratch), 0);
    }

    #[test]
    fn test_message_queue_is_bounded() {
        let (mut output, _source) = OutputTransport::create(Transport::MessagePassing, 8);
        let mut engine = running_engine();
        let mut scratch = vec![0.0; 8];

        assert_eq!(output.pump(&mut engine, &mut scratch), MESSAGE_QUEUE_BLOCKS as u64);
        assert_eq!(output.pump(&mut engine, &mut scratch), 0);
    }

    #[test]
    fn test_stopped_engine_sends_nothing() {
        let (mut output, _source) = OutputTransport::create(Transport::MessagePassing, 8);
        let mut engine = ToneEngine::new(2);
        let mut scratch = vec![0.0; 8];

        assert_eq!(output.pump(&mut engine, &mut scratch), 0);
    }
}
