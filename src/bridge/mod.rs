// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Bridges between the audio output and the engine.
//!
//! `Bridge` is a closed set of variants, one per strategy. Constructing a
//! bridge has no side effects; all work happens in `initialize`, which
//! consumes the bridge and so runs at most once per instance.
//!
//! * `SingleThreadSync` loads the engine and lets the output callback call it
//!   directly.
//! * The three worker variants spawn one host context, load the engine there,
//!   and wait for its readiness signal. Audio comes back through either a
//!   shared ring or a bounded block channel.
//! * `Unsupported` has no transport; initializing it is an error and the
//!   selector never does so.

mod single_thread;
mod transport;
mod worker;

pub use single_thread::SingleThreadBridge;
pub use worker::WorkerBridge;

use std::sync::Arc;

use crate::config::consts::{MAX_CHANNELS, MAX_SAMPLE_RATE, MIN_SAMPLE_RATE};
use crate::engine::{EngineLoader, RenderFormat};
use crate::errors::BridgeError;
use crate::host::{AudioContext, HostEnvironment, Mechanism};
use crate::package::EnginePackage;
use crate::selector::{StrategyChoice, Transport};
use crate::surface::ControlSurface;

/// Collaborators a bridge needs to initialize.
#[derive(Clone)]
pub struct BridgeContext {
    pub host: Arc<dyn HostEnvironment>,
    pub loader: Arc<dyn EngineLoader>,
    pub audio_context: AudioContext,
}

pub enum Bridge {
    SingleThreadSync(SingleThreadBridge),
    WorkletShared(WorkerBridge),
    WorkletMessagePassing(WorkerBridge),
    LegacyMessagePassing(WorkerBridge),
    Unsupported,
}

impl Bridge {
    /// The bridge for `choice`. Nothing is spawned or loaded yet.
    pub fn for_choice(choice: StrategyChoice, context: BridgeContext) -> Self {
        let worker = |mechanism, transport| {
            WorkerBridge::new(context.clone(), choice, mechanism, transport)
        };
        match choice {
            StrategyChoice::SingleThreadSync => {
                Self::SingleThreadSync(SingleThreadBridge::new(context.clone()))
            }
            StrategyChoice::WorkletShared => {
                Self::WorkletShared(worker(Mechanism::Worklet, Transport::SharedMemory))
            }
            StrategyChoice::WorkletMessagePassing => {
                Self::WorkletMessagePassing(worker(Mechanism::Worklet, Transport::MessagePassing))
            }
            StrategyChoice::LegacyMessagePassing => Self::LegacyMessagePassing(worker(
                Mechanism::LegacyCallback,
                Transport::MessagePassing,
            )),
            StrategyChoice::Unsupported => Self::Unsupported,
        }
    }

    pub fn strategy(&self) -> StrategyChoice {
        match self {
            Self::SingleThreadSync(_) => StrategyChoice::SingleThreadSync,
            Self::WorkletShared(_) => StrategyChoice::WorkletShared,
            Self::WorkletMessagePassing(_) => StrategyChoice::WorkletMessagePassing,
            Self::LegacyMessagePassing(_) => StrategyChoice::LegacyMessagePassing,
            Self::Unsupported => StrategyChoice::Unsupported,
        }
    }

    fn context(&self) -> Option<&BridgeContext> {
        match self {
            Self::SingleThreadSync(bridge) => Some(bridge.context()),
            Self::WorkletShared(bridge)
            | Self::WorkletMessagePassing(bridge)
            | Self::LegacyMessagePassing(bridge) => Some(bridge.context()),
            Self::Unsupported => None,
        }
    }

    /// Run the initialization protocol and hand back the control surface.
    pub async fn initialize(self, package: EnginePackage) -> Result<ControlSurface, BridgeError> {
        if let Some(context) = self.context() {
            check_format(&context.audio_context)?;
        }
        match self {
            Self::SingleThreadSync(bridge) => bridge.initialize(package).await,
            Self::WorkletShared(bridge)
            | Self::WorkletMessagePassing(bridge)
            | Self::LegacyMessagePassing(bridge) => bridge.initialize(package).await,
            Self::Unsupported => Err(BridgeError::Unsupported),
        }
    }
}

/// Rejects formats no transport can be sized for.
fn check_format(audio_context: &AudioContext) -> Result<(), BridgeError> {
    let sample_rate = audio_context.sample_rate();
    let channels = audio_context.channels();
    if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&sample_rate)
        || channels == 0
        || channels > MAX_CHANNELS
    {
        return Err(BridgeError::InvalidFormat {
            sample_rate,
            channels,
        });
    }
    Ok(())
}

fn render_format(audio_context: &AudioContext) -> RenderFormat {
    RenderFormat {
        sample_rate: audio_context.sample_rate(),
        channels: audio_context.channels(),
    }
}
