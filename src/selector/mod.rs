// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Strategy selection and engine acquisition.
//!
//! `StrategySelector::acquire_engine` walks a fixed state machine:
//!
//! ```text
//! Start -> Probed -> Chosen -> Initializing -> Ready | Failed
//!                        \-> Absent   (no audio backend)
//! ```
//!
//! Probing and choosing are synchronous and pure; bridge initialization is
//! the only point where the call suspends. A committed choice is never
//! downgraded: if its bridge fails, the error is returned as is.

mod strategy;

#[cfg(test)]
mod integration_tests;

pub use strategy::{StrategyChoice, Transport};

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;

use crate::bridge::{Bridge, BridgeContext};
use crate::engine::{EngineLoader, WasmEngineLoader};
use crate::errors::AcquireError;
use crate::host::{AudioContext, Capabilities, HostEnvironment};
use crate::observability::messages::bridge::{
    BridgeInitFailed, BridgeInitStarted, BridgeInitTimedOut, BridgeReady, PhaseEntered,
};
use crate::observability::messages::selection::{
    CapabilitiesProbed, NoAudioBackend, SharedMemoryUnavailable, StrategySelected,
};
use crate::observability::messages::StructuredLog;
use crate::observability::{advise, AdvisoryLog, LogChannel, LogLevel, TracingAdvisoryLog};
use crate::package::EnginePackage;
use crate::surface::ControlSurface;

/// Acquisition state.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Phase {
    Start,
    Probed,
    Chosen(StrategyChoice),
    Initializing,
    Ready,
    Failed,
    Absent,
}

fn enter(phase: Phase) {
    tracing::debug!("{}", PhaseEntered { phase });
}

/// Per-call acquisition options.
///
/// # Fields
/// * `audio_context` - Output context to render into (defaults to a new platform-default context)
/// * `use_worker` - Run the engine in a background context (defaults to false)
/// * `init_timeout` - Deadline for bridge initialization (defaults to none)
/// * `log` - Advisory log for this call only (defaults to the selector's)
#[derive(Clone, Default)]
pub struct AcquireOptions {
    pub audio_context: Option<AudioContext>,
    pub use_worker: bool,
    pub init_timeout: Option<Duration>,
    pub log: Option<Arc<dyn AdvisoryLog>>,
}

impl AcquireOptions {
    pub fn worker() -> Self {
        Self {
            use_worker: true,
            ..Self::default()
        }
    }
}

/// Picks a strategy for the host and initializes the matching bridge.
pub struct StrategySelector {
    host: Arc<dyn HostEnvironment>,
    loader: Arc<dyn EngineLoader>,
    package: EnginePackage,
    log: Arc<dyn AdvisoryLog>,
}

impl StrategySelector {
    /// Selector using `WasmEngineLoader` and `TracingAdvisoryLog`.
    pub fn new(host: Arc<dyn HostEnvironment>, package: EnginePackage) -> Self {
        Self {
            host,
            loader: Arc::new(WasmEngineLoader::default()),
            package,
            log: Arc::new(TracingAdvisoryLog),
        }
    }

    pub fn with_loader(mut self, loader: Arc<dyn EngineLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_log(mut self, log: Arc<dyn AdvisoryLog>) -> Self {
        self.log = log;
        self
    }

    pub fn package(&self) -> &EnginePackage {
        &self.package
    }

    /// Acquire an engine.
    ///
    /// Returns `Ok(None)` when the host has no audio backend, an error when
    /// the chosen bridge cannot initialize, and the control surface
    /// otherwise. Each call builds its own bridge.
    pub async fn acquire_engine(
        &self,
        options: AcquireOptions,
    ) -> Result<Option<ControlSurface>, AcquireError> {
        let AcquireOptions {
            audio_context,
            use_worker,
            init_timeout,
            log,
        } = options;
        let log = log.unwrap_or_else(|| Arc::clone(&self.log));

        enter(Phase::Start);
        self.host.prepare_audio_session();

        let capabilities = if use_worker {
            let capabilities = Capabilities::probe(self.host.as_ref());
            tracing::debug!("{}", CapabilitiesProbed { capabilities });
            enter(Phase::Probed);
            Some(capabilities)
        } else {
            None
        };

        let choice = match &capabilities {
            Some(capabilities) => StrategyChoice::resolve(true, capabilities),
            None => StrategyChoice::SingleThreadSync,
        };
        enter(Phase::Chosen(choice));
        announce(log.as_ref(), choice, capabilities);

        if choice == StrategyChoice::Unsupported {
            enter(Phase::Absent);
            return Ok(None);
        }

        let bridge = Bridge::for_choice(
            choice,
            BridgeContext {
                host: Arc::clone(&self.host),
                loader: Arc::clone(&self.loader),
                audio_context: audio_context.unwrap_or_default(),
            },
        );

        enter(Phase::Initializing);
        let digest = self.package.digest();
        let started = BridgeInitStarted {
            strategy: choice,
            digest: &digest,
        };
        started.log();
        let span = started.span("acquire_engine");
        let began = Instant::now();
        let init = bridge.initialize(self.package.clone()).instrument(span);

        let outcome = match init_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, init).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    tracing::error!(
                        "{}",
                        BridgeInitTimedOut {
                            strategy: choice,
                            timeout,
                        }
                    );
                    enter(Phase::Failed);
                    return Err(AcquireError::InitTimeout {
                        strategy: choice,
                        timeout,
                    });
                }
            },
            None => init.await,
        };

        match outcome {
            Ok(surface) => {
                tracing::info!(
                    "{}",
                    BridgeReady {
                        strategy: choice,
                        elapsed: began.elapsed(),
                    }
                );
                enter(Phase::Ready);
                Ok(Some(surface))
            }
            Err(source) => {
                BridgeInitFailed {
                    strategy: choice,
                    error: &source,
                }
                .log();
                enter(Phase::Failed);
                Err(AcquireError::BridgeInit {
                    strategy: choice,
                    source,
                })
            }
        }
    }
}

/// Exactly one selection advisory, plus the degraded-mode warning when a
/// background mechanism exists without shared memory.
fn announce(log: &dyn AdvisoryLog, choice: StrategyChoice, capabilities: Option<Capabilities>) {
    match choice.mechanism() {
        Some(mechanism) => advise(
            log,
            LogChannel::for_mechanism(mechanism),
            LogLevel::Info,
            &StrategySelected { strategy: choice },
        ),
        None if choice == StrategyChoice::Unsupported => {
            advise(log, LogChannel::General, LogLevel::Error, &NoAudioBackend)
        }
        None => advise(
            log,
            LogChannel::General,
            LogLevel::Info,
            &StrategySelected { strategy: choice },
        ),
    }

    if let (Some(capabilities), Some(mechanism)) = (capabilities, choice.mechanism()) {
        if !capabilities.has_shared_memory {
            advise(
                log,
                LogChannel::SharedMemory,
                LogLevel::Warn,
                &SharedMemoryUnavailable { mechanism },
            );
        }
    }
}
