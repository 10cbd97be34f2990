// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Advisory messages emitted while choosing a strategy.
//!
//! These go through the `AdvisoryLog` collaborator rather than straight to
//! `tracing`, so callers can capture or redirect them.

use crate::host::{Capabilities, Mechanism};
use crate::selector::StrategyChoice;
use std::fmt::{Display, Formatter};

/// Strategy chosen for this acquisition.
///
/// # Channel
/// The mechanism's channel, or `General` for the single-threaded strategy.
pub struct StrategySelected {
    pub strategy: StrategyChoice,
}

impl Display for StrategySelected {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.strategy.mechanism() {
            Some(mechanism) => write!(
                f,
                "Using {} support: {} strategy",
                mechanism, self.strategy
            ),
            None => write!(
                f,
                "Worker not requested: {} strategy on the caller's thread",
                self.strategy
            ),
        }
    }
}

/// Neither background mechanism exists; no engine will be created.
///
/// # Channel
/// `General`, error level
pub struct NoAudioBackend;

impl Display for NoAudioBackend {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Neither worklet nor legacy callback support detected; audio is unavailable"
        )
    }
}

/// A background mechanism exists but shared memory does not.
///
/// # Channel
/// `SharedMemory`, warn level
pub struct SharedMemoryUnavailable {
    pub mechanism: Mechanism,
}

impl Display for SharedMemoryUnavailable {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Shared memory unavailable; {} context falls back to message passing",
            self.mechanism
        )
    }
}

/// Probe results, traced at debug level.
pub struct CapabilitiesProbed {
    pub capabilities: Capabilities,
}

impl Display for CapabilitiesProbed {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Probed host: worklet={} legacy_callback={} shared_memory={}",
            self.capabilities.has_worklet,
            self.capabilities.has_legacy_callback,
            self.capabilities.has_shared_memory
        )
    }
}
