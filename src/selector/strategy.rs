// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt::{Display, Formatter};

use crate::host::{Capabilities, Mechanism};

/// How rendered audio crosses from the engine's context to the output.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Transport {
    /// Lock-free ring in memory both contexts can see.
    SharedMemory,
    /// Copied blocks over a bounded channel.
    MessagePassing,
}

/// Concurrency strategy for one acquisition.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum StrategyChoice {
    SingleThreadSync,
    WorkletShared,
    WorkletMessagePassing,
    LegacyMessagePassing,
    Unsupported,
}

impl StrategyChoice {
    /// Selection policy; the first matching rule wins.
    ///
    /// 1. No worker requested: single-threaded, capabilities ignored.
    /// 2. No background mechanism: unsupported.
    /// 3. Worklet is preferred over the legacy callback.
    /// 4. Shared memory only for a worklet, and only when the host allows it.
    pub fn resolve(use_worker: bool, capabilities: &Capabilities) -> Self {
        if !use_worker {
            return Self::SingleThreadSync;
        }
        if capabilities.has_worklet {
            if capabilities.has_shared_memory {
                Self::WorkletShared
            } else {
                Self::WorkletMessagePassing
            }
        } else if capabilities.has_legacy_callback {
            Self::LegacyMessagePassing
        } else {
            Self::Unsupported
        }
    }

    /// Background mechanism, if the strategy has one.
    pub fn mechanism(self) -> Option<Mechanism> {
        match self {
            Self::WorkletShared | Self::WorkletMessagePassing => Some(Mechanism::Worklet),
            Self::LegacyMessagePassing => Some(Mechanism::LegacyCallback),
            Self::SingleThreadSync | Self::Unsupported => None,
        }
    }

    /// Transport between contexts, if the strategy has one.
    pub fn transport(self) -> Option<Transport> {
        match self {
            Self::WorkletShared => Some(Transport::SharedMemory),
            Self::WorkletMessagePassing | Self::LegacyMessagePassing => {
                Some(Transport::MessagePassing)
            }
            Self::SingleThreadSync | Self::Unsupported => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SingleThreadSync => "single-thread-sync",
            Self::WorkletShared => "worklet-shared",
            Self::WorkletMessagePassing => "worklet-message-passing",
            Self::LegacyMessagePassing => "legacy-message-passing",
            Self::Unsupported => "unsupported",
        }
    }
}

impl Display for StrategyChoice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
