// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt::{Display, Formatter};

use crate::host::Mechanism;

/// Advisory log channel.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LogChannel {
    General,
    SharedMemory,
    Worklet,
    Legacy,
}

impl LogChannel {
    /// Channel that reports on `mechanism`.
    pub fn for_mechanism(mechanism: Mechanism) -> Self {
        match mechanism {
            Mechanism::Worklet => Self::Worklet,
            Mechanism::LegacyCallback => Self::Legacy,
        }
    }

    /// `tracing` target used by `TracingAdvisoryLog`.
    pub fn target(self) -> &'static str {
        match self {
            Self::General => "switchboard",
            Self::SharedMemory => "switchboard::shared_memory",
            Self::Worklet => "switchboard::worklet",
            Self::Legacy => "switchboard::legacy",
        }
    }
}

impl Display for LogChannel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.target())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Fire-and-forget sink for selection advisories.
pub trait AdvisoryLog: Send + Sync {
    fn emit(&self, channel: LogChannel, level: LogLevel, message: &str);
}

/// Emit a message struct on `channel`.
pub fn advise(log: &dyn AdvisoryLog, channel: LogChannel, level: LogLevel, message: &dyn Display) {
    log.emit(channel, level, &message.to_string());
}

/// Routes each channel to its own `tracing` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAdvisoryLog;

// tracing targets must be literals, so each channel gets its own expansion.
macro_rules! emit_at {
    ($target:literal, $level:expr, $message:expr) => {
        match $level {
            LogLevel::Debug => tracing::debug!(target: $target, "{}", $message),
            LogLevel::Info => tracing::info!(target: $target, "{}", $message),
            LogLevel::Warn => tracing::warn!(target: $target, "{}", $message),
            LogLevel::Error => tracing::error!(target: $target, "{}", $message),
        }
    };
}

impl AdvisoryLog for TracingAdvisoryLog {
    fn emit(&self, channel: LogChannel, level: LogLevel, message: &str) {
        match channel {
            LogChannel::General => emit_at!("switchboard", level, message),
            LogChannel::SharedMemory => emit_at!("switchboard::shared_memory", level, message),
            LogChannel::Worklet => emit_at!("switchboard::worklet", level, message),
            LogChannel::Legacy => emit_at!("switchboard::legacy", level, message),
        }
    }
}
