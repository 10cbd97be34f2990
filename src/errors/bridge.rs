// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use crate::engine::EngineError;
use crate::host::Mechanism;

/// Errors raised by a host environment.
#[derive(Error, Debug)]
pub enum HostError {
    /// The host refused to create a background execution context.
    #[error("host rejected {mechanism} context: {reason}")]
    ContextRejected { mechanism: Mechanism, reason: String },
}

/// Errors raised while a bridge runs its initialization protocol.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Background context creation was rejected by the host.
    #[error(transparent)]
    Host(#[from] HostError),

    /// The engine package could not be turned into a running engine.
    #[error("engine failed to load: {0}")]
    EngineLoad(#[source] EngineError),

    /// The audio context's format cannot carry audio.
    #[error("unsupported audio format: {sample_rate} Hz x {channels} channels")]
    InvalidFormat { sample_rate: u32, channels: u16 },

    /// The background context terminated before signalling readiness.
    #[error("{0} context exited before signalling readiness")]
    ContextExited(Mechanism),

    /// `initialize` was called on the variant that has no transport.
    #[error("no audio backend is available in this host")]
    Unsupported,
}
