// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::package::PackageError;
use thiserror::Error;

/// Errors raised by engines and by the operation layer in front of them.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("engine instantiation failed: {0}")]
    Instantiation(String),

    #[error("engine must export '{name}' with signature {signature}")]
    MissingExport {
        name: &'static str,
        signature: &'static str,
    },

    #[error("unknown operation '{0}'")]
    UnknownOperation(String),

    #[error("invalid arguments for '{operation}': {reason}")]
    InvalidArguments { operation: String, reason: String },

    /// The engine reported a non-zero status.
    #[error("'{operation}' returned status {code}")]
    Status { operation: &'static str, code: i32 },

    /// Trap, fuel exhaustion or memory access failure inside the engine.
    #[error("engine runtime error: {0}")]
    Runtime(String),

    /// The context hosting the engine is gone.
    #[error("engine context is closed")]
    ContextClosed,

    #[error(transparent)]
    Package(#[from] PackageError),
}

impl EngineError {
    pub(crate) fn runtime(error: impl std::fmt::Display) -> Self {
        Self::Runtime(error.to_string())
    }
}
