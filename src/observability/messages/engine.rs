// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for engine instantiation and rendering.

use crate::engine::EngineError;
use crate::observability::messages::StructuredLog;
use crate::package::PackageDigest;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Engine instantiated from a package.
///
/// # Log Level
/// `info!` - Important operational event
pub struct EngineInstantiated<'a> {
    pub digest: &'a PackageDigest,
    pub block_size: usize,
    pub channels: usize,
    pub fuel_per_call: u64,
}

impl Display for EngineInstantiated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Instantiated engine {}: {} frames x {} channels per block, fuel_per_call={}",
            self.digest, self.block_size, self.channels, self.fuel_per_call
        )
    }
}

impl StructuredLog for EngineInstantiated<'_> {
    fn log(&self) {
        tracing::info!(
            digest = %self.digest,
            block_size = self.block_size,
            channels = self.channels,
            fuel_per_call = self.fuel_per_call,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "engine",
            span_name = name,
            digest = %self.digest,
            block_size = self.block_size,
            channels = self.channels,
        )
    }
}

/// Engine failed while rendering; the buffer is filled with silence.
///
/// # Log Level
/// `warn!` - Recoverable, audio drops out
pub struct RenderFailed<'a> {
    pub error: &'a EngineError,
}

impl Display for RenderFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Engine render failed, emitting silence: {}", self.error)
    }
}

/// Transport was full and a rendered block was dropped.
///
/// # Log Level
/// `debug!` - Expected while the output side is suspended
pub struct BlockDropped {
    pub samples: usize,
}

impl Display for BlockDropped {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Output transport full, dropped {} samples", self.samples)
    }
}
