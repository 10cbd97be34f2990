// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the bridge initialization lifecycle.

use crate::observability::messages::StructuredLog;
use crate::package::PackageDigest;
use crate::selector::{Phase, StrategyChoice};
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// Bridge initialization started.
///
/// # Log Level
/// `info!` - Important operational event
pub struct BridgeInitStarted<'a> {
    pub strategy: StrategyChoice,
    pub digest: &'a PackageDigest,
}

impl Display for BridgeInitStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Initializing {} bridge with package {}",
            self.strategy, self.digest
        )
    }
}

impl StructuredLog for BridgeInitStarted<'_> {
    fn log(&self) {
        tracing::info!(
            strategy = %self.strategy,
            digest = %self.digest,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "bridge_init",
            span_name = name,
            strategy = %self.strategy,
            digest = %self.digest,
        )
    }
}

/// Bridge ready; the control surface is handed to the caller.
///
/// # Log Level
/// `info!`
pub struct BridgeReady {
    pub strategy: StrategyChoice,
    pub elapsed: Duration,
}

impl Display for BridgeReady {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{} bridge ready in {:?}", self.strategy, self.elapsed)
    }
}

/// Bridge initialization failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct BridgeInitFailed<'a> {
    pub strategy: StrategyChoice,
    pub error: &'a dyn std::error::Error,
}

impl Display for BridgeInitFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} bridge initialization failed: {}",
            self.strategy, self.error
        )
    }
}

impl StructuredLog for BridgeInitFailed<'_> {
    fn log(&self) {
        tracing::error!(
            strategy = %self.strategy,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "bridge_init_failed",
            span_name = name,
            strategy = %self.strategy,
            error = %self.error,
        )
    }
}

/// Bridge initialization exceeded the configured deadline.
///
/// # Log Level
/// `error!`
pub struct BridgeInitTimedOut {
    pub strategy: StrategyChoice,
    pub timeout: Duration,
}

impl Display for BridgeInitTimedOut {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} bridge did not become ready within {:?}",
            self.strategy, self.timeout
        )
    }
}

/// Acquisition state machine transition.
///
/// # Log Level
/// `debug!`
pub struct PhaseEntered {
    pub phase: Phase,
}

impl Display for PhaseEntered {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Acquisition phase: {:?}", self.phase)
    }
}
