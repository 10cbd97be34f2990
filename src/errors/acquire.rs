// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::time::Duration;
use thiserror::Error;

use crate::errors::BridgeError;
use crate::selector::StrategyChoice;

/// Failures surfaced by `StrategySelector::acquire_engine`.
///
/// A host with no audio backend at all is not an error: it resolves to
/// `Ok(None)`. These variants cover a committed strategy that could not
/// reach the ready state. A committed strategy is never downgraded.
#[derive(Error, Debug)]
pub enum AcquireError {
    /// The chosen bridge could not complete its initialization protocol.
    #[error("{strategy} bridge failed to initialize: {source}")]
    BridgeInit {
        strategy: StrategyChoice,
        #[source]
        source: BridgeError,
    },

    /// The configured initialization deadline expired before the bridge
    /// reported readiness.
    #[error("{strategy} bridge did not become ready within {timeout:?}")]
    InitTimeout {
        strategy: StrategyChoice,
        timeout: Duration,
    },
}

impl AcquireError {
    /// The strategy that had been committed when the failure happened.
    pub fn strategy(&self) -> StrategyChoice {
        match self {
            Self::BridgeInit { strategy, .. } | Self::InitTimeout { strategy, .. } => *strategy,
        }
    }
}
