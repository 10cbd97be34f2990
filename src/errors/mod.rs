// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod acquire;
mod bridge;
mod config;

pub use acquire::AcquireError;
pub use bridge::{BridgeError, HostError};
pub use config::ConfigError;
