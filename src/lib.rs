// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod bridge;        // one bridge per strategy
pub mod config;        // YAML/TOML config
pub mod engine;        // engine collaborator + wasmtime loader
pub mod errors;        // error handling
pub mod host;          // host feature surface, audio context
pub mod observability;
pub mod package;       // engine packages
pub mod selector;      // strategy selection, acquire_engine
pub mod surface;       // uniform control surface

#[cfg(test)]
mod testing;

pub use errors::AcquireError;
pub use host::{AudioContext, HostEnvironment, NativeHost};
pub use package::EnginePackage;
pub use selector::{AcquireOptions, StrategyChoice, StrategySelector};
pub use surface::ControlSurface;
