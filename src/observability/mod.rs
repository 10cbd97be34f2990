// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability: structured log messages and the advisory log collaborator.
//!
//! Two kinds of logging run side by side:
//!
//! * Internal lifecycle events (packages loaded, contexts spawned, bridges
//!   initialized) go straight to `tracing` using the message structs in
//!   `messages`. Each struct implements `Display`, so log text lives in one
//!   place instead of being scattered through format strings.
//! * Advisory events about strategy selection go through the injectable
//!   `AdvisoryLog` collaborator on one of four channels. The default,
//!   `TracingAdvisoryLog`, maps each channel to its own `tracing` target.
//!
//! # Usage
//!
//! ```rust
//! use the_switchboard::observability::messages::package::PackageLoadFailed;
//!
//! let error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
//! let msg = PackageLoadFailed {
//!     source: "engine.wasm",
//!     error: &error,
//! };
//!
//! tracing::error!("{}", msg);
//! ```

mod log;
pub mod messages;

pub use log::{advise, AdvisoryLog, LogChannel, LogLevel, TracingAdvisoryLog};
