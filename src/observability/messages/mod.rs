// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for consistent, human-readable
//! output. Messages that carry useful fields also implement
//! `StructuredLog`, which logs them with those fields attached and builds a
//! span around the work they describe.
//!
//! # Organization
//!
//! * `bridge` - bridge initialization lifecycle
//! * `engine` - engine instantiation and rendering
//! * `host` - host contexts and the audio session
//! * `package` - engine package loading
//! * `selection` - strategy selection advisories
//!
//! # Usage Pattern
//!
//! ```rust
//! use the_switchboard::observability::messages::selection::NoAudioBackend;
//!
//! tracing::error!("{}", NoAudioBackend);
//! ```

pub mod bridge;
pub mod engine;
pub mod host;
pub mod package;
pub mod selection;

use tracing::Span;

/// A message that can log itself with structured fields.
pub trait StructuredLog {
    /// Emit the message at its natural level, fields attached.
    fn log(&self);

    /// A span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
