// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for host context and audio session events.

use crate::host::Mechanism;
use std::fmt::{Display, Formatter};

/// Background context created by the host.
///
/// # Log Level
/// `debug!`
pub struct ContextSpawned<'a> {
    pub mechanism: Mechanism,
    pub thread_name: &'a str,
}

impl Display for ContextSpawned<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Spawned {} context on thread '{}'",
            self.mechanism, self.thread_name
        )
    }
}

/// Platform audio session prepared (first acquisition only).
///
/// # Log Level
/// `debug!`
pub struct AudioSessionPrepared;

impl Display for AudioSessionPrepared {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Audio session prepared")
    }
}

/// A background context's loop returned.
///
/// # Log Level
/// `debug!`
pub struct ContextExited {
    pub mechanism: Mechanism,
    pub blocks_rendered: u64,
}

impl Display for ContextExited {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} context exited after {} blocks",
            self.mechanism, self.blocks_rendered
        )
    }
}
