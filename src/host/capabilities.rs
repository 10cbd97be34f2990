// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Capability probes.
//!
//! Each probe is a synchronous, side-effect-free query against the host's
//! feature surface. Probes never fail; an unknown feature reads as absent.

use crate::host::HostEnvironment;

/// Whether the host can run a worklet context.
pub fn has_worklet_support(host: &dyn HostEnvironment) -> bool {
    host.has_worklet_constructor()
}

/// Whether the host offers the legacy periodic callback.
pub fn has_legacy_callback_support(host: &dyn HostEnvironment) -> bool {
    host.has_legacy_callback_constructor()
}

/// Whether shared memory may be used.
///
/// Both the type and the isolation gate are required.
pub fn has_shared_memory_support(host: &dyn HostEnvironment) -> bool {
    host.has_shared_memory_constructor() && host.is_cross_origin_isolated()
}

/// Snapshot of the host's audio capabilities, taken once per acquisition.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub has_worklet: bool,
    pub has_legacy_callback: bool,
    pub has_shared_memory: bool,
}

impl Capabilities {
    pub fn new(has_worklet: bool, has_legacy_callback: bool, has_shared_memory: bool) -> Self {
        Self {
            has_worklet,
            has_legacy_callback,
            has_shared_memory,
        }
    }

    /// Run every probe once against `host`.
    pub fn probe(host: &dyn HostEnvironment) -> Self {
        Self {
            has_worklet: has_worklet_support(host),
            has_legacy_callback: has_legacy_callback_support(host),
            has_shared_memory: has_shared_memory_support(host),
        }
    }

    /// True when at least one background mechanism exists.
    pub fn has_background_mechanism(&self) -> bool {
        self.has_worklet || self.has_legacy_callback
    }
}
