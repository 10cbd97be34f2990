// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Deserialize;
use std::sync::Once;
use std::thread;

use crate::errors::HostError;
use crate::host::{BackgroundTask, ContextHandle, HostEnvironment, Mechanism};
use crate::observability::messages::host::{AudioSessionPrepared, ContextSpawned};

static AUDIO_SESSION: Once = Once::new();

/// Optional overrides of native feature detection.
///
/// Every field left as `None` falls back to what `NativeHost` detects.
///
/// # Example
/// ```yaml
/// host:
///   worklet: false
///   shared_memory: true
///   cross_origin_isolated: false
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct HostOverrides {
    pub worklet: Option<bool>,
    pub legacy_callback: Option<bool>,
    pub shared_memory: Option<bool>,
    pub cross_origin_isolated: Option<bool>,
}

/// Host backed by OS threads.
///
/// * worklet: available when more than one hardware thread exists, so the
///   render context does not compete with the caller for a single core
/// * legacy callback: available wherever threads can be spawned
/// * shared memory: available when the target has pointer-sized atomics
/// * isolation gate: open unless overridden
#[derive(Debug, Clone)]
pub struct NativeHost {
    worklet: bool,
    legacy_callback: bool,
    shared_memory: bool,
    cross_origin_isolated: bool,
}

impl Default for NativeHost {
    fn default() -> Self {
        Self::detect()
    }
}

impl NativeHost {
    /// Detect features of the running process.
    pub fn detect() -> Self {
        let threads_available = cfg!(not(all(target_family = "wasm", target_os = "unknown")));
        let parallelism = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        Self {
            worklet: threads_available && parallelism > 1,
            legacy_callback: threads_available,
            shared_memory: cfg!(target_has_atomic = "ptr"),
            cross_origin_isolated: true,
        }
    }

    /// Detect, then apply `overrides`.
    pub fn with_overrides(overrides: &HostOverrides) -> Self {
        let detected = Self::detect();
        Self {
            worklet: overrides.worklet.unwrap_or(detected.worklet),
            legacy_callback: overrides.legacy_callback.unwrap_or(detected.legacy_callback),
            shared_memory: overrides.shared_memory.unwrap_or(detected.shared_memory),
            cross_origin_isolated: overrides
                .cross_origin_isolated
                .unwrap_or(detected.cross_origin_isolated),
        }
    }
}

impl HostEnvironment for NativeHost {
    fn has_worklet_constructor(&self) -> bool {
        self.worklet
    }

    fn has_legacy_callback_constructor(&self) -> bool {
        self.legacy_callback
    }

    fn has_shared_memory_constructor(&self) -> bool {
        self.shared_memory
    }

    fn is_cross_origin_isolated(&self) -> bool {
        self.cross_origin_isolated
    }

    fn spawn_context(
        &self,
        mechanism: Mechanism,
        task: BackgroundTask,
    ) -> Result<ContextHandle, HostError> {
        let name = format!("switchboard-{}", mechanism);
        let thread = thread::Builder::new()
            .name(name.clone())
            .spawn(task)
            .map_err(|e| HostError::ContextRejected {
                mechanism,
                reason: e.to_string(),
            })?;

        tracing::debug!("{}", ContextSpawned { mechanism, thread_name: &name });
        Ok(ContextHandle::from_thread(mechanism, thread))
    }

    fn prepare_audio_session(&self) {
        AUDIO_SESSION.call_once(|| {
            tracing::debug!("{}", AudioSessionPrepared);
        });
    }
}
