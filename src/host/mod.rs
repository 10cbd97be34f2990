// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Host runtime abstraction.
//!
//! The host decides which audio mechanisms exist and whether background
//! execution contexts may be created. Everything the selector needs to know
//! about the environment goes through the `HostEnvironment` trait, so the
//! selection policy can be exercised against any feature matrix.
//!
//! # Feature surface
//!
//! * **Worklet constructor**: a dedicated real-time processing context with
//!   small, stable render quanta.
//! * **Legacy callback constructor**: an older periodic callback invoked on
//!   buffer boundaries.
//! * **Shared-memory type**: memory two contexts may read and write without
//!   copying. Its existence alone is not enough; the host must also report
//!   `is_cross_origin_isolated`.
//! * **Context factory**: creates the background context a worker bridge
//!   runs in. The host may reject the request.
//!
//! `NativeHost` maps this surface onto OS threads and atomics.

mod audio_context;
mod capabilities;
mod native;

pub use audio_context::{AudioContext, ContextState};
pub(crate) use audio_context::RenderSource;
pub use capabilities::{
    has_legacy_callback_support, has_shared_memory_support, has_worklet_support, Capabilities,
};
pub use native::{HostOverrides, NativeHost};

use std::fmt::{Display, Formatter};
use std::thread::JoinHandle;

use crate::errors::HostError;

/// Background execution mechanism offered by the host.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Mechanism {
    /// Dedicated real-time processing context.
    Worklet,
    /// Periodic callback on buffer boundaries, kept for older hosts.
    LegacyCallback,
}

impl Mechanism {
    /// Short lowercase name, also used for context thread names.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Worklet => "worklet",
            Self::LegacyCallback => "legacy-callback",
        }
    }
}

impl Display for Mechanism {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a background context.
pub type BackgroundTask = Box<dyn FnOnce() + Send + 'static>;

/// Handle to a background context created by the host.
///
/// Dropping the handle detaches the context; it keeps running until its
/// task returns.
#[derive(Debug)]
pub struct ContextHandle {
    mechanism: Mechanism,
    thread: Option<JoinHandle<()>>,
}

impl ContextHandle {
    /// Wrap a spawned OS thread.
    pub fn from_thread(mechanism: Mechanism, thread: JoinHandle<()>) -> Self {
        Self {
            mechanism,
            thread: Some(thread),
        }
    }

    pub fn mechanism(&self) -> Mechanism {
        self.mechanism
    }

    /// Block until the context's task has returned.
    ///
    /// Returns `false` if the task panicked.
    pub fn join(mut self) -> bool {
        match self.thread.take() {
            Some(thread) => thread.join().is_ok(),
            None => true,
        }
    }
}

/// Host feature surface consumed by the capability probes and the bridges.
pub trait HostEnvironment: Send + Sync {
    /// Whether the worklet constructor exists.
    fn has_worklet_constructor(&self) -> bool;

    /// Whether the legacy callback constructor exists.
    fn has_legacy_callback_constructor(&self) -> bool;

    /// Whether the shared-memory type exists at all.
    fn has_shared_memory_constructor(&self) -> bool;

    /// Isolation gate that must be open before shared memory may be used.
    fn is_cross_origin_isolated(&self) -> bool;

    /// Create a background context running `task`.
    fn spawn_context(
        &self,
        mechanism: Mechanism,
        task: BackgroundTask,
    ) -> Result<ContextHandle, HostError>;

    /// Prepare the platform audio session (for example, unmuting output on
    /// platforms that start muted). Must be idempotent.
    fn prepare_audio_session(&self) {}
}
