// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Computation engine collaborator
//!
//! A bridge never knows what the engine is; it only needs an `EngineLoader`
//! to turn an `EnginePackage` into a `ComputeEngine`, then forwards named
//! operations to it and pulls rendered audio from it. The default loader,
//! `WasmEngineLoader`, instantiates the package with wasmtime.
//!
//! # Engine ABI
//!
//! A package is a core module exporting `memory`, `allocate(i32) -> i32`,
//! `deallocate(i32, i32)`, one export per operation (see `Operation`) and
//! `output_buffer() -> i32`, the address of the interleaved `f32` block
//! written by the last `perform_block`.

mod error;
mod operation;
mod wasm;

pub use error::EngineError;
pub use operation::Operation;
pub use wasm::{WasmComputeEngine, WasmEngineLoader};

use crate::package::EnginePackage;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;

/// Output format an engine is asked to render in.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RenderFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

/// A live engine instance.
///
/// Engines are driven from exactly one context at a time: the caller's thread
/// for single-threaded bridges, the background context otherwise.
pub trait ComputeEngine: Send {
    /// Run one operation and return its result.
    ///
    /// Status-only operations return `Value::Null`; queries return a number;
    /// `perform_block` returns `true` once the score has finished.
    fn invoke(&mut self, operation: &Operation) -> Result<Value, EngineError>;

    /// Write interleaved samples into `out`, returning how many were written.
    ///
    /// A stopped engine writes nothing.
    fn render(&mut self, out: &mut [f32]) -> Result<usize, EngineError>;
}

/// Factory for engines.
pub trait EngineLoader: Send + Sync {
    /// Instantiate `package` for the given output format.
    fn load(
        &self,
        package: &EnginePackage,
        format: RenderFormat,
    ) -> Result<Box<dyn ComputeEngine>, EngineError>;
}

/// Engine shared between a control endpoint and a render source.
pub(crate) type SharedEngine = Arc<Mutex<Box<dyn ComputeEngine>>>;
