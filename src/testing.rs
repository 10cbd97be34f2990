// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Test doubles shared across modules.

use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use crate::engine::{ComputeEngine, EngineError, EngineLoader, Operation, RenderFormat};
use crate::errors::HostError;
use crate::host::{BackgroundTask, ContextHandle, HostEnvironment, Mechanism};
use crate::observability::{AdvisoryLog, LogChannel, LogLevel};
use crate::package::EnginePackage;

pub const TONE_ENGINE_WAT: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/tone_engine.wat"));

/// The WAT tone engine as a package.
pub fn tone_package() -> EnginePackage {
    EnginePackage::from_bytes(wat::parse_str(TONE_ENGINE_WAT).unwrap()).unwrap()
}

/// Host with a fixed feature matrix that counts how it is used.
///
/// Contexts run on real threads unless spawning is set to be rejected.
pub struct ScriptedHost {
    worklet: bool,
    legacy_callback: bool,
    shared_memory: bool,
    isolated: bool,
    reject_spawn: bool,
    probe_calls: AtomicUsize,
    spawn_attempts: AtomicUsize,
    sessions_prepared: AtomicUsize,
}

impl ScriptedHost {
    pub fn new(worklet: bool, legacy_callback: bool, shared_memory: bool) -> Self {
        Self {
            worklet,
            legacy_callback,
            shared_memory,
            isolated: true,
            reject_spawn: false,
            probe_calls: AtomicUsize::new(0),
            spawn_attempts: AtomicUsize::new(0),
            sessions_prepared: AtomicUsize::new(0),
        }
    }

    pub fn with_isolation(mut self, isolated: bool) -> Self {
        self.isolated = isolated;
        self
    }

    pub fn rejecting_spawn(mut self) -> Self {
        self.reject_spawn = true;
        self
    }

    pub fn probe_calls(&self) -> usize {
        self.probe_calls.load(Ordering::SeqCst)
    }

    pub fn spawn_attempts(&self) -> usize {
        self.spawn_attempts.load(Ordering::SeqCst)
    }

    pub fn sessions_prepared(&self) -> usize {
        self.sessions_prepared.load(Ordering::SeqCst)
    }

    fn probed(&self, answer: bool) -> bool {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        answer
    }
}

impl HostEnvironment for ScriptedHost {
    fn has_worklet_constructor(&self) -> bool {
        self.probed(self.worklet)
    }

    fn has_legacy_callback_constructor(&self) -> bool {
        self.probed(self.legacy_callback)
    }

    fn has_shared_memory_constructor(&self) -> bool {
        self.probed(self.shared_memory)
    }

    fn is_cross_origin_isolated(&self) -> bool {
        self.probed(self.isolated)
    }

    fn spawn_context(
        &self,
        mechanism: Mechanism,
        task: BackgroundTask,
    ) -> Result<ContextHandle, HostError> {
        self.spawn_attempts.fetch_add(1, Ordering::SeqCst);
        if self.reject_spawn {
            return Err(HostError::ContextRejected {
                mechanism,
                reason: "scripted rejection".to_string(),
            });
        }
        let thread = thread::spawn(task);
        Ok(ContextHandle::from_thread(mechanism, thread))
    }

    fn prepare_audio_session(&self) {
        self.sessions_prepared.fetch_add(1, Ordering::SeqCst);
    }
}

/// Advisory log that keeps every event.
#[derive(Default)]
pub struct RecordingLog {
    events: Mutex<Vec<(LogChannel, LogLevel, String)>>,
}

impl RecordingLog {
    pub fn events(&self) -> Vec<(LogChannel, LogLevel, String)> {
        self.events.lock().clone()
    }

    pub fn count(&self, level: LogLevel) -> usize {
        self.events.lock().iter().filter(|e| e.1 == level).count()
    }

    pub fn on_channel(&self, channel: LogChannel) -> usize {
        self.events.lock().iter().filter(|e| e.0 == channel).count()
    }
}

impl AdvisoryLog for RecordingLog {
    fn emit(&self, channel: LogChannel, level: LogLevel, message: &str) {
        self.events.lock().push((channel, level, message.to_string()));
    }
}

/// In-process engine: renders a constant level while started.
pub struct ToneEngine {
    channels: usize,
    sample_rate: f64,
    running: bool,
    gain: f64,
}

impl ToneEngine {
    pub fn new(channels: usize) -> Self {
        Self {
            channels,
            sample_rate: 44_100.0,
            running: false,
            gain: 0.5,
        }
    }
}

impl ComputeEngine for ToneEngine {
    fn invoke(&mut self, operation: &Operation) -> Result<Value, EngineError> {
        match operation {
            Operation::Compile(text) if text.is_empty() => Err(EngineError::Status {
                operation: "compile",
                code: 1,
            }),
            Operation::Start => {
                self.running = true;
                Ok(Value::Null)
            }
            Operation::Stop | Operation::Reset => {
                self.running = false;
                Ok(Value::Null)
            }
            Operation::PerformBlock => Ok(Value::Bool(false)),
            Operation::SampleRate => Ok(Value::from(self.sample_rate)),
            Operation::BlockSize => Ok(Value::from(4)),
            Operation::OutputChannels => Ok(Value::from(self.channels)),
            Operation::SetControlChannel { value, .. } => {
                self.gain = *value;
                Ok(Value::Null)
            }
            Operation::GetControlChannel(_) => Ok(Value::from(self.gain)),
            Operation::SetOption(_)
            | Operation::Compile(_)
            | Operation::ReadScore(_)
            | Operation::InputMessage(_) => Ok(Value::Null),
        }
    }

    fn render(&mut self, out: &mut [f32]) -> Result<usize, EngineError> {
        if !self.running {
            return Ok(0);
        }
        out.fill(self.gain as f32);
        Ok(out.len())
    }
}

/// Loader producing `ToneEngine`s, optionally after a delay.
#[derive(Default)]
pub struct ToneEngineLoader {
    delay: Option<Duration>,
    loads: AtomicUsize,
}

impl ToneEngineLoader {
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            loads: AtomicUsize::new(0),
        }
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl EngineLoader for ToneEngineLoader {
    fn load(
        &self,
        _package: &EnginePackage,
        format: RenderFormat,
    ) -> Result<Box<dyn ComputeEngine>, EngineError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        let mut engine = ToneEngine::new(usize::from(format.channels));
        engine.sample_rate = f64::from(format.sample_rate);
        Ok(Box::new(engine))
    }
}

/// Loader that always fails.
pub struct FailingEngineLoader;

impl EngineLoader for FailingEngineLoader {
    fn load(
        &self,
        _package: &EnginePackage,
        _format: RenderFormat,
    ) -> Result<Box<dyn ComputeEngine>, EngineError> {
        Err(EngineError::Instantiation("scripted failure".to_string()))
    }
}
