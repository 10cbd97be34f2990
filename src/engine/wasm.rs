// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::Value;
use wasmtime::*;
use wasmtime_wasi::p1::{self, WasiP1Ctx};
use wasmtime_wasi::WasiCtxBuilder;

use crate::config::consts::DEFAULT_FUEL_LEVEL;
use crate::engine::{ComputeEngine, EngineError, EngineLoader, Operation, RenderFormat};
use crate::observability::messages::engine::EngineInstantiated;
use crate::observability::messages::StructuredLog;
use crate::package::EnginePackage;

/// Loads packages as wasmtime instances with WASI preview 1 linked in.
#[derive(Debug, Clone, Copy)]
pub struct WasmEngineLoader {
    fuel_per_call: u64,
}

impl WasmEngineLoader {
    pub fn new(fuel_per_call: u64) -> Self {
        Self { fuel_per_call }
    }
}

impl Default for WasmEngineLoader {
    fn default() -> Self {
        Self::new(DEFAULT_FUEL_LEVEL)
    }
}

/// Sandboxed engine configuration: no threads, no SIMD, one 32-bit memory,
/// fuel metering on.
fn create_engine() -> Result<Engine, EngineError> {
    let mut config = Config::new();
    config.wasm_threads(false);
    config.wasm_simd(false);
    config.wasm_relaxed_simd(false);
    config.wasm_multi_memory(false);
    config.wasm_memory64(false);
    config.consume_fuel(true);
    config.epoch_interruption(false);

    Engine::new(&config).map_err(|e| EngineError::Instantiation(e.to_string()))
}

impl EngineLoader for WasmEngineLoader {
    fn load(
        &self,
        package: &EnginePackage,
        format: RenderFormat,
    ) -> Result<Box<dyn ComputeEngine>, EngineError> {
        let bytes = package.decode()?;
        let engine = create_engine()?;
        let module =
            Module::new(&engine, &bytes).map_err(|e| EngineError::Instantiation(e.to_string()))?;

        let mut linker: Linker<WasiP1Ctx> = Linker::new(&engine);
        p1::add_to_linker_sync(&mut linker, |ctx| ctx)
            .map_err(|e| EngineError::Instantiation(e.to_string()))?;

        let wasi = WasiCtxBuilder::new().inherit_stdio().build_p1();
        let mut store = Store::new(&engine, wasi);
        store
            .set_fuel(self.fuel_per_call)
            .map_err(EngineError::runtime)?;

        let instance = linker
            .instantiate(&mut store, &module)
            .map_err(|e| EngineError::Instantiation(e.to_string()))?;

        let mut wasm = WasmComputeEngine::bind(store, &instance, self.fuel_per_call)?;
        wasm.initialize(&instance, format)?;

        EngineInstantiated {
            digest: &package.digest(),
            block_size: wasm.block_size,
            channels: wasm.channels,
            fuel_per_call: self.fuel_per_call,
        }
        .log();
        Ok(Box::new(wasm))
    }
}

struct Exports {
    allocate: TypedFunc<i32, i32>,
    deallocate: TypedFunc<(i32, i32), ()>,
    set_option: TypedFunc<(i32, i32), i32>,
    compile: TypedFunc<(i32, i32), i32>,
    read_score: TypedFunc<(i32, i32), i32>,
    input_message: TypedFunc<(i32, i32), i32>,
    start: TypedFunc<(), i32>,
    stop: TypedFunc<(), i32>,
    reset: TypedFunc<(), i32>,
    perform_block: TypedFunc<(), i32>,
    sample_rate: TypedFunc<(), f64>,
    block_size: TypedFunc<(), i32>,
    output_channels: TypedFunc<(), i32>,
    set_control_channel: TypedFunc<(i32, i32, f64), i32>,
    get_control_channel: TypedFunc<(i32, i32), f64>,
    output_buffer: TypedFunc<(), i32>,
}

fn export<Params, Results>(
    store: &mut Store<WasiP1Ctx>,
    instance: &Instance,
    name: &'static str,
    signature: &'static str,
) -> Result<TypedFunc<Params, Results>, EngineError>
where
    Params: WasmParams,
    Results: WasmResults,
{
    instance
        .get_typed_func::<Params, Results>(&mut *store, name)
        .map_err(|_| EngineError::MissingExport { name, signature })
}

/// A wasmtime instance driven through the engine ABI.
pub struct WasmComputeEngine {
    store: Store<WasiP1Ctx>,
    memory: Memory,
    exports: Exports,
    fuel_per_call: u64,
    running: bool,
    block_size: usize,
    channels: usize,
    block: Vec<f32>,
    offset: usize,
}

impl WasmComputeEngine {
    fn bind(
        mut store: Store<WasiP1Ctx>,
        instance: &Instance,
        fuel_per_call: u64,
    ) -> Result<Self, EngineError> {
        let memory = instance
            .get_memory(&mut store, "memory")
            .ok_or(EngineError::MissingExport {
                name: "memory",
                signature: "memory",
            })?;

        let s = &mut store;
        let exports = Exports {
            allocate: export(s, instance, "allocate", "(i32) -> i32")?,
            deallocate: export(s, instance, "deallocate", "(i32, i32) -> ()")?,
            set_option: export(s, instance, "set_option", "(i32, i32) -> i32")?,
            compile: export(s, instance, "compile", "(i32, i32) -> i32")?,
            read_score: export(s, instance, "read_score", "(i32, i32) -> i32")?,
            input_message: export(s, instance, "input_message", "(i32, i32) -> i32")?,
            start: export(s, instance, "start", "() -> i32")?,
            stop: export(s, instance, "stop", "() -> i32")?,
            reset: export(s, instance, "reset", "() -> i32")?,
            perform_block: export(s, instance, "perform_block", "() -> i32")?,
            sample_rate: export(s, instance, "sample_rate", "() -> f64")?,
            block_size: export(s, instance, "block_size", "() -> i32")?,
            output_channels: export(s, instance, "output_channels", "() -> i32")?,
            set_control_channel: export(
                s,
                instance,
                "set_control_channel",
                "(i32, i32, f64) -> i32",
            )?,
            get_control_channel: export(s, instance, "get_control_channel", "(i32, i32) -> f64")?,
            output_buffer: export(s, instance, "output_buffer", "() -> i32")?,
        };

        Ok(Self {
            store,
            memory,
            exports,
            fuel_per_call,
            running: false,
            block_size: 0,
            channels: 0,
            block: Vec::new(),
            offset: 0,
        })
    }

    /// Run reactor initialization and the optional `configure` hook, then
    /// read the block geometry.
    fn initialize(&mut self, instance: &Instance, format: RenderFormat) -> Result<(), EngineError> {
        if let Ok(init) = instance.get_typed_func::<(), ()>(&mut self.store, "_initialize") {
            init.call(&mut self.store, ()).map_err(EngineError::runtime)?;
        }

        if let Ok(configure) =
            instance.get_typed_func::<(i32, i32), i32>(&mut self.store, "configure")
        {
            self.refuel()?;
            let code = configure
                .call(
                    &mut self.store,
                    (format.sample_rate as i32, i32::from(format.channels)),
                )
                .map_err(EngineError::runtime)?;
            check_status("configure", code)?;
        }

        self.refuel()?;
        let block_size = self
            .exports
            .block_size
            .call(&mut self.store, ())
            .map_err(EngineError::runtime)?;
        let channels = self
            .exports
            .output_channels
            .call(&mut self.store, ())
            .map_err(EngineError::runtime)?;
        if block_size <= 0 || channels <= 0 {
            return Err(EngineError::Instantiation(format!(
                "invalid block geometry: {} frames x {} channels",
                block_size, channels
            )));
        }
        if channels != i32::from(format.channels) {
            return Err(EngineError::Instantiation(format!(
                "engine renders {} channels but the output has {}",
                channels, format.channels
            )));
        }
        self.block_size = block_size as usize;
        self.channels = channels as usize;
        Ok(())
    }

    fn refuel(&mut self) -> Result<(), EngineError> {
        self.store
            .set_fuel(self.fuel_per_call)
            .map_err(EngineError::runtime)
    }

    /// Copy `bytes` into guest memory. The caller deallocates.
    fn write_guest(&mut self, bytes: &[u8]) -> Result<(i32, i32), EngineError> {
        let len = bytes.len() as i32;
        let ptr = self
            .exports
            .allocate
            .call(&mut self.store, len.max(1))
            .map_err(EngineError::runtime)?;
        if ptr == 0 {
            return Err(EngineError::Runtime(
                "Failed to allocate guest memory".to_string(),
            ));
        }

        if let Err(e) = self.memory.write(&mut self.store, ptr as usize, bytes) {
            let _ = self.exports.deallocate.call(&mut self.store, (ptr, len.max(1)));
            return Err(EngineError::runtime(e));
        }
        Ok((ptr, len))
    }

    fn release_guest(&mut self, ptr: i32, len: i32) -> Result<(), EngineError> {
        self.exports
            .deallocate
            .call(&mut self.store, (ptr, len.max(1)))
            .map_err(EngineError::runtime)
    }

    fn call_text(
        &mut self,
        select: fn(&Exports) -> &TypedFunc<(i32, i32), i32>,
        operation: &'static str,
        text: &str,
    ) -> Result<Value, EngineError> {
        let func = select(&self.exports).clone();
        let (ptr, len) = self.write_guest(text.as_bytes())?;
        let result = func.call(&mut self.store, (ptr, len));
        self.release_guest(ptr, len)?;
        check_status(operation, result.map_err(EngineError::runtime)?)?;
        Ok(Value::Null)
    }

    fn call_status(
        &mut self,
        select: fn(&Exports) -> &TypedFunc<(), i32>,
        operation: &'static str,
    ) -> Result<Value, EngineError> {
        let code = select(&self.exports)
            .call(&mut self.store, ())
            .map_err(EngineError::runtime)?;
        check_status(operation, code)?;
        Ok(Value::Null)
    }

    /// Run one block and stage its output for `render`. Returns true when
    /// the engine reports the score finished.
    fn perform_block(&mut self) -> Result<bool, EngineError> {
        let code = self
            .exports
            .perform_block
            .call(&mut self.store, ())
            .map_err(EngineError::runtime)?;
        if code < 0 {
            return Err(EngineError::Status {
                operation: "perform_block",
                code,
            });
        }

        let ptr = self
            .exports
            .output_buffer
            .call(&mut self.store, ())
            .map_err(EngineError::runtime)?;

        let mut raw = vec![0u8; self.block_size * self.channels * 4];
        self.memory
            .read(&self.store, ptr as usize, &mut raw)
            .map_err(EngineError::runtime)?;

        self.block.clear();
        self.block.extend(
            raw.chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]])),
        );
        self.offset = 0;
        Ok(code == 1)
    }
}

fn check_status(operation: &'static str, code: i32) -> Result<(), EngineError> {
    if code == 0 {
        Ok(())
    } else {
        Err(EngineError::Status { operation, code })
    }
}

impl ComputeEngine for WasmComputeEngine {
    fn invoke(&mut self, operation: &Operation) -> Result<Value, EngineError> {
        self.refuel()?;
        match operation {
            Operation::SetOption(text) => self.call_text(|e| &e.set_option, "set_option", text),
            Operation::Compile(text) => self.call_text(|e| &e.compile, "compile", text),
            Operation::ReadScore(text) => self.call_text(|e| &e.read_score, "read_score", text),
            Operation::InputMessage(text) => {
                self.call_text(|e| &e.input_message, "input_message", text)
            }
            Operation::Start => {
                let value = self.call_status(|e| &e.start, "start")?;
                self.running = true;
                Ok(value)
            }
            Operation::Stop => {
                let value = self.call_status(|e| &e.stop, "stop")?;
                self.running = false;
                Ok(value)
            }
            Operation::Reset => {
                let value = self.call_status(|e| &e.reset, "reset")?;
                self.running = false;
                self.block.clear();
                self.offset = 0;
                Ok(value)
            }
            Operation::PerformBlock => Ok(Value::Bool(self.perform_block()?)),
            Operation::SampleRate => {
                let rate = self
                    .exports
                    .sample_rate
                    .call(&mut self.store, ())
                    .map_err(EngineError::runtime)?;
                Ok(Value::from(rate))
            }
            Operation::BlockSize => Ok(Value::from(self.block_size)),
            Operation::OutputChannels => Ok(Value::from(self.channels)),
            Operation::SetControlChannel { name, value } => {
                let func = self.exports.set_control_channel.clone();
                let (ptr, len) = self.write_guest(name.as_bytes())?;
                let result = func.call(&mut self.store, (ptr, len, *value));
                self.release_guest(ptr, len)?;
                check_status("set_control_channel", result.map_err(EngineError::runtime)?)?;
                Ok(Value::Null)
            }
            Operation::GetControlChannel(name) => {
                let func = self.exports.get_control_channel.clone();
                let (ptr, len) = self.write_guest(name.as_bytes())?;
                let result = func.call(&mut self.store, (ptr, len));
                self.release_guest(ptr, len)?;
                Ok(Value::from(result.map_err(EngineError::runtime)?))
            }
        }
    }

    fn render(&mut self, out: &mut [f32]) -> Result<usize, EngineError> {
        let mut written = 0;
        while written < out.len() {
            if self.offset >= self.block.len() {
                if !self.running {
                    break;
                }
                self.refuel()?;
                if self.perform_block()? {
                    self.running = false;
                }
                if self.block.is_empty() {
                    break;
                }
            }
            let n = (self.block.len() - self.offset).min(out.len() - written);
            out[written..written + n].copy_from_slice(&self.block[self.offset..self.offset + n]);
            written += n;
            self.offset += n;
        }
        Ok(written)
    }
}
