// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::bridge::transport::OutputTransport;
use crate::bridge::BridgeContext;
use crate::config::consts::{LEGACY_BUFFER_FRAMES, WORKLET_RENDER_QUANTUM};
use crate::engine::{EngineError, EngineLoader, Operation, RenderFormat};
use crate::errors::BridgeError;
use crate::host::{ContextHandle, Mechanism};
use crate::observability::messages::host::ContextExited;
use crate::package::EnginePackage;
use crate::selector::{StrategyChoice, Transport};
use crate::surface::{ControlSurface, EngineEndpoint};

struct Command {
    operation: Operation,
    reply: oneshot::Sender<Result<Value, EngineError>>,
}

/// Runs the engine in a background context created by the host.
pub struct WorkerBridge {
    context: BridgeContext,
    strategy: StrategyChoice,
    mechanism: Mechanism,
    transport: Transport,
}

impl WorkerBridge {
    pub(crate) fn new(
        context: BridgeContext,
        strategy: StrategyChoice,
        mechanism: Mechanism,
        transport: Transport,
    ) -> Self {
        Self {
            context,
            strategy,
            mechanism,
            transport,
        }
    }

    pub(crate) fn context(&self) -> &BridgeContext {
        &self.context
    }

    /// Frames per block for this bridge's mechanism.
    pub fn block_frames(&self) -> usize {
        match self.mechanism {
            Mechanism::Worklet => WORKLET_RENDER_QUANTUM,
            Mechanism::LegacyCallback => LEGACY_BUFFER_FRAMES,
        }
    }

    /// Spawn the context, then wait for its readiness signal.
    ///
    /// The context is cancelled if this future is dropped or fails before
    /// readiness, so a timed-out or failed bridge leaves nothing running.
    pub(crate) async fn initialize(
        self,
        package: EnginePackage,
    ) -> Result<ControlSurface, BridgeError> {
        let frames = self.block_frames();
        let Self {
            context,
            strategy,
            mechanism,
            transport,
        } = self;
        let BridgeContext {
            host,
            loader,
            audio_context,
        } = context;

        let format = super::render_format(&audio_context);
        let block_len = frames * usize::from(format.channels);
        let (output, source) = OutputTransport::create(transport, block_len);

        let (ready_tx, ready_rx) = oneshot::channel();
        let (command_tx, command_rx) = crossbeam_channel::unbounded();
        let cancel = CancellationToken::new();

        let task = ContextTask {
            mechanism,
            loader,
            package,
            format,
            frames,
            output,
            commands: command_rx,
            ready: ready_tx,
            cancel: cancel.clone(),
        };
        let handle = host.spawn_context(mechanism, Box::new(move || task.run()))?;

        let guard = cancel.clone().drop_guard();
        match ready_rx.await {
            Ok(Ok(())) => {}
            Ok(Err(error)) => return Err(BridgeError::EngineLoad(error)),
            Err(_) => return Err(BridgeError::ContextExited(mechanism)),
        }
        guard.disarm();

        let attachment = audio_context.attach(source);
        let endpoint = WorkerEndpoint {
            commands: Some(command_tx),
            cancel,
            handle: Some(handle),
        };
        Ok(ControlSurface::new(
            strategy,
            Box::new(endpoint),
            audio_context,
            attachment,
        ))
    }
}

/// Everything the background context owns.
struct ContextTask {
    mechanism: Mechanism,
    loader: Arc<dyn EngineLoader>,
    package: EnginePackage,
    format: RenderFormat,
    frames: usize,
    output: OutputTransport,
    commands: Receiver<Command>,
    ready: oneshot::Sender<Result<(), EngineError>>,
    cancel: CancellationToken,
}

impl ContextTask {
    fn run(self) {
        let Self {
            mechanism,
            loader,
            package,
            format,
            frames,
            mut output,
            commands,
            ready,
            cancel,
        } = self;

        let mut engine = match loader.load(&package, format) {
            Ok(engine) => engine,
            Err(error) => {
                let _ = ready.send(Err(error));
                return;
            }
        };
        drop(package);

        if ready.send(Ok(())).is_err() {
            return;
        }

        // One block period at the output rate.
        let tick = Duration::from_secs_f64(frames as f64 / f64::from(format.sample_rate.max(1)));
        let mut scratch = vec![0.0f32; frames * usize::from(format.channels)];
        let mut blocks_rendered = 0;

        while !cancel.is_cancelled() {
            match commands.recv_timeout(tick) {
                Ok(Command { operation, reply }) => {
                    let _ = reply.send(engine.invoke(&operation));
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
            blocks_rendered += output.pump(engine.as_mut(), &mut scratch);
        }

        tracing::debug!(
            "{}",
            ContextExited {
                mechanism,
                blocks_rendered,
            }
        );
    }
}

/// Forwards calls to the background context over a command channel.
struct WorkerEndpoint {
    commands: Option<Sender<Command>>,
    cancel: CancellationToken,
    handle: Option<ContextHandle>,
}

#[async_trait]
impl EngineEndpoint for WorkerEndpoint {
    async fn call(&self, operation: Operation) -> Result<Value, EngineError> {
        let commands = self.commands.as_ref().ok_or(EngineError::ContextClosed)?;
        let (reply, response) = oneshot::channel();
        commands
            .send(Command { operation, reply })
            .map_err(|_| EngineError::ContextClosed)?;
        response.await.map_err(|_| EngineError::ContextClosed)?
    }

    async fn shutdown(self: Box<Self>) {
        let mut endpoint = self;
        endpoint.cancel.cancel();
        endpoint.commands.take();
        if let Some(handle) = endpoint.handle.take() {
            let _ = tokio::task::spawn_blocking(move || handle.join()).await;
        }
    }
}

impl Drop for WorkerEndpoint {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
