// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The uniform control surface returned by a successful acquisition.
//!
//! Every strategy yields the same type with the same operation names; only
//! the endpoint behind it differs. Operations can be called by name with
//! JSON arguments, which is how the surface is exposed to scripting hosts,
//! or through the typed helpers.

use async_trait::async_trait;
use serde_json::Value;

use crate::engine::{EngineError, Operation};
use crate::host::AudioContext;
use crate::selector::StrategyChoice;

/// Where a surface's calls go.
#[async_trait]
pub(crate) trait EngineEndpoint: Send + Sync {
    async fn call(&self, operation: Operation) -> Result<Value, EngineError>;

    /// Stop the engine's context and wait for it to exit.
    async fn shutdown(self: Box<Self>);
}

/// Handle to a ready engine.
///
/// The caller owns teardown: `close` stops the engine's context and detaches
/// it from the audio context. Dropping the surface cancels the context
/// without waiting for it. The audio context itself is never closed here.
pub struct ControlSurface {
    strategy: StrategyChoice,
    endpoint: Option<Box<dyn EngineEndpoint>>,
    audio_context: AudioContext,
    attachment: u64,
}

impl std::fmt::Debug for ControlSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlSurface")
            .field("strategy", &self.strategy)
            .field("audio_context", &self.audio_context)
            .finish()
    }
}

impl ControlSurface {
    pub(crate) fn new(
        strategy: StrategyChoice,
        endpoint: Box<dyn EngineEndpoint>,
        audio_context: AudioContext,
        attachment: u64,
    ) -> Self {
        Self {
            strategy,
            endpoint: Some(endpoint),
            audio_context,
            attachment,
        }
    }

    /// Strategy that produced this surface.
    pub fn strategy(&self) -> StrategyChoice {
        self.strategy
    }

    /// Names of every operation. Identical for all strategies.
    pub fn operations(&self) -> &'static [&'static str] {
        &Operation::NAMES
    }

    /// The audio context this engine renders into.
    pub fn audio_context(&self) -> &AudioContext {
        &self.audio_context
    }

    /// Call an operation by name.
    pub async fn invoke(&self, name: &str, args: &[Value]) -> Result<Value, EngineError> {
        self.call(Operation::from_call(name, args)?).await
    }

    pub async fn call(&self, operation: Operation) -> Result<Value, EngineError> {
        match &self.endpoint {
            Some(endpoint) => endpoint.call(operation).await,
            None => Err(EngineError::ContextClosed),
        }
    }

    pub async fn set_option(&self, option: &str) -> Result<(), EngineError> {
        self.call(Operation::SetOption(option.to_string())).await.map(drop)
    }

    pub async fn compile(&self, orchestra: &str) -> Result<(), EngineError> {
        self.call(Operation::Compile(orchestra.to_string())).await.map(drop)
    }

    pub async fn read_score(&self, score: &str) -> Result<(), EngineError> {
        self.call(Operation::ReadScore(score.to_string())).await.map(drop)
    }

    pub async fn input_message(&self, message: &str) -> Result<(), EngineError> {
        self.call(Operation::InputMessage(message.to_string())).await.map(drop)
    }

    pub async fn start(&self) -> Result<(), EngineError> {
        self.call(Operation::Start).await.map(drop)
    }

    pub async fn stop(&self) -> Result<(), EngineError> {
        self.call(Operation::Stop).await.map(drop)
    }

    pub async fn reset(&self) -> Result<(), EngineError> {
        self.call(Operation::Reset).await.map(drop)
    }

    /// Run one engine block. Returns `true` once the score has finished.
    pub async fn perform_block(&self) -> Result<bool, EngineError> {
        let value = self.call(Operation::PerformBlock).await?;
        value.as_bool().ok_or_else(|| unexpected("perform_block", &value))
    }

    pub async fn sample_rate(&self) -> Result<f64, EngineError> {
        let value = self.call(Operation::SampleRate).await?;
        value.as_f64().ok_or_else(|| unexpected("sample_rate", &value))
    }

    pub async fn block_size(&self) -> Result<usize, EngineError> {
        let value = self.call(Operation::BlockSize).await?;
        as_usize(&value).ok_or_else(|| unexpected("block_size", &value))
    }

    pub async fn output_channels(&self) -> Result<usize, EngineError> {
        let value = self.call(Operation::OutputChannels).await?;
        as_usize(&value).ok_or_else(|| unexpected("output_channels", &value))
    }

    pub async fn set_control_channel(&self, name: &str, value: f64) -> Result<(), EngineError> {
        self.call(Operation::SetControlChannel {
            name: name.to_string(),
            value,
        })
        .await
        .map(drop)
    }

    pub async fn get_control_channel(&self, name: &str) -> Result<f64, EngineError> {
        let value = self.call(Operation::GetControlChannel(name.to_string())).await?;
        value
            .as_f64()
            .ok_or_else(|| unexpected("get_control_channel", &value))
    }

    /// Stop the engine's context, wait for it, and detach from the audio
    /// context.
    pub async fn close(mut self) {
        self.audio_context.detach(self.attachment);
        if let Some(endpoint) = self.endpoint.take() {
            endpoint.shutdown().await;
        }
    }
}

impl Drop for ControlSurface {
    fn drop(&mut self) {
        self.audio_context.detach(self.attachment);
    }
}

fn as_usize(value: &Value) -> Option<usize> {
    value.as_u64().and_then(|n| usize::try_from(n).ok())
}

fn unexpected(operation: &str, value: &Value) -> EngineError {
    EngineError::Runtime(format!("unexpected result from '{}': {}", operation, value))
}
