// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;

use crate::bridge::BridgeContext;
use crate::engine::{EngineError, Operation, SharedEngine};
use crate::errors::BridgeError;
use crate::host::RenderSource;
use crate::package::EnginePackage;
use crate::selector::StrategyChoice;
use crate::surface::{ControlSurface, EngineEndpoint};

/// Runs the engine on whichever thread serves the audio callback.
pub struct SingleThreadBridge {
    context: BridgeContext,
}

impl SingleThreadBridge {
    pub(crate) fn new(context: BridgeContext) -> Self {
        Self { context }
    }

    pub(crate) fn context(&self) -> &BridgeContext {
        &self.context
    }

    pub(crate) async fn initialize(
        self,
        package: EnginePackage,
    ) -> Result<ControlSurface, BridgeError> {
        let BridgeContext {
            loader,
            audio_context,
            ..
        } = self.context;
        let format = super::render_format(&audio_context);

        let engine = tokio::task::spawn_blocking(move || loader.load(&package, format))
            .await
            .map_err(|e| BridgeError::EngineLoad(EngineError::runtime(e)))?
            .map_err(BridgeError::EngineLoad)?;

        let engine: SharedEngine = Arc::new(Mutex::new(engine));
        let attachment = audio_context.attach(RenderSource::Direct(Arc::clone(&engine)));

        Ok(ControlSurface::new(
            StrategyChoice::SingleThreadSync,
            Box::new(DirectEndpoint { engine }),
            audio_context,
            attachment,
        ))
    }
}

/// Calls the engine directly, sharing it with the render path.
struct DirectEndpoint {
    engine: SharedEngine,
}

#[async_trait]
impl EngineEndpoint for DirectEndpoint {
    async fn call(&self, operation: Operation) -> Result<Value, EngineError> {
        let engine = Arc::clone(&self.engine);
        tokio::task::spawn_blocking(move || engine.lock().invoke(&operation))
            .await
            .map_err(EngineError::runtime)?
    }

    async fn shutdown(self: Box<Self>) {}
}
