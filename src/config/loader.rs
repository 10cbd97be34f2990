// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{
    DEFAULT_CHANNELS, DEFAULT_FUEL_LEVEL, DEFAULT_SAMPLE_RATE, MAX_CHANNELS, MAX_FUEL_LEVEL,
    MAX_SAMPLE_RATE, MIN_FUEL_LEVEL, MIN_SAMPLE_RATE,
};
use crate::errors::ConfigError;
use crate::host::{AudioContext, HostOverrides, NativeHost};
use crate::package::EnginePackage;
use crate::selector::AcquireOptions;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Top-level configuration for acquiring an engine.
///
/// # Fields
/// * `use_worker` - Run the engine in a background context (defaults to false)
/// * `init_timeout_ms` - Deadline for bridge initialization (optional, unbounded when absent)
/// * `audio_context` - Output device description (optional)
/// * `host` - Overrides of native feature detection (optional)
/// * `engine` - Engine package and engine call options (optional)
///
/// # Example
/// ```yaml
/// use_worker: true
/// init_timeout_ms: 5000
/// audio_context:
///   sample_rate: 48000
///   channels: 2
/// host:
///   shared_memory: false
/// engine:
///   package: "engine/libengine.wasm.zlib"
///   fuel_per_call: 100000000
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct SwitchboardConfig {
    #[serde(default)]
    pub use_worker: bool,
    pub init_timeout_ms: Option<u64>,
    #[serde(default)]
    pub audio_context: AudioContextConfig,
    #[serde(default)]
    pub host: HostOverrides,
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Output device description.
#[derive(Debug, Deserialize)]
pub struct AudioContextConfig {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_channels")]
    pub channels: u16,
}

impl Default for AudioContextConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
        }
    }
}

fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

fn default_channels() -> u16 {
    DEFAULT_CHANNELS
}

/// Engine package and per-call options.
///
/// `options`, `orchestra` and `render_blocks` drive the CLI demo run; the
/// library itself only reads `package` and `fuel_per_call`.
#[derive(Debug, Default, Deserialize)]
pub struct EngineConfig {
    pub package: Option<String>,
    pub fuel_per_call: Option<u64>,
    #[serde(default)]
    pub options: Vec<String>,
    pub orchestra: Option<String>,
    #[serde(default)]
    pub render_blocks: usize,
}

impl EngineConfig {
    /// Fuel granted to each engine call, clamped to the security bounds.
    pub fn fuel(&self) -> u64 {
        self.fuel_per_call
            .unwrap_or(DEFAULT_FUEL_LEVEL)
            .clamp(MIN_FUEL_LEVEL, MAX_FUEL_LEVEL)
    }

    /// The configured package, or the one embedded at build time.
    pub fn resolve_package(&self) -> Result<EnginePackage, ConfigError> {
        match &self.package {
            Some(path) => Ok(EnginePackage::load(path)?),
            None => EnginePackage::embedded().ok_or(ConfigError::MissingPackage),
        }
    }
}

impl SwitchboardConfig {
    /// Check ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let rate = self.audio_context.sample_rate;
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&rate) {
            return Err(ConfigError::Invalid {
                field: "audio_context.sample_rate",
                reason: format!("{} is outside {}..={}", rate, MIN_SAMPLE_RATE, MAX_SAMPLE_RATE),
            });
        }

        let channels = self.audio_context.channels;
        if channels == 0 || channels > MAX_CHANNELS {
            return Err(ConfigError::Invalid {
                field: "audio_context.channels",
                reason: format!("{} is outside 1..={}", channels, MAX_CHANNELS),
            });
        }

        if self.init_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid {
                field: "init_timeout_ms",
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    pub fn init_timeout(&self) -> Option<Duration> {
        self.init_timeout_ms.map(Duration::from_millis)
    }

    /// Native host with this config's overrides applied.
    pub fn native_host(&self) -> NativeHost {
        NativeHost::with_overrides(&self.host)
    }

    /// A fresh, caller-owned audio context matching this config.
    pub fn audio_context(&self) -> AudioContext {
        AudioContext::new(self.audio_context.sample_rate, self.audio_context.channels)
    }

    /// Acquisition options for `audio_context`.
    pub fn acquire_options(&self, audio_context: AudioContext) -> AcquireOptions {
        AcquireOptions {
            audio_context: Some(audio_context),
            use_worker: self.use_worker,
            init_timeout: self.init_timeout(),
            log: None,
        }
    }
}

/// Load a config from a YAML or TOML file, chosen by extension.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SwitchboardConfig, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&content)?),
        Some("toml") => Ok(toml::from_str(&content)?),
        _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Load and validate a config file.
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<SwitchboardConfig, ConfigError> {
    let cfg = load_config(path)?;
    cfg.validate()?;
    Ok(cfg)
}
