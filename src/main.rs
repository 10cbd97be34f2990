// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::{bail, Context, Result};
use std::env;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

use the_switchboard::config::{load_and_validate_config, SwitchboardConfig};
use the_switchboard::engine::WasmEngineLoader;
use the_switchboard::{AudioContext, ControlSurface, StrategySelector};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        let program = program_name(&args);
        eprintln!("Usage: {} <config.yaml|config.toml>", program);
        eprintln!("Example: {} configs/worklet.yaml", program);
        eprintln!("Log filtering follows RUST_LOG, e.g. RUST_LOG=switchboard=debug");
        std::process::exit(1);
    }

    let config = load_and_validate_config(&args[1])
        .with_context(|| format!("loading config {}", args[1]))?;
    run(&config).await
}

fn program_name(args: &[String]) -> &str {
    args.first().map_or("the-switchboard", String::as_str)
}

async fn run(config: &SwitchboardConfig) -> Result<()> {
    let package = config.engine.resolve_package()?;
    let host = Arc::new(config.native_host());
    let selector = StrategySelector::new(host, package)
        .with_loader(Arc::new(WasmEngineLoader::new(config.engine.fuel())));

    let audio_context = config.audio_context();
    let started = Instant::now();
    let Some(surface) = selector
        .acquire_engine(config.acquire_options(audio_context.clone()))
        .await?
    else {
        bail!("no audio backend available on this host");
    };

    println!("Strategy:   {}", surface.strategy());
    println!("Acquired:   {:?}", started.elapsed());
    println!("Operations: {}", surface.operations().join(", "));

    let outcome = drive(config, &surface).await;
    surface.close().await;
    audio_context.close();

    if let Some(summary) = outcome? {
        println!(
            "Rendered:   {} samples, peak {:.4}",
            summary.samples, summary.peak
        );
    }
    Ok(())
}

#[derive(Debug, Default, PartialEq)]
struct RenderSummary {
    samples: usize,
    peak: f32,
}

/// Apply the configured options and orchestra, then pull a few buffers
/// through the audio context.
async fn drive(config: &SwitchboardConfig, surface: &ControlSurface) -> Result<Option<RenderSummary>> {
    for option in &config.engine.options {
        surface.set_option(option).await?;
    }
    if let Some(orchestra) = &config.engine.orchestra {
        surface.compile(orchestra).await?;
    }
    if config.engine.render_blocks == 0 {
        return Ok(None);
    }

    surface.start().await?;
    let audio_context = surface.audio_context().clone();
    audio_context.resume();

    let block_size = surface.block_size().await?;
    let blocks = config.engine.render_blocks;
    // A direct source runs the engine inside `render`, which must not happen
    // on a runtime worker thread.
    let summary =
        tokio::task::spawn_blocking(move || pull_blocks(&audio_context, block_size, blocks))
            .await
            .context("render loop panicked")?;

    surface.stop().await?;
    Ok(Some(summary))
}

/// Pull `blocks` buffers one block period apart, the way a device callback
/// would.
fn pull_blocks(audio_context: &AudioContext, block_size: usize, blocks: usize) -> RenderSummary {
    let channels = usize::from(audio_context.channels());
    let period =
        Duration::from_secs_f64(block_size as f64 / f64::from(audio_context.sample_rate()));
    let mut buffer = vec![0.0f32; block_size * channels];
    let mut summary = RenderSummary::default();

    for _ in 0..blocks {
        // Worker strategies render ahead; give them a block period.
        std::thread::sleep(period);
        summary.samples += audio_context.render(&mut buffer);
        summary.peak = buffer.iter().fold(summary.peak, |p, s| p.max(s.abs()));
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use the_switchboard::{AcquireOptions, EnginePackage, NativeHost, StrategyChoice};

    const WASI_TONE_ENGINE_WAT: &str = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/fixtures/wasi_tone_engine.wat"
    ));

    #[test]
    fn test_program_name_with_empty_argv() {
        assert_eq!(program_name(&[]), "the-switchboard");
        assert_eq!(program_name(&["switchboard".to_string()]), "switchboard");
    }

    #[tokio::test]
    async fn test_drive_renders_wasi_engine_in_process() {
        let package =
            EnginePackage::from_bytes(wat::parse_str(WASI_TONE_ENGINE_WAT).unwrap()).unwrap();
        let selector = StrategySelector::new(Arc::new(NativeHost::default()), package);
        let audio_context = AudioContext::new(48_000, 2);
        let surface = selector
            .acquire_engine(AcquireOptions {
                audio_context: Some(audio_context.clone()),
                ..AcquireOptions::default()
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(surface.strategy(), StrategyChoice::SingleThreadSync);

        let config: SwitchboardConfig =
            serde_yaml::from_str("engine:\n  orchestra: \"instr 1\"\n  render_blocks: 3\n")
                .unwrap();
        let summary = drive(&config, &surface).await.unwrap();

        assert_eq!(
            summary,
            Some(RenderSummary {
                samples: 24,
                peak: 0.5,
            })
        );
        surface.close().await;
    }

    #[tokio::test]
    async fn test_drive_without_blocks_skips_rendering() {
        let package =
            EnginePackage::from_bytes(wat::parse_str(WASI_TONE_ENGINE_WAT).unwrap()).unwrap();
        let selector = StrategySelector::new(Arc::new(NativeHost::default()), package);
        let surface = selector
            .acquire_engine(AcquireOptions::default())
            .await
            .unwrap()
            .unwrap();

        let config = SwitchboardConfig::default();
        assert_eq!(drive(&config, &surface).await.unwrap(), None);
        surface.close().await;
    }
}
