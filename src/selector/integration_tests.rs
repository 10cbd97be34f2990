// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::engine::{EngineLoader, WasmEngineLoader};
use crate::errors::{AcquireError, BridgeError};
use crate::host::AudioContext;
use crate::observability::{LogChannel, LogLevel};
use crate::selector::{AcquireOptions, StrategyChoice, StrategySelector};
use crate::testing::{
    tone_package, FailingEngineLoader, RecordingLog, ScriptedHost, ToneEngineLoader,
};

/// Acquisition tests across hosts, loaders and options
#[cfg(test)]
mod tests {
    use super::*;

    struct Harness {
        host: Arc<ScriptedHost>,
        log: Arc<RecordingLog>,
        loader: Arc<ToneEngineLoader>,
        selector: StrategySelector,
    }

    fn harness(host: ScriptedHost) -> Harness {
        harness_with_loader(host, ToneEngineLoader::default())
    }

    fn harness_with_loader(host: ScriptedHost, loader: ToneEngineLoader) -> Harness {
        let host = Arc::new(host);
        let log = Arc::new(RecordingLog::default());
        let loader = Arc::new(loader);
        let selector = StrategySelector::new(host.clone(), tone_package())
            .with_loader(loader.clone())
            .with_log(log.clone());
        Harness {
            host,
            log,
            loader,
            selector,
        }
    }

    #[tokio::test]
    async fn test_backend_truth_table() {
        let cases = [
            ((true, true), Some(StrategyChoice::WorkletShared)),
            ((true, false), Some(StrategyChoice::WorkletShared)),
            ((false, true), Some(StrategyChoice::LegacyMessagePassing)),
            ((false, false), None),
        ];

        for ((worklet, legacy), expected) in cases {
            let h = harness(ScriptedHost::new(worklet, legacy, true));
            let surface = h
                .selector
                .acquire_engine(AcquireOptions::worker())
                .await
                .unwrap();

            assert_eq!(
                surface.as_ref().map(|s| s.strategy()),
                expected,
                "worklet={} legacy={}",
                worklet,
                legacy
            );
            if let Some(surface) = surface {
                surface.close().await;
            }
        }
    }

    #[tokio::test]
    async fn test_backend_truth_table_without_shared_memory() {
        let cases = [
            ((true, true), Some(StrategyChoice::WorkletMessagePassing)),
            ((true, false), Some(StrategyChoice::WorkletMessagePassing)),
            ((false, true), Some(StrategyChoice::LegacyMessagePassing)),
            ((false, false), None),
        ];

        for ((worklet, legacy), expected) in cases {
            let h = harness(ScriptedHost::new(worklet, legacy, false));
            let surface = h
                .selector
                .acquire_engine(AcquireOptions::worker())
                .await
                .unwrap();

            assert_eq!(
                surface.as_ref().map(|s| s.strategy()),
                expected,
                "worklet={} legacy={}",
                worklet,
                legacy
            );
            if let Some(surface) = surface {
                surface.close().await;
            }
        }
    }

    #[tokio::test]
    async fn test_channelless_context_fails_acquisition() {
        let h = harness(ScriptedHost::new(true, true, true));
        let result = h
            .selector
            .acquire_engine(AcquireOptions {
                audio_context: Some(AudioContext::new(48_000, 0)),
                ..AcquireOptions::worker()
            })
            .await;

        match result {
            Err(AcquireError::BridgeInit {
                strategy,
                source: BridgeError::InvalidFormat { channels, .. },
            }) => {
                assert_eq!(strategy, StrategyChoice::WorkletShared);
                assert_eq!(channels, 0);
            }
            other => panic!("Expected InvalidFormat, got {:?}", other.map(|s| s.is_some())),
        }
        assert_eq!(h.host.spawn_attempts(), 0);
        assert_eq!(h.loader.loads(), 0);
    }

    #[tokio::test]
    async fn test_no_worker_skips_probing() {
        let h = harness(ScriptedHost::new(true, true, true));
        let surface = h
            .selector
            .acquire_engine(AcquireOptions::default())
            .await
            .unwrap()
            .expect("single-thread strategy always yields a surface");

        assert_eq!(surface.strategy(), StrategyChoice::SingleThreadSync);
        assert_eq!(h.host.probe_calls(), 0);
        assert_eq!(h.host.spawn_attempts(), 0);
        assert_eq!(h.log.events().len(), 1);
        assert_eq!(h.log.on_channel(LogChannel::General), 1);
    }

    #[tokio::test]
    async fn test_no_worker_even_without_backends() {
        let h = harness(ScriptedHost::new(false, false, false));
        let surface = h
            .selector
            .acquire_engine(AcquireOptions::default())
            .await
            .unwrap();

        assert_eq!(
            surface.map(|s| s.strategy()),
            Some(StrategyChoice::SingleThreadSync)
        );
        assert_eq!(h.host.probe_calls(), 0);
    }

    #[tokio::test]
    async fn test_shared_memory_flip() {
        let h = harness(ScriptedHost::new(true, false, true));
        let surface = h
            .selector
            .acquire_engine(AcquireOptions::worker())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(surface.strategy(), StrategyChoice::WorkletShared);
        assert_eq!(h.log.on_channel(LogChannel::SharedMemory), 0);
        surface.close().await;

        let h = harness(ScriptedHost::new(true, false, false));
        let surface = h
            .selector
            .acquire_engine(AcquireOptions::worker())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(surface.strategy(), StrategyChoice::WorkletMessagePassing);
        surface.close().await;
    }

    #[tokio::test]
    async fn test_isolation_gate_closes_shared_memory() {
        let h = harness(ScriptedHost::new(true, true, true).with_isolation(false));
        let surface = h
            .selector
            .acquire_engine(AcquireOptions::worker())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(surface.strategy(), StrategyChoice::WorkletMessagePassing);
        surface.close().await;
    }

    #[tokio::test]
    async fn test_legacy_ignores_shared_memory() {
        let h = harness(ScriptedHost::new(false, true, true));
        let surface = h
            .selector
            .acquire_engine(AcquireOptions::worker())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(surface.strategy(), StrategyChoice::LegacyMessagePassing);
        assert_eq!(h.log.on_channel(LogChannel::Legacy), 1);
        surface.close().await;
    }

    #[tokio::test]
    async fn test_degraded_mode_warns_on_shared_memory_channel() {
        let h = harness(ScriptedHost::new(true, true, false));
        let surface = h
            .selector
            .acquire_engine(AcquireOptions::worker())
            .await
            .unwrap()
            .unwrap();

        let events = h.log.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].0, LogChannel::Worklet);
        assert_eq!(events[0].1, LogLevel::Info);
        assert_eq!(events[1].0, LogChannel::SharedMemory);
        assert_eq!(events[1].1, LogLevel::Warn);
        surface.close().await;
    }

    #[tokio::test]
    async fn test_no_backend_is_absent() {
        let h = harness(ScriptedHost::new(false, false, true));
        let surface = h
            .selector
            .acquire_engine(AcquireOptions::worker())
            .await
            .unwrap();

        assert!(surface.is_none());
        assert_eq!(h.log.count(LogLevel::Error), 1);
        assert_eq!(h.log.events().len(), 1);
        assert_eq!(h.host.spawn_attempts(), 0);
        assert_eq!(h.loader.loads(), 0);
    }

    #[tokio::test]
    async fn test_repeated_calls_build_independent_bridges() {
        let h = harness(ScriptedHost::new(true, true, true));
        let first_context = AudioContext::default();
        let second_context = AudioContext::default();

        let first = h
            .selector
            .acquire_engine(AcquireOptions {
                audio_context: Some(first_context.clone()),
                ..AcquireOptions::worker()
            })
            .await
            .unwrap()
            .unwrap();
        let second = h
            .selector
            .acquire_engine(AcquireOptions {
                audio_context: Some(second_context.clone()),
                ..AcquireOptions::worker()
            })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(h.host.spawn_attempts(), 2);
        assert_eq!(h.loader.loads(), 2);

        first.set_control_channel("gain", 0.1).await.unwrap();
        second.set_control_channel("gain", 0.9).await.unwrap();
        assert_eq!(first.get_control_channel("gain").await.unwrap(), 0.1);
        assert_eq!(second.get_control_channel("gain").await.unwrap(), 0.9);

        first.close().await;
        assert!(!first_context.is_attached());
        assert!(second_context.is_attached());
        assert_eq!(second.get_control_channel("gain").await.unwrap(), 0.9);
        second.close().await;
    }

    #[tokio::test]
    async fn test_operation_set_is_uniform() {
        let mut operation_sets = Vec::new();

        for (host, use_worker) in [
            (ScriptedHost::new(true, true, true), false),
            (ScriptedHost::new(true, true, true), true),
            (ScriptedHost::new(true, true, false), true),
            (ScriptedHost::new(false, true, true), true),
        ] {
            let h = harness(host);
            let surface = h
                .selector
                .acquire_engine(AcquireOptions {
                    use_worker,
                    ..AcquireOptions::default()
                })
                .await
                .unwrap()
                .unwrap();
            operation_sets.push(surface.operations().to_vec());
            surface.close().await;
        }

        assert_eq!(operation_sets.len(), 4);
        assert!(operation_sets.windows(2).all(|w| w[0] == w[1]));
    }

    #[tokio::test]
    async fn test_rejected_context_is_bridge_init_error() {
        let h = harness(ScriptedHost::new(true, true, true).rejecting_spawn());
        let result = h.selector.acquire_engine(AcquireOptions::worker()).await;

        match result {
            Err(AcquireError::BridgeInit { strategy, source }) => {
                assert_eq!(strategy, StrategyChoice::WorkletShared);
                assert!(matches!(source, BridgeError::Host(_)));
            }
            other => panic!("Expected BridgeInit error, got {:?}", other),
        }
        assert_eq!(h.host.spawn_attempts(), 1);
    }

    #[tokio::test]
    async fn test_failed_engine_is_not_downgraded() {
        let host = Arc::new(ScriptedHost::new(true, true, true));
        let loader: Arc<dyn EngineLoader> = Arc::new(FailingEngineLoader);
        let selector = StrategySelector::new(host.clone(), tone_package())
            .with_loader(loader)
            .with_log(Arc::new(RecordingLog::default()));

        let error = selector
            .acquire_engine(AcquireOptions::worker())
            .await
            .unwrap_err();

        assert_eq!(error.strategy(), StrategyChoice::WorkletShared);
        assert!(matches!(
            error,
            AcquireError::BridgeInit {
                source: BridgeError::EngineLoad(_),
                ..
            }
        ));
        assert_eq!(host.spawn_attempts(), 1);
    }

    #[tokio::test]
    async fn test_single_thread_load_failure() {
        let selector = StrategySelector::new(Arc::new(ScriptedHost::new(true, true, true)), tone_package())
            .with_loader(Arc::new(FailingEngineLoader))
            .with_log(Arc::new(RecordingLog::default()));

        let error = selector
            .acquire_engine(AcquireOptions::default())
            .await
            .unwrap_err();
        assert_eq!(error.strategy(), StrategyChoice::SingleThreadSync);
    }

    #[tokio::test]
    async fn test_init_timeout_is_opt_in() {
        let h = harness_with_loader(
            ScriptedHost::new(true, true, true),
            ToneEngineLoader::slow(Duration::from_millis(300)),
        );

        let result = h
            .selector
            .acquire_engine(AcquireOptions {
                init_timeout: Some(Duration::from_millis(20)),
                ..AcquireOptions::worker()
            })
            .await;
        assert!(matches!(
            result,
            Err(AcquireError::InitTimeout {
                strategy: StrategyChoice::WorkletShared,
                ..
            })
        ));

        let surface = h
            .selector
            .acquire_engine(AcquireOptions::worker())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(surface.strategy(), StrategyChoice::WorkletShared);
        surface.close().await;
    }

    #[tokio::test]
    async fn test_audio_session_prepared_every_call() {
        let h = harness(ScriptedHost::new(false, false, false));
        h.selector.acquire_engine(AcquireOptions::worker()).await.unwrap();
        h.selector.acquire_engine(AcquireOptions::default()).await.unwrap();
        assert_eq!(h.host.sessions_prepared(), 2);
    }

    #[tokio::test]
    async fn test_per_call_log_override() {
        let h = harness(ScriptedHost::new(true, true, true));
        let call_log = Arc::new(RecordingLog::default());

        let surface = h
            .selector
            .acquire_engine(AcquireOptions {
                log: Some(call_log.clone()),
                ..AcquireOptions::worker()
            })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(call_log.events().len(), 1);
        assert!(h.log.events().is_empty());
        surface.close().await;
    }

    #[tokio::test]
    async fn test_caller_owns_audio_context_lifecycle() {
        let h = harness(ScriptedHost::new(true, true, true));
        let audio_context = AudioContext::default();

        let surface = h
            .selector
            .acquire_engine(AcquireOptions {
                audio_context: Some(audio_context.clone()),
                ..AcquireOptions::worker()
            })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(audio_context.state(), crate::host::ContextState::Suspended);
        surface.close().await;
        assert_eq!(audio_context.state(), crate::host::ContextState::Suspended);
    }

    /// Poll the output until `predicate` holds or two seconds pass.
    fn render_until(audio_context: &AudioContext, predicate: impl Fn(&[f32]) -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        let mut out = vec![0.0f32; 64];
        while Instant::now() < deadline {
            if audio_context.render(&mut out) > 0 && predicate(&out) {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[tokio::test]
    async fn test_wasm_engine_renders_through_each_strategy() {
        for (host, use_worker) in [
            (ScriptedHost::new(true, true, true), false),
            (ScriptedHost::new(true, true, true), true),
            (ScriptedHost::new(true, true, false), true),
            (ScriptedHost::new(false, true, false), true),
        ] {
            let audio_context = AudioContext::new(48_000, 2);
            let selector = StrategySelector::new(Arc::new(host), tone_package())
                .with_loader(Arc::new(WasmEngineLoader::default()))
                .with_log(Arc::new(RecordingLog::default()));

            let surface = selector
                .acquire_engine(AcquireOptions {
                    audio_context: Some(audio_context.clone()),
                    use_worker,
                    ..AcquireOptions::default()
                })
                .await
                .unwrap()
                .unwrap();

            assert_eq!(surface.sample_rate().await.unwrap(), 48_000.0);
            surface.compile("instr 1\nendin").await.unwrap();
            surface.set_control_channel("gain", 0.25).await.unwrap();
            surface.start().await.unwrap();
            audio_context.resume();

            let strategy = surface.strategy();
            let rendered = tokio::task::spawn_blocking(move || {
                render_until(&audio_context, |out| out.iter().all(|s| *s == 0.25))
            })
            .await
            .unwrap();
            assert!(rendered, "no audio from {}", strategy);

            surface.close().await;
        }
    }
}
