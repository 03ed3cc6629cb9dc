// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Readiness polling: retry the engine until it reports ready.

use std::time::Duration;

use rand::Rng;
use tracing::{debug, info, warn};

use prochost_engine_client::EngineClient;

use crate::config::KernelConfig;
use crate::error::{KernelError, Result};
use crate::metrics::{Counter, KernelMetrics};
use crate::run_state::RunState;

/// How a readiness wait ended short of exhausting its attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessOutcome {
    /// The engine reported ready on the given attempt (1-based).
    Ready { attempts: u32 },
    /// A stop was requested before the engine became ready.
    Interrupted,
}

/// Poll the engine's status endpoint until it reports at least one running
/// engine, a stop is requested, or the attempt budget runs out.
///
/// Every attempt increments the wait counter, successful or not. The sleep
/// between attempts is `base + uniform(0, jitter)` so simultaneously started
/// instances do not retry in lockstep. Exhausting the budget is fatal to the
/// bootstrap; an interrupt is not an error.
pub async fn await_engine_ready(
    client: &EngineClient,
    config: &KernelConfig,
    metrics: &KernelMetrics,
    run_state: &RunState,
) -> Result<ReadinessOutcome> {
    let max_attempts = config.readiness_max_attempts;

    for attempt in 1..=max_attempts {
        if run_state.is_stopping() {
            info!(attempt, "Stop requested while waiting for the engine");
            return Ok(ReadinessOutcome::Interrupted);
        }

        metrics.increment(Counter::ReadinessWaitAttempts);

        match client.list_engines().await {
            Ok(engines) if !engines.is_empty() => {
                let engine = engines.first().map(|e| e.name.as_str()).unwrap_or("default");
                info!(engine, attempt, "Engine ready");
                write_readiness_marker(config);
                return Ok(ReadinessOutcome::Ready { attempts: attempt });
            }
            Ok(_) => {
                warn!(attempt, "Engine responded but reported no engines");
            }
            Err(e) => {
                debug!(attempt, error = %e, "Engine not reachable yet");
            }
        }

        if attempt < max_attempts {
            info!(attempt, max_attempts, "Waiting for engine");
            tokio::time::sleep(retry_sleep(config)).await;
            if run_state.is_stopping() {
                info!(attempt, "Stop requested while waiting for the engine");
                return Ok(ReadinessOutcome::Interrupted);
            }
        }
    }

    Err(KernelError::EngineUnavailable {
        attempts: max_attempts,
    })
}

/// Base sleep plus uniform jitter.
fn retry_sleep(config: &KernelConfig) -> Duration {
    let jitter = if config.readiness_jitter_secs > 0.0 {
        rand::thread_rng().gen_range(0.0..=config.readiness_jitter_secs)
    } else {
        0.0
    };
    config.readiness_base_sleep() + Duration::from_secs_f64(jitter)
}

/// Best-effort readiness marker: a plain Unix timestamp, recreated by the
/// health monitor if it goes missing later.
pub(crate) fn write_readiness_marker(config: &KernelConfig) {
    let stamp = chrono::Utc::now().timestamp().to_string();
    if let Err(e) = std::fs::write(&config.readiness_file, stamp) {
        warn!(
            file = %config.readiness_file.display(),
            error = %e,
            "Could not write readiness marker"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use prochost_engine_client::EngineClientConfig;

    fn test_config(tmp: &Path, max_attempts: u32) -> KernelConfig {
        KernelConfig {
            instance_id: "prochost-test".to_string(),
            version: "0.0.0".to_string(),
            environment: "test".to_string(),
            engine_base_url: "http://localhost:8080".to_string(),
            engine_api_root: "http://localhost:8080/engine-rest".to_string(),
            definitions_dir: tmp.join("definitions"),
            readiness_file: tmp.join("prochost.ready"),
            metrics_snapshot_file: tmp.join("metrics.json"),
            health_check_interval_secs: 1,
            health_backoff_base: 1.5,
            health_check_enabled: true,
            readiness_max_attempts: max_attempts,
            readiness_base_sleep_secs: 0.01,
            readiness_jitter_secs: 0.0,
            auto_deploy: true,
            root_process_key: "system_orchestrator".to_string(),
        }
    }

    fn client_for(server: &MockServer) -> EngineClient {
        EngineClient::new(EngineClientConfig::new(server.uri())).unwrap()
    }

    #[tokio::test]
    async fn test_ready_on_later_attempt_counts_every_attempt() {
        let server = MockServer::start().await;
        let tmp = tempfile::tempdir().unwrap();

        // Two failures, then ready
        Mock::given(method("GET"))
            .and(path("/engine"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/engine"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!([{"name": "default"}])),
            )
            .mount(&server)
            .await;

        let config = test_config(tmp.path(), 10);
        let metrics = KernelMetrics::new();
        let run_state = RunState::new();

        let outcome = await_engine_ready(&client_for(&server), &config, &metrics, &run_state)
            .await
            .unwrap();

        assert_eq!(outcome, ReadinessOutcome::Ready { attempts: 3 });
        assert_eq!(metrics.get(Counter::ReadinessWaitAttempts), 3);

        // Marker holds a parseable Unix timestamp
        let marker = std::fs::read_to_string(&config.readiness_file).unwrap();
        marker.trim().parse::<i64>().unwrap();
    }

    #[tokio::test]
    async fn test_exhausted_attempts_is_fatal() {
        let server = MockServer::start().await;
        let tmp = tempfile::tempdir().unwrap();

        Mock::given(method("GET"))
            .and(path("/engine"))
            .respond_with(ResponseTemplate::new(503))
            .expect(4)
            .mount(&server)
            .await;

        let config = test_config(tmp.path(), 4);
        let metrics = KernelMetrics::new();
        let run_state = RunState::new();

        let err = await_engine_ready(&client_for(&server), &config, &metrics, &run_state)
            .await
            .unwrap_err();

        assert!(matches!(err, KernelError::EngineUnavailable { attempts: 4 }));
        assert_eq!(metrics.get(Counter::ReadinessWaitAttempts), 4);
        assert!(!config.readiness_file.exists());
    }

    #[tokio::test]
    async fn test_empty_engine_list_is_not_ready() {
        let server = MockServer::start().await;
        let tmp = tempfile::tempdir().unwrap();

        Mock::given(method("GET"))
            .and(path("/engine"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let config = test_config(tmp.path(), 2);
        let metrics = KernelMetrics::new();
        let run_state = RunState::new();

        let err = await_engine_ready(&client_for(&server), &config, &metrics, &run_state)
            .await
            .unwrap_err();

        assert!(matches!(err, KernelError::EngineUnavailable { attempts: 2 }));
    }

    #[tokio::test]
    async fn test_stop_requested_before_first_attempt() {
        let server = MockServer::start().await;
        let tmp = tempfile::tempdir().unwrap();

        Mock::given(method("GET"))
            .and(path("/engine"))
            .respond_with(ResponseTemplate::new(503))
            .expect(0)
            .mount(&server)
            .await;

        let config = test_config(tmp.path(), 10);
        let metrics = KernelMetrics::new();
        let run_state = RunState::new();
        run_state.request_stop();

        let outcome = await_engine_ready(&client_for(&server), &config, &metrics, &run_state)
            .await
            .unwrap();

        assert_eq!(outcome, ReadinessOutcome::Interrupted);
        assert_eq!(metrics.get(Counter::ReadinessWaitAttempts), 0);
    }

    #[test]
    fn test_retry_sleep_without_jitter_is_the_base() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path(), 1);
        assert_eq!(retry_sleep(&config), Duration::from_millis(10));
    }

    #[test]
    fn test_retry_sleep_jitter_stays_in_bounds() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = test_config(tmp.path(), 1);
        config.readiness_base_sleep_secs = 1.0;
        config.readiness_jitter_secs = 0.5;

        for _ in 0..100 {
            let sleep = retry_sleep(&config);
            assert!(sleep >= Duration::from_secs_f64(1.0));
            assert!(sleep <= Duration::from_secs_f64(1.5));
        }
    }
}
