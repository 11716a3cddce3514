//! Task Polling
//!
//! Drives any long-running cluster task (registration, deployment) to a
//! terminal state. This is the subsystem's single suspension point.

use osml_client::api::MlApi;
use osml_core::config::get_config_u64;
use osml_core::error::{Error, Result};
use osml_core::model::{TASK_STATE_COMPLETED, TASK_STATE_FAILED};
use std::time::Duration;
use tracing::{debug, info};

/// Stands in for the cluster's error text when a FAILED task carries none.
const NO_REASON: &str = "task reported FAILED without an error message";

/// Poll cadence and deadline for awaiting a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            timeout: Duration::from_secs(300),
        }
    }
}

impl PollSettings {
    /// Read overrides from `OSML_POLL_INTERVAL_SECS` /
    /// `OSML_POLL_TIMEOUT_SECS`, with the defaults above for anything unset.
    pub fn from_env() -> Self {
        Self {
            interval: Duration::from_secs(get_config_u64("OSML_POLL_INTERVAL_SECS", 3)),
            timeout: Duration::from_secs(get_config_u64("OSML_POLL_TIMEOUT_SECS", 300)),
        }
    }
}

/// Wait until `task_id` reaches a terminal state.
///
/// COMPLETED returns immediately. FAILED returns [`Error::TaskFailed`]
/// carrying the cluster's error text verbatim, with no further polling. Any
/// other state, including states future cluster versions may add, counts as
/// still in progress: sleep one interval and poll again. The loop runs under
/// a structural timeout, and the future can be dropped to cancel at any
/// await point.
pub async fn await_completion(
    api: &dyn MlApi,
    task_id: &str,
    settings: PollSettings,
) -> Result<()> {
    let started = tokio::time::Instant::now();
    let wait = poll_until_terminal(api, task_id, settings.interval);

    match tokio::time::timeout(settings.timeout, wait).await {
        Ok(result) => result,
        Err(_) => Err(Error::TaskTimeout {
            task_id: task_id.to_string(),
            elapsed: started.elapsed(),
        }),
    }
}

async fn poll_until_terminal(api: &dyn MlApi, task_id: &str, interval: Duration) -> Result<()> {
    loop {
        let status = api.task_status(task_id).await?;
        match status.state.as_str() {
            TASK_STATE_COMPLETED => {
                info!("Task {} completed", task_id);
                return Ok(());
            }
            TASK_STATE_FAILED => {
                return Err(Error::TaskFailed {
                    task_id: task_id.to_string(),
                    reason: status.error.unwrap_or_else(|| NO_REASON.to_string()),
                });
            }
            other => {
                debug!("Task {} still {}, polling again", task_id, other);
                tokio::time::sleep(interval).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{task, MockApi};
    use std::sync::atomic::Ordering;

    #[tokio::test(start_paused = true)]
    async fn test_three_polls_to_completion() {
        let api = MockApi::default();
        api.queue_tasks(vec![
            task("CREATED", None),
            task("RUNNING", None),
            task("COMPLETED", None),
        ]);

        await_completion(&api, "t1", PollSettings::default())
            .await
            .unwrap();
        assert_eq!(api.poll_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_perpetual_running_times_out() {
        let api = MockApi::default();
        api.queue_tasks(vec![task("RUNNING", None)]);

        let settings = PollSettings {
            interval: Duration::from_secs(1),
            timeout: Duration::from_millis(3500),
        };
        let err = await_completion(&api, "t1", settings).await.unwrap_err();
        match err {
            Error::TaskTimeout { task_id, elapsed } => {
                assert_eq!(task_id, "t1");
                assert!(elapsed >= settings.timeout);
            }
            other => panic!("expected timeout, got {:?}", other),
        }
        // Polls land at 0s, 1s, 2s, 3s; the deadline fires mid-sleep
        assert_eq!(api.poll_calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_stops_immediately_with_reason_verbatim() {
        let api = MockApi::default();
        api.queue_tasks(vec![task(
            "FAILED",
            Some("native memory circuit breaker is open"),
        )]);

        let err = await_completion(&api, "t9", PollSettings::default())
            .await
            .unwrap_err();
        match err {
            Error::TaskFailed { task_id, reason } => {
                assert_eq!(task_id, "t9");
                assert_eq!(reason, "native memory circuit breaker is open");
            }
            other => panic!("expected task failure, got {:?}", other),
        }
        assert_eq!(api.poll_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_without_error_text_gets_placeholder() {
        let api = MockApi::default();
        api.queue_tasks(vec![task("FAILED", None)]);

        let err = await_completion(&api, "t9", PollSettings::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("without an error message"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_state_counts_as_in_progress() {
        let api = MockApi::default();
        api.queue_tasks(vec![task("CANCELLING", None), task("COMPLETED", None)]);

        await_completion(&api, "t2", PollSettings::default())
            .await
            .unwrap();
        assert_eq!(api.poll_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_settings_from_env() {
        std::env::set_var("OSML_POLL_INTERVAL_SECS", "1");
        std::env::set_var("OSML_POLL_TIMEOUT_SECS", "60");
        let settings = PollSettings::from_env();
        assert_eq!(settings.interval, Duration::from_secs(1));
        assert_eq!(settings.timeout, Duration::from_secs(60));
        std::env::remove_var("OSML_POLL_INTERVAL_SECS");
        std::env::remove_var("OSML_POLL_TIMEOUT_SECS");
    }
}
