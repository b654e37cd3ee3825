use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::models::status::{JobState, JobStatus};
use crate::services::task_client::TaskClient;

pub const SCAN_POLL_INTERVAL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScanOutcome {
    /// Job reached `done`, or reset to `idle` before the first poll landed.
    Completed,
    /// Backend reported job status `error`. Terminal; the poller never
    /// auto-retries the scan.
    Failed { reason: String },
    /// Stopped through the cancel flag before any terminal status arrived.
    Cancelled,
}

/// Polls job status on a fixed cadence until a terminal value. A failed
/// individual poll keeps the loop alive — only an explicit `error` status is
/// an error, and unknown statuses are never terminal. The cancel flag is the
/// one way out of an indefinitely `running` job.
pub async fn poll_until_terminal(
    client: &TaskClient,
    cancel_flag: &Arc<AtomicBool>,
    interval: Duration,
    mut on_progress: impl FnMut(&JobState),
) -> ScanOutcome {
    loop {
        tokio::time::sleep(interval).await;
        if cancel_flag.load(Ordering::Relaxed) {
            log::info!("scan poll cancelled");
            return ScanOutcome::Cancelled;
        }

        let status = match client.status().await {
            Ok(status) => status,
            Err(err) => {
                log::warn!("scan status poll failed: {err}");
                continue;
            }
        };

        log::debug!("polling status: {:?}", status.job.status);
        on_progress(&status.job);

        match status.job.status {
            job if job.is_finished() => return ScanOutcome::Completed,
            JobStatus::Error => {
                return ScanOutcome::Failed {
                    reason: status
                        .job
                        .error
                        .unwrap_or_else(|| "scan failed, please try again".to_string()),
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use tokio::net::TcpListener;

    const FAST: Duration = Duration::from_millis(10);

    /// Serves one scripted status reply per poll, repeating the last one;
    /// the literal "503" entry answers with a server error instead.
    #[derive(Clone)]
    struct Script {
        replies: Arc<Mutex<Vec<&'static str>>>,
        polls: Arc<AtomicUsize>,
    }

    async fn task(State(script): State<Script>, Json(_body): Json<Value>) -> (StatusCode, Json<Value>) {
        script.polls.fetch_add(1, Ordering::SeqCst);
        let job = {
            let mut replies = script.replies.lock().unwrap();
            if replies.len() > 1 {
                replies.remove(0)
            } else {
                replies[0]
            }
        };
        if job == "503" {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"ok": false, "error": "boom"})),
            );
        }
        let body = json!({
            "termsAccepted": true,
            "indexExists": true,
            "job": {"status": job, "error": if job == "error" { Some("Scan failed. Please try again.") } else { None::<&str> }}
        });
        (StatusCode::OK, Json(body))
    }

    async fn spawn_scripted_backend(replies: Vec<&'static str>) -> (TaskClient, Arc<AtomicUsize>) {
        let polls = Arc::new(AtomicUsize::new(0));
        let script = Script {
            replies: Arc::new(Mutex::new(replies)),
            polls: polls.clone(),
        };
        let app = Router::new().route("/task", post(task)).with_state(script);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (TaskClient::new(format!("http://{address}")), polls)
    }

    fn unset_flag() -> Arc<AtomicBool> {
        Arc::new(AtomicBool::new(false))
    }

    #[tokio::test]
    async fn stops_on_first_done_status() {
        let (client, polls) = spawn_scripted_backend(vec!["running", "running", "done"]).await;
        let outcome = poll_until_terminal(&client, &unset_flag(), FAST, |_| {}).await;
        assert_eq!(outcome, ScanOutcome::Completed);
        assert_eq!(polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn idle_counts_as_completed_on_the_first_poll() {
        let (client, polls) = spawn_scripted_backend(vec!["idle"]).await;
        let outcome = poll_until_terminal(&client, &unset_flag(), FAST, |_| {}).await;
        assert_eq!(outcome, ScanOutcome::Completed);
        assert_eq!(polls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn error_status_is_terminal_with_the_backend_reason() {
        let (client, _polls) = spawn_scripted_backend(vec!["running", "error"]).await;
        let outcome = poll_until_terminal(&client, &unset_flag(), FAST, |_| {}).await;
        assert_eq!(
            outcome,
            ScanOutcome::Failed {
                reason: "Scan failed. Please try again.".to_string()
            }
        );
    }

    #[tokio::test]
    async fn unknown_statuses_and_failed_polls_keep_the_loop_running() {
        let (client, polls) =
            spawn_scripted_backend(vec!["compacting", "503", "running", "done"]).await;
        let outcome = poll_until_terminal(&client, &unset_flag(), FAST, |_| {}).await;
        assert_eq!(outcome, ScanOutcome::Completed);
        assert_eq!(polls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn cancel_flag_ends_an_endless_job() {
        let (client, _polls) = spawn_scripted_backend(vec!["running"]).await;
        let cancel_flag = unset_flag();
        let poller = {
            let client = client.clone();
            let cancel_flag = cancel_flag.clone();
            tokio::spawn(async move {
                poll_until_terminal(&client, &cancel_flag, FAST, |_| {}).await
            })
        };

        tokio::time::sleep(FAST * 5).await;
        cancel_flag.store(true, Ordering::Relaxed);
        let outcome = poller.await.unwrap();
        assert_eq!(outcome, ScanOutcome::Cancelled);
    }

    #[tokio::test]
    async fn progress_callback_sees_each_decoded_job_state() {
        let (client, _polls) = spawn_scripted_backend(vec!["running", "done"]).await;
        let mut seen = Vec::new();
        let outcome = poll_until_terminal(&client, &unset_flag(), FAST, |job| {
            seen.push(job.status);
        })
        .await;
        assert_eq!(outcome, ScanOutcome::Completed);
        assert_eq!(seen, vec![JobStatus::Running, JobStatus::Done]);
    }
}
