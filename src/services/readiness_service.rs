use std::time::Duration;

use crate::error::AppError;

pub const READY_MAX_ATTEMPTS: u32 = 20;
pub const READY_PROBE_INTERVAL: Duration = Duration::from_millis(500);
const PROBE_REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// Polls `url` until it answers HTTP 200. Any other status, transport error,
/// or timeout counts the same: not ready yet, retry after a fixed interval.
/// The target is a local process expected to come up within seconds, so
/// there is no backoff — just a hard budget of exactly `max_attempts` GETs,
/// after which the probe fails terminally.
pub async fn wait_until_ready(
    http: &reqwest::Client,
    url: &str,
    max_attempts: u32,
    interval: Duration,
) -> Result<(), AppError> {
    let max_attempts = max_attempts.max(1);
    for attempt in 1..=max_attempts {
        match http.get(url).timeout(PROBE_REQUEST_TIMEOUT).send().await {
            Ok(response) if response.status() == reqwest::StatusCode::OK => {
                log::info!("backend ready after {attempt} probe attempt(s)");
                return Ok(());
            }
            Ok(response) => {
                log::debug!("probe attempt {attempt}: backend answered {}", response.status());
            }
            Err(err) => {
                log::debug!("probe attempt {attempt}: {err}");
            }
        }
        if attempt < max_attempts {
            tokio::time::sleep(interval).await;
        }
    }

    Err(AppError::Readiness(format!(
        "no 200 from {url} after {max_attempts} attempts"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use tokio::net::TcpListener;

    const FAST: Duration = Duration::from_millis(10);

    #[derive(Clone)]
    struct Probed {
        hits: Arc<AtomicUsize>,
        ready_after: usize,
        not_ready_status: StatusCode,
    }

    async fn root(State(probed): State<Probed>) -> StatusCode {
        let hit = probed.hits.fetch_add(1, Ordering::SeqCst) + 1;
        if probed.ready_after > 0 && hit >= probed.ready_after {
            StatusCode::OK
        } else {
            probed.not_ready_status
        }
    }

    async fn spawn_probe_target(ready_after: usize, not_ready_status: StatusCode) -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let state = Probed {
            hits: hits.clone(),
            ready_after,
            not_ready_status,
        };
        let app = Router::new().route("/", get(root)).with_state(state);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{address}/"), hits)
    }

    #[tokio::test]
    async fn resolves_once_target_answers_200() {
        let (url, hits) = spawn_probe_target(3, StatusCode::SERVICE_UNAVAILABLE).await;
        let http = reqwest::Client::new();
        wait_until_ready(&http, &url, 20, FAST).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn fails_after_exactly_max_attempts_and_stops_probing() {
        let (url, hits) = spawn_probe_target(0, StatusCode::SERVICE_UNAVAILABLE).await;
        let http = reqwest::Client::new();
        let err = wait_until_ready(&http, &url, 5, FAST).await.unwrap_err();
        assert!(matches!(err, AppError::Readiness(_)), "got {err:?}");
        assert_eq!(hits.load(Ordering::SeqCst), 5);

        // No further requests may be issued once the probe has rejected.
        tokio::time::sleep(FAST * 5).await;
        assert_eq!(hits.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn non_200_success_statuses_do_not_count_as_ready() {
        let (url, hits) = spawn_probe_target(0, StatusCode::NO_CONTENT).await;
        let http = reqwest::Client::new();
        let err = wait_until_ready(&http, &url, 3, FAST).await.unwrap_err();
        assert!(matches!(err, AppError::Readiness(_)));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn connection_refused_retries_like_any_other_failure() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let http = reqwest::Client::new();
        let err = wait_until_ready(&http, &format!("http://127.0.0.1:{port}/"), 2, FAST)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Readiness(_)));
    }
}
