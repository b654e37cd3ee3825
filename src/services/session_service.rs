use serde::Serialize;

use crate::data::acceptance::AcceptanceStore;
use crate::error::AppError;
use crate::models::status::SessionStatus;
use crate::services::task_client::TaskClient;

/// Where the shell sends a freshly loaded UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionRoute {
    /// Terms accepted, index present, job settled: straight to results.
    RedirectToResults,
    /// First run (or the index went missing): accept has been dispatched
    /// silently and a scan poll should begin.
    AutoAcceptAndScan,
    /// Anything else: keep the terms gate up for a manual proceed.
    ShowTermsGate,
}

/// Startup transition rule, evaluated once per UI load. A status fetch
/// failure is not fatal — the terms gate stays available and the user can
/// proceed manually.
pub async fn resolve_startup_route(
    client: &TaskClient,
    acceptance: &AcceptanceStore,
) -> SessionRoute {
    let status = match client.status().await {
        Ok(status) => status,
        Err(err) => {
            log::warn!("could not check backend status: {err}");
            return SessionRoute::ShowTermsGate;
        }
    };

    let route = classify(&status);
    if route == SessionRoute::AutoAcceptAndScan {
        ensure_accept_dispatched(client, acceptance).await;
    }
    route
}

fn classify(status: &SessionStatus) -> SessionRoute {
    if status.terms_accepted && status.index_exists && status.job.status.is_finished() {
        SessionRoute::RedirectToResults
    } else if !status.terms_accepted || !status.index_exists {
        SessionRoute::AutoAcceptAndScan
    } else {
        SessionRoute::ShowTermsGate
    }
}

/// Dispatches the accept action unless this profile already did so once.
/// Failure never blocks the flow — the user should still see scan progress
/// even if the accept notification race-loses. A malformed acknowledgement
/// still counts as delivered; only a transport failure leaves the flag
/// unset so the next startup retries.
pub async fn ensure_accept_dispatched(client: &TaskClient, acceptance: &AcceptanceStore) {
    if acceptance.is_accepted() {
        return;
    }

    match client.accept().await {
        Ok(ack) => {
            log::info!(
                "terms accept dispatched: {}",
                ack.message.as_deref().unwrap_or("ok")
            );
            persist_flag(acceptance);
        }
        Err(err @ AppError::Protocol(_)) => {
            log::warn!("accept acknowledged with unusable body: {err}");
            persist_flag(acceptance);
        }
        Err(err) => {
            log::warn!("accept dispatch failed: {err}");
        }
    }
}

fn persist_flag(acceptance: &AcceptanceStore) {
    if let Err(err) = acceptance.mark_accepted() {
        log::warn!("could not persist acceptance flag: {err}");
    }
}
