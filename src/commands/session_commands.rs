use tauri::{command, AppHandle, Emitter, Manager, State};

use crate::error::AppError;
use crate::services::scan_service::{self, ScanOutcome, SCAN_POLL_INTERVAL};
use crate::services::session_service::{self, SessionRoute};
use crate::state::AppState;

pub const SCAN_PROGRESS_EVENT: &str = "scan-progress";
pub const SCAN_FINISHED_EVENT: &str = "scan-finished";

/// Startup transition, evaluated once per UI load. When the route is the
/// silent accept-and-scan path the poller is already running by the time
/// the webview receives the answer.
#[command]
pub async fn bootstrap_session(
    app: AppHandle,
    state: State<'_, AppState>,
) -> Result<SessionRoute, AppError> {
    let route = session_service::resolve_startup_route(&state.client, &state.acceptance).await;
    if route == SessionRoute::AutoAcceptAndScan {
        spawn_scan_poller(app);
    }
    Ok(route)
}

/// Manual terms-gate path. Declining closes the window; consenting
/// dispatches accept (failure here is surfaced, unlike the silent startup
/// path) and enters the scan poll.
#[command]
pub async fn proceed_to_scan(
    accepted: bool,
    window: tauri::WebviewWindow,
    app: AppHandle,
    state: State<'_, AppState>,
) -> Result<bool, AppError> {
    if !accepted {
        log::warn!("terms declined; closing window");
        window
            .close()
            .map_err(|err| AppError::General(err.to_string()))?;
        return Ok(false);
    }

    let ack = state.client.accept().await?;
    log::info!(
        "scan triggered: {}",
        ack.message.as_deref().unwrap_or("ok")
    );
    if let Err(err) = state.acceptance.mark_accepted() {
        log::warn!("could not persist acceptance flag: {err}");
    }

    spawn_scan_poller(app);
    Ok(true)
}

#[command]
pub fn cancel_scan(state: State<'_, AppState>) -> Result<(), AppError> {
    state.cancel_scan_poll();
    Ok(())
}

fn spawn_scan_poller(app: AppHandle) {
    let Some(cancel_flag) = app.state::<AppState>().begin_scan_poll() else {
        log::info!("scan poll already active; not starting another");
        return;
    };

    tauri::async_runtime::spawn(async move {
        let state = app.state::<AppState>();
        let outcome = scan_service::poll_until_terminal(
            &state.client,
            &cancel_flag,
            SCAN_POLL_INTERVAL,
            |job| {
                let _ = app.emit(SCAN_PROGRESS_EVENT, job);
            },
        )
        .await;
        state.end_scan_poll();

        if let ScanOutcome::Failed { reason } = &outcome {
            log::error!("scan failed: {reason}");
        }
        let _ = app.emit(SCAN_FINISHED_EVENT, &outcome);
    });
}
