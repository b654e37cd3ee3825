mod commands;
mod data;
mod error;
mod models;
mod services;
mod state;

use commands::{search_commands, session_commands};
use data::acceptance::AcceptanceStore;
use services::backend_service::{self, BackendCommand, LaunchMode};
use services::readiness_service::{self, READY_MAX_ATTEMPTS, READY_PROBE_INTERVAL};
use services::task_client::{TaskClient, BACKEND_BASE_URL};
use state::AppState;

use tauri::{AppHandle, Manager, RunEvent, WebviewUrl, WebviewWindowBuilder};

const MAIN_WINDOW_LABEL: &str = "main";

fn create_main_window(app: &AppHandle) -> tauri::Result<()> {
    WebviewWindowBuilder::new(app, MAIN_WINDOW_LABEL, WebviewUrl::App("index.html".into()))
        .title("Document Finder")
        .inner_size(1200.0, 800.0)
        .build()?;
    Ok(())
}

/// Probe-gated startup: the main window only exists once the backend answers
/// its readiness endpoint. On exhaustion nothing is shown — a UI with no
/// reachable backend is worse than no UI — and the failure lands in the log.
fn spawn_startup_task(app: AppHandle) {
    tauri::async_runtime::spawn(async move {
        log::info!("waiting for backend to be ready...");
        let probe = reqwest::Client::new();
        let url = format!("{BACKEND_BASE_URL}/");
        match readiness_service::wait_until_ready(
            &probe,
            &url,
            READY_MAX_ATTEMPTS,
            READY_PROBE_INTERVAL,
        )
        .await
        {
            Ok(()) => {
                log::info!("backend is ready, launching UI");
                if let Err(err) = create_main_window(&app) {
                    log::error!("failed to create main window: {err}");
                }
            }
            Err(err) => log::error!("backend failed to start: {err}"),
        }
    });
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tauri::Builder::default()
        .plugin(
            tauri_plugin_log::Builder::new()
                .level(log::LevelFilter::Info)
                .build(),
        )
        .plugin(tauri_plugin_opener::init())
        .setup(|app| {
            let mode = if tauri::is_dev() {
                LaunchMode::Dev
            } else {
                LaunchMode::Packaged
            };
            let backend = backend_service::spawn_backend(&BackendCommand::resolve(mode))?;

            let state_dir = app.path().app_data_dir()?;
            app.manage(AppState::new(
                TaskClient::new(BACKEND_BASE_URL),
                AcceptanceStore::new(&state_dir),
            ));
            app.state::<AppState>().set_backend(backend);

            spawn_startup_task(app.handle().clone());
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            session_commands::bootstrap_session,
            session_commands::proceed_to_scan,
            session_commands::cancel_scan,
            search_commands::search_documents,
            search_commands::fetch_all_documents,
            search_commands::open_document,
            search_commands::fetch_file_counts,
        ])
        .build(tauri::generate_context!())
        .expect("error while building tauri application")
        .run(|app_handle, event| {
            if let RunEvent::Exit = event {
                // In-flight requests are simply abandoned; the backend gets
                // no chance to outlive the shell.
                if let Some(backend) = app_handle.state::<AppState>().take_backend() {
                    backend_service::stop(&backend);
                }
            }
        });
}
