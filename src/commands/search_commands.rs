use std::collections::BTreeMap;

use tauri::{command, State};

use crate::error::AppError;
use crate::services::render_service::{self, ResultsView};
use crate::services::task_client::MATCH_EVERYTHING_QUERY;
use crate::state::AppState;

#[command]
pub async fn search_documents(
    query: String,
    state: State<'_, AppState>,
) -> Result<ResultsView, AppError> {
    if query.trim().is_empty() {
        return Err(AppError::General("no query provided".to_string()));
    }
    let documents = state.client.search(&query).await?;
    Ok(render_service::results_view(&documents))
}

/// Initial results-page load: the single-space sentinel asks the backend
/// for the unfiltered document set.
#[command]
pub async fn fetch_all_documents(state: State<'_, AppState>) -> Result<ResultsView, AppError> {
    let documents = state.client.search(MATCH_EVERYTHING_QUERY).await?;
    Ok(render_service::results_view(&documents))
}

/// Opens a document with the OS default handler, via the backend. A refusal
/// comes back as `OpenFile` so the UI can show its one blocking alert.
#[command]
pub async fn open_document(path: String, state: State<'_, AppState>) -> Result<(), AppError> {
    let ack = state.client.open_file(&path).await?;
    if ack.success {
        log::info!("opened {path}");
        Ok(())
    } else {
        Err(AppError::OpenFile(ack.error.unwrap_or_else(|| {
            format!("backend could not open {path}")
        })))
    }
}

#[command]
pub async fn fetch_file_counts(
    state: State<'_, AppState>,
) -> Result<BTreeMap<String, u64>, AppError> {
    state.client.count_files().await
}
