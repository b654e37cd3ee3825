use serde::Serialize;

use crate::models::document::Document;

pub const LOADING_PLACEHOLDER_COUNT: usize = 5;
const EMPTY_NOTICE: &str = "No documents found.";
const UNKNOWN_TYPE: &str = "unknown";

/// One rendered result card. `open_path` is what the card's open control
/// sends with its open-file request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentCard {
    pub title: String,
    pub path: String,
    pub modified_label: String,
    pub type_label: String,
    pub source_label: Option<String>,
    pub open_path: String,
}

/// The full state of the results container. Each variant replaces the
/// container wholesale; there is no incremental diffing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultsView {
    /// Skeleton cards shown while a request is in flight.
    Loading { placeholders: usize },
    /// The search finished and matched nothing; distinct from loading.
    Empty { notice: String },
    Results { cards: Vec<DocumentCard> },
}

pub fn loading_view(placeholders: usize) -> ResultsView {
    ResultsView::Loading { placeholders }
}

/// Rebuilds the view from scratch; the same document list always yields the
/// same view.
pub fn results_view(documents: &[Document]) -> ResultsView {
    if documents.is_empty() {
        return ResultsView::Empty {
            notice: EMPTY_NOTICE.to_string(),
        };
    }
    ResultsView::Results {
        cards: documents.iter().map(card_for).collect(),
    }
}

fn card_for(document: &Document) -> DocumentCard {
    DocumentCard {
        title: document.filename.clone(),
        path: document.path.clone(),
        modified_label: document.modified.clone().unwrap_or_default(),
        type_label: type_label(document.extension.as_deref()),
        source_label: document.source.clone(),
        open_path: document.path.clone(),
    }
}

fn type_label(extension: Option<&str>) -> String {
    match extension {
        Some(ext) if !ext.is_empty() => ext.trim_start_matches('.').to_string(),
        _ => UNKNOWN_TYPE.to_string(),
    }
}
