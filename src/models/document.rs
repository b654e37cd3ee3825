use serde::{Deserialize, Serialize};

/// One document as returned by the backend search. The payload is rendered
/// verbatim; `path` is the only field with a local invariant — it is a stable
/// identifier usable for a subsequent open-file request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub filename: String,
    pub path: String,
    #[serde(default)]
    pub modified: Option<String>,
    #[serde(default)]
    pub extension: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchResponse {
    pub results: Vec<Document>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AcceptAck {
    pub ok: bool,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OpenFileAck {
    // The backend historically reported "ok"; the documented contract says
    // "success". Accept either spelling.
    #[serde(alias = "ok")]
    pub success: bool,
    pub error: Option<String>,
}
