use std::collections::BTreeMap;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use crate::error::AppError;
use crate::models::document::{AcceptAck, Document, OpenFileAck, SearchResponse};
use crate::models::status::SessionStatus;

/// The backend binds this address at a port both sides know at compile time.
pub const BACKEND_BASE_URL: &str = "http://127.0.0.1:5005";

/// A single space asks the backend for the unfiltered document set.
pub const MATCH_EVERYTHING_QUERY: &str = " ";

const TASK_ROUTE: &str = "/task";
const OPEN_FILE_ROUTE: &str = "/openfile";
const COUNT_FILES_ROUTE: &str = "/count_files";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Stateless wrapper around the backend's single-endpoint task protocol.
/// `send` returns the parsed body as-is and performs no schema validation;
/// the typed helpers layered on top are the one place where malformed bodies
/// become `AppError::Protocol` instead of silently-absent fields.
#[derive(Debug, Clone)]
pub struct TaskClient {
    http: reqwest::Client,
    base_url: String,
}

impl TaskClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Posts `{"action": action, ...params}` to the task endpoint. Network
    /// failures map to `Transport`; any parsed JSON body comes back verbatim.
    pub async fn send(&self, action: &str, params: Map<String, Value>) -> Result<Value, AppError> {
        let mut body = Map::new();
        body.insert("action".to_string(), json!(action));
        body.extend(params);
        self.post_json(TASK_ROUTE, Some(Value::Object(body))).await
    }

    pub async fn status(&self) -> Result<SessionStatus, AppError> {
        decode(self.send("status", Map::new()).await?)
    }

    /// Dispatches the accept action; the backend starts a scan as a side
    /// effect when no index exists yet.
    pub async fn accept(&self) -> Result<AcceptAck, AppError> {
        decode(self.send("accept", Map::new()).await?)
    }

    pub async fn search(&self, query: &str) -> Result<Vec<Document>, AppError> {
        let mut params = Map::new();
        params.insert("q".to_string(), json!(query));
        let response: SearchResponse = decode(self.send("search", params).await?)?;
        Ok(response.results)
    }

    pub async fn open_file(&self, path: &str) -> Result<OpenFileAck, AppError> {
        decode(
            self.post_json(OPEN_FILE_ROUTE, Some(json!({ "path": path })))
                .await?,
        )
    }

    pub async fn count_files(&self) -> Result<BTreeMap<String, u64>, AppError> {
        decode(self.post_json(COUNT_FILES_ROUTE, None).await?)
    }

    async fn post_json(&self, route: &str, body: Option<Value>) -> Result<Value, AppError> {
        let mut request = self
            .http
            .post(format!("{}{}", self.base_url, route))
            .timeout(REQUEST_TIMEOUT);
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let value: Value = response.json().await?;

        if !status.is_success() {
            let reason = value
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(AppError::Protocol(format!(
                "backend answered {status}: {reason}"
            )));
        }
        Ok(value)
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, AppError> {
    serde_json::from_value(value)
        .map_err(|err| AppError::Protocol(format!("malformed backend response: {err}")))
}
