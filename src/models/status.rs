use serde::{Deserialize, Serialize};

/// Backend job status. The backend owns this value; anything it reports
/// outside the known set decodes to `Unknown`, which is never terminal, so a
/// poller observing it keeps waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Idle,
    Running,
    Done,
    Error,
    #[serde(other)]
    #[default]
    Unknown,
}

impl JobStatus {
    /// `idle` counts as finished: a backend that completed and reset before
    /// the first poll landed must not read as "never started".
    pub fn is_finished(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Idle)
    }

    pub fn is_terminal(self) -> bool {
        self.is_finished() || self == JobStatus::Error
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobState {
    pub status: JobStatus,
    pub step: Option<String>,
    pub error: Option<String>,
    pub indexed: Option<u64>,
    pub started_at: Option<String>,
    pub ended_at: Option<String>,
}

/// Remote session status, fetched per use and never cached. Every field is
/// absent-safe: a partial body decodes with defaults rather than failing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionStatus {
    pub terms_accepted: bool,
    pub index_exists: bool,
    pub job: JobState,
}
