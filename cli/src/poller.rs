use crate::client_cli::{ClientCli, ClientError, StatusReport};
use async_trait::async_trait;
use extractlib::ExecutionStatus;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Anything that can report an extraction's status.
#[async_trait]
pub trait StatusSource: Send {
    async fn fetch_status(&mut self, job_id: &str) -> Result<StatusReport, ClientError>;
}

#[async_trait]
impl StatusSource for ClientCli {
    async fn fetch_status(&mut self, job_id: &str) -> Result<StatusReport, ClientError> {
        self.query_status(job_id).await
    }
}

#[derive(thiserror::Error, Debug)]
pub enum PollError {
    #[error("status query failed: {0}")]
    Query(#[from] ClientError),
    #[error("{}", failure_message(.status, .error, .cause))]
    Execution {
        status: ExecutionStatus,
        error: Option<String>,
        cause: Option<String>,
    },
    #[error("extraction succeeded but no download URL was returned")]
    MissingDownloadUrl,
    #[error("polling was cancelled")]
    Cancelled,
    #[error("poller task failed: {0}")]
    Task(String),
}

fn failure_message(
    status: &ExecutionStatus,
    error: &Option<String>,
    cause: &Option<String>,
) -> String {
    let mut message = format!("extraction {}", status);
    if let Some(error) = error {
        message.push_str(&format!(": {}", error));
    }
    if let Some(cause) = cause {
        message.push_str(&format!(" ({})", cause));
    }
    message
}

/// Handle to a running status poller.
///
/// The poller issues one status query per period, the first one a full period after spawning,
/// and stops on the first terminal status or failed query. Dropping the handle stops it too.
pub struct PollerHandle {
    task: Option<JoinHandle<Result<String, PollError>>>,
}

impl PollerHandle {
    pub fn spawn<S>(source: S, job_id: String, period: Duration) -> Self
    where
        S: StatusSource + 'static,
    {
        let task = tokio::spawn(poll(source, job_id, period));
        Self { task: Some(task) }
    }

    /// Wait for the download URL of a succeeded extraction.
    pub async fn wait(&mut self) -> Result<String, PollError> {
        let task = match self.task.as_mut() {
            Some(task) => task,
            None => return Err(PollError::Cancelled),
        };
        let result = task.await;
        self.task = None;
        match result {
            Ok(result) => result,
            Err(err) if err.is_cancelled() => Err(PollError::Cancelled),
            Err(err) => Err(PollError::Task(err.to_string())),
        }
    }

    pub fn cancel(&self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn poll<S: StatusSource>(
    mut source: S,
    job_id: String,
    period: Duration,
) -> Result<String, PollError> {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    // one query in flight at most, firings missed meanwhile are dropped
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let report = source.fetch_status(&job_id).await?;
        match report.status {
            ExecutionStatus::Running => {
                debug!(job_id = %job_id, "Extraction still running");
            }
            ExecutionStatus::Succeeded => {
                info!(job_id = %job_id, "Extraction succeeded");
                return report.download_url.ok_or(PollError::MissingDownloadUrl);
            }
            status => {
                return Err(PollError::Execution {
                    status,
                    error: report.error,
                    cause: report.cause,
                })
            }
        }
    }
}
