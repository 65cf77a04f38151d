use std::fmt;

/// Status of a Step Functions execution.
///
/// Values outside the known vocabulary are passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStatus {
    Running,
    Succeeded,
    Failed,
    TimedOut,
    Aborted,
    PendingRedrive,
    Other(String),
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &str {
        use ExecutionStatus::*;
        match self {
            Running => "RUNNING",
            Succeeded => "SUCCEEDED",
            Failed => "FAILED",
            TimedOut => "TIMED_OUT",
            Aborted => "ABORTED",
            PendingRedrive => "PENDING_REDRIVE",
            Other(status) => status,
        }
    }

    /// Anything that is neither still running nor succeeded counts as a failure.
    pub fn is_failure(&self) -> bool {
        !matches!(self, ExecutionStatus::Running | ExecutionStatus::Succeeded)
    }
}

impl From<&str> for ExecutionStatus {
    fn from(status: &str) -> Self {
        use ExecutionStatus::*;
        match status {
            "RUNNING" => Running,
            "SUCCEEDED" => Succeeded,
            "FAILED" => Failed,
            "TIMED_OUT" => TimedOut,
            "ABORTED" => Aborted,
            "PENDING_REDRIVE" => PendingRedrive,
            other => Other(other.to_string()),
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of describing an execution. `error` and `cause` are opaque text from Step Functions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionDescription {
    pub status: ExecutionStatus,
    pub error: Option<String>,
    pub cause: Option<String>,
}

impl ExecutionDescription {
    pub fn new(status: ExecutionStatus) -> Self {
        Self {
            status,
            error: None,
            cause: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }
}
