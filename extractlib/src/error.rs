use crate::arn::ArnError;
use crate::query::Action;
use std::result;
use thiserror;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("failed to load plugin settings: {0}")]
    Load(String),
    #[error("Step Function ARN not configured")]
    MissingStepFunctionArn,
    #[error("S3 Bucket name not configured")]
    MissingS3Bucket,
}

/// An error returned by one of the external AWS calls.
///
/// Only the rendered message survives, that is all the datasource ever surfaces.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ClientError {
    message: String,
}

impl ClientError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Reasons a single query fails. Every variant is answered as a bad request.
#[derive(thiserror::Error, Debug)]
pub enum QueryError {
    #[error("Incomplete plugin settings: {0}")]
    Settings(#[from] SettingsError),
    #[error("json unmarshal: {0}")]
    Json(serde_json::Error),
    #[error("unknown action: '{0}'")]
    UnknownAction(String),
    #[error("Extract parameter is required for request action")]
    MissingExtract,
    #[error("JobId is required for {0} action")]
    MissingJobId(Action),
    #[error("failed to marshal Step Function input: {0}")]
    Marshal(serde_json::Error),
    #[error("Step Functions client is not initialized")]
    WorkflowClientMissing,
    #[error("Step Function execution failed: failed to execute Step Function execution: {0}")]
    StartExecution(ClientError),
    #[error("Failed to parse Step Function ARN: {0}")]
    Arn(#[from] ArnError),
    #[error("Failed to get execution status: {0}")]
    DescribeExecution(ClientError),
}

pub type Result<T> = result::Result<T, QueryError>;
