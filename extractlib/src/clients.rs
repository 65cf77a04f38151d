//! The external calls the datasource makes, narrowed down to what it needs.
//!
//! Production uses the AWS SDK implementations in [`crate::aws`]; tests substitute fakes.

use crate::error::ClientError;
use crate::status::ExecutionDescription;
use async_trait::async_trait;
use std::time::Duration;

/// Step Functions operations.
#[async_trait]
pub trait WorkflowClient: Send + Sync {
    /// Start an execution and return its ARN.
    async fn start_execution(
        &self,
        state_machine_arn: &str,
        name: &str,
        input: &str,
    ) -> Result<String, ClientError>;

    async fn describe_execution(
        &self,
        execution_arn: &str,
    ) -> Result<ExecutionDescription, ClientError>;

    /// Succeeds when the state machine exists and is readable.
    async fn describe_state_machine(&self, state_machine_arn: &str) -> Result<(), ClientError>;
}

/// Presigned object downloads.
#[async_trait]
pub trait ObjectPresigner: Send + Sync {
    async fn presign_get_object(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, ClientError>;
}
