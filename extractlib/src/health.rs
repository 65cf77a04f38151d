use crate::clients::WorkflowClient;
use crate::datasource::Datasource;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Ok,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckHealthResult {
    pub status: HealthStatus,
    pub message: String,
}

impl CheckHealthResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Ok,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Error,
            message: message.into(),
        }
    }
}

impl Datasource {
    /// Verify the configuration, and that the state machine is reachable when a client exists.
    ///
    /// The bucket itself is never probed.
    pub async fn check_health(&self) -> CheckHealthResult {
        let settings = self.settings();
        if settings.s3_bucket.is_empty() {
            return CheckHealthResult::error("S3 Bucket name is missing");
        }
        if settings.step_function_arn.is_empty() {
            return CheckHealthResult::error("Step Function ARN is missing");
        }

        let mut messages = vec![];
        if let Some(workflow) = self.workflow() {
            if let Err(err) = workflow
                .describe_state_machine(&settings.step_function_arn)
                .await
            {
                warn!(error = %err, "Health check could not describe the state machine");
                return CheckHealthResult::error(format!("Cannot access Step Function: {}", err));
            }
            messages.push("Step Function is accessible");
        }
        messages.push("S3 Bucket access is not being tested.");

        CheckHealthResult::ok(format!("Data source is working: {}", messages.join(",")))
    }
}
