//! AWS SDK implementations of the client traits.

use crate::clients::{ObjectPresigner, WorkflowClient};
use crate::error::ClientError;
use crate::settings::AwsSettings;
use crate::status::{ExecutionDescription, ExecutionStatus};
use async_trait::async_trait;
use aws_config::sts::AssumeRoleProvider;
use aws_config::{BehaviorVersion, ConfigLoader, Region, SdkConfig};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_sfn::config::Credentials;
use aws_sdk_sfn::error::DisplayErrorContext;
use std::time::Duration;
use tracing::debug;

const CREDENTIALS_PROVIDER: &str = "pcap-extractor";

/// Resolve the shared SDK config from the instance's AWS settings.
///
/// With an assume-role ARN configured, the credentials resolved from the other settings are
/// only used to assume that role.
pub async fn load_sdk_config(settings: &AwsSettings) -> SdkConfig {
    let mut loader = config_loader(settings);
    if let Some((access_key, secret_key)) = settings.static_credentials() {
        debug!("Using static AWS credentials from secure settings");
        loader = loader.credentials_provider(Credentials::new(
            access_key,
            secret_key,
            None,
            None,
            CREDENTIALS_PROVIDER,
        ));
    }
    let base = loader.load().await;

    let role_arn = match &settings.assume_role_arn {
        Some(role_arn) => role_arn,
        None => return base,
    };
    debug!(role_arn = %role_arn, "Assuming AWS role");
    let mut role = AssumeRoleProvider::builder(role_arn).session_name(CREDENTIALS_PROVIDER);
    if let Some(external_id) = &settings.external_id {
        role = role.external_id(external_id);
    }
    let role = role.configure(&base).build().await;
    config_loader(settings)
        .credentials_provider(role)
        .load()
        .await
}

fn config_loader(settings: &AwsSettings) -> ConfigLoader {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = &settings.region {
        loader = loader.region(Region::new(region.clone()));
    }
    if let Some(profile) = &settings.profile {
        loader = loader.profile_name(profile);
    }
    if let Some(endpoint) = &settings.endpoint {
        loader = loader.endpoint_url(endpoint);
    }
    loader
}

fn client_error<E: std::error::Error>(err: E) -> ClientError {
    ClientError::new(DisplayErrorContext(&err).to_string())
}

pub struct StepFunctions {
    client: aws_sdk_sfn::Client,
}

impl StepFunctions {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_sfn::Client::new(config),
        }
    }
}

#[async_trait]
impl WorkflowClient for StepFunctions {
    async fn start_execution(
        &self,
        state_machine_arn: &str,
        name: &str,
        input: &str,
    ) -> Result<String, ClientError> {
        let output = self
            .client
            .start_execution()
            .state_machine_arn(state_machine_arn)
            .name(name)
            .input(input)
            .send()
            .await
            .map_err(client_error)?;
        Ok(output.execution_arn().to_string())
    }

    async fn describe_execution(
        &self,
        execution_arn: &str,
    ) -> Result<ExecutionDescription, ClientError> {
        let output = self
            .client
            .describe_execution()
            .execution_arn(execution_arn)
            .send()
            .await
            .map_err(client_error)?;
        Ok(ExecutionDescription {
            status: ExecutionStatus::from(output.status().as_str()),
            error: output.error().map(str::to_string),
            cause: output.cause().map(str::to_string),
        })
    }

    async fn describe_state_machine(&self, state_machine_arn: &str) -> Result<(), ClientError> {
        self.client
            .describe_state_machine()
            .state_machine_arn(state_machine_arn)
            .send()
            .await
            .map_err(client_error)?;
        Ok(())
    }
}

pub struct S3Presigner {
    client: aws_sdk_s3::Client,
}

impl S3Presigner {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_s3::Client::new(config),
        }
    }
}

#[async_trait]
impl ObjectPresigner for S3Presigner {
    async fn presign_get_object(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, ClientError> {
        let presigning = PresigningConfig::expires_in(expires_in).map_err(client_error)?;
        let request = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(client_error)?;
        Ok(request.uri().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> AwsSettings {
        AwsSettings {
            region: Some("eu-west-1".into()),
            access_key: Some("AKIA".into()),
            secret_key: Some("secret".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn static_credentials_config() {
        let config = load_sdk_config(&settings()).await;
        assert_eq!(config.region().map(|r| r.as_ref()), Some("eu-west-1"));
        assert!(config.credentials_provider().is_some());
    }

    #[tokio::test]
    async fn assume_role_config_keeps_region() {
        let config = load_sdk_config(&AwsSettings {
            assume_role_arn: Some("arn:aws:iam::123456789012:role/extractor".into()),
            external_id: Some("grafana-1".into()),
            ..settings()
        })
        .await;
        assert_eq!(config.region().map(|r| r.as_ref()), Some("eu-west-1"));
        assert!(config.credentials_provider().is_some());
    }
}
