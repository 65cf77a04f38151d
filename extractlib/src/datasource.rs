use crate::arn::Arn;
use crate::clients::{ObjectPresigner, WorkflowClient};
use crate::error::{ClientError, QueryError, Result};
use crate::frame::Frame;
use crate::query::{Action, DataQuery, QueryModel, StepFunctionInput};
use crate::settings::PluginSettings;
use crate::status::ExecutionStatus;
use crate::types::RefId;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// How long a download link stays valid.
pub const PRESIGNED_URL_TTL: Duration = Duration::from_secs(60 * 60);
pub const REQUEST_FRAME: &str = "step_function_request";
pub const STATUS_FRAME: &str = "step_function_status";

/// A configured datasource instance.
///
/// Holds no mutable state: the settings are fixed at construction and the clients are shared,
/// so one instance serves any number of concurrent queries.
pub struct Datasource {
    settings: PluginSettings,
    workflow: Option<Arc<dyn WorkflowClient>>,
    presigner: Option<Arc<dyn ObjectPresigner>>,
}

impl Datasource {
    pub fn new(
        settings: PluginSettings,
        workflow: Option<Arc<dyn WorkflowClient>>,
        presigner: Option<Arc<dyn ObjectPresigner>>,
    ) -> Self {
        Self {
            settings,
            workflow,
            presigner,
        }
    }

    /// Build an instance backed by the AWS SDK from raw instance settings.
    #[cfg(feature = "aws")]
    pub async fn from_instance_settings(
        instance: &crate::settings::InstanceSettings,
    ) -> std::result::Result<Self, crate::error::SettingsError> {
        use crate::aws::{load_sdk_config, S3Presigner, StepFunctions};
        use crate::settings::AwsSettings;

        info!("Creating new pcap-extractor datasource");
        let settings = PluginSettings::load(instance)?;
        let aws_settings = AwsSettings::load(instance)?;
        let config = load_sdk_config(&aws_settings).await;
        Ok(Self::new(
            settings,
            Some(Arc::new(StepFunctions::new(&config))),
            Some(Arc::new(S3Presigner::new(&config))),
        ))
    }

    pub fn settings(&self) -> &PluginSettings {
        &self.settings
    }

    pub(crate) fn workflow(&self) -> Option<&dyn WorkflowClient> {
        self.workflow.as_deref()
    }

    /// Run every query and key the outcomes by ref id.
    ///
    /// A failing query only fails its own entry.
    pub async fn query_data<I>(&self, queries: I) -> BTreeMap<RefId, Result<Frame>>
    where
        I: IntoIterator<Item = DataQuery>,
    {
        let mut responses = BTreeMap::new();
        for query in queries {
            let response = self.query(&query.json).await;
            responses.insert(query.ref_id, response);
        }
        responses
    }

    /// Route one JSON encoded query to its handler.
    pub async fn query(&self, json: &[u8]) -> Result<Frame> {
        self.settings.validate()?;
        let query = QueryModel::from_json(json)?;
        match query.action()? {
            Action::Request => self.handle_request(query).await,
            Action::Status => self.handle_status(query).await,
        }
    }

    async fn handle_request(&self, query: QueryModel) -> Result<Frame> {
        let QueryModel { job_id, extract, .. } = query;
        let extract = extract.unwrap_or_default();
        if extract.is_empty() {
            return Err(QueryError::MissingExtract);
        }
        if job_id.is_empty() {
            return Err(QueryError::MissingJobId(Action::Request));
        }

        info!(job_id = %job_id, extract = ?extract, "Processing request action");

        let input = StepFunctionInput {
            job_id: &job_id,
            bucket: &self.settings.s3_bucket,
            extract: &extract,
        };
        let input = serde_json::to_string(&input).map_err(QueryError::Marshal)?;

        let execution_arn = self
            .execute_step_function(&job_id, &input)
            .await
            .map_err(|err| {
                error!(error = %err, "Failed to execute Step Function");
                err
            })?;
        debug!(execution_arn = %execution_arn, "Step Function executed successfully");

        // the execution was accepted, report it as running without asking again
        Ok(Frame::new(REQUEST_FRAME)
            .with_field("status", ExecutionStatus::Running.as_str())
            .with_field("job_id", job_id))
    }

    async fn handle_status(&self, query: QueryModel) -> Result<Frame> {
        let job_id = query.job_id;
        if job_id.is_empty() {
            return Err(QueryError::MissingJobId(Action::Status));
        }

        info!(job_id = %job_id, "Processing status action");

        let state_machine: Arn = self.settings.step_function_arn.parse()?;
        let execution_arn = state_machine.execution_arn(&job_id);
        info!(arn = %execution_arn, "Trying to describe Step Function execution");

        let workflow = self.workflow().ok_or(QueryError::WorkflowClientMissing)?;
        let description = workflow
            .describe_execution(&execution_arn)
            .await
            .map_err(|err| {
                error!(error = %err, "Failed to describe Step Function execution");
                QueryError::DescribeExecution(err)
            })?;

        let status = description.status;
        info!(status = %status, execution_arn = %execution_arn, "Step Function execution status");

        let mut frame = Frame::new(STATUS_FRAME).with_field("status", status.as_str());
        if status == ExecutionStatus::Failed {
            if let Some(error) = description.error {
                frame.push_field("error", error);
            }
        }
        if status.is_failure() {
            if let Some(cause) = description.cause {
                frame.push_field("cause", cause);
            }
        }

        if status == ExecutionStatus::Succeeded {
            let key = format!("{}.pcapng", job_id);
            match self
                .generate_presigned_url(&self.settings.s3_bucket, &key)
                .await
            {
                Ok(url) => frame.push_field("download_url", url),
                Err(err) => warn!(
                    error = %err,
                    "Failed to generate presigned URL for completed execution"
                ),
            }
        }

        Ok(frame)
    }

    /// Start an execution named `name`, returning the execution ARN.
    async fn execute_step_function(&self, name: &str, input: &str) -> Result<String> {
        let workflow = self.workflow().ok_or(QueryError::WorkflowClientMissing)?;
        workflow
            .start_execution(&self.settings.step_function_arn, name, input)
            .await
            .map_err(QueryError::StartExecution)
    }

    async fn generate_presigned_url(
        &self,
        bucket: &str,
        key: &str,
    ) -> std::result::Result<String, ClientError> {
        let presigner = self
            .presigner
            .as_deref()
            .ok_or_else(|| ClientError::new("S3 presigner is not initialized"))?;
        presigner
            .presign_get_object(bucket, key, PRESIGNED_URL_TTL)
            .await
            .map_err(|err| ClientError::new(format!("failed to generate presigned URL: {}", err)))
    }
}
