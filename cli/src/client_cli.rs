use extractlib::types::Extract;
use extractlib::{ExecutionStatus, Frame, QueryModel};
use protobuf::check_health_response::HealthStatus;
use protobuf::pcap_extractor_client::PcapExtractorClient;
use protobuf::{CheckHealthRequest, DataQuery, QueryDataRequest};
use tonic::transport::{Channel, ClientTlsConfig};
use tracing::debug;

const REF_ID: &str = "A";

#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("invalid server address: {0}")]
    InvalidAddress(String),
    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),
    #[error("rpc failed: {0}")]
    Rpc(#[from] tonic::Status),
    /// The datasource rejected the query.
    #[error("{message}")]
    Query { status: i32, message: String },
    #[error("server sent no frame for the query")]
    EmptyResponse,
}

/// What a status query reported about an extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub status: ExecutionStatus,
    pub error: Option<String>,
    pub cause: Option<String>,
    pub download_url: Option<String>,
}

impl From<&Frame> for StatusReport {
    fn from(frame: &Frame) -> Self {
        let value = |name| frame.value(name).map(str::to_string);
        Self {
            status: ExecutionStatus::from(frame.value("status").unwrap_or_default()),
            error: value("error"),
            cause: value("cause"),
            download_url: value("download_url"),
        }
    }
}

#[derive(Clone)]
pub struct ClientCli {
    inner: PcapExtractorClient<Channel>,
}

impl ClientCli {
    pub async fn connect(
        server_addr: &str,
        tls_config: Option<ClientTlsConfig>,
    ) -> Result<Self, ClientError> {
        let mut endpoint = Channel::from_shared(server_addr.to_string())
            .map_err(|err| ClientError::InvalidAddress(err.to_string()))?;
        if let Some(tls_config) = tls_config {
            endpoint = endpoint.tls_config(tls_config)?;
        }
        let channel = endpoint.connect().await?;
        Ok(Self {
            inner: PcapExtractorClient::new(channel),
        })
    }

    /// Ask the datasource to start extracting.
    pub async fn request_extraction(
        &mut self,
        job_id: &str,
        extract: Extract,
    ) -> Result<ExecutionStatus, ClientError> {
        let frame = self.query(QueryModel::request(job_id, extract)).await?;
        Ok(ExecutionStatus::from(frame.value("status").unwrap_or_default()))
    }

    pub async fn query_status(&mut self, job_id: &str) -> Result<StatusReport, ClientError> {
        let frame = self.query(QueryModel::status(job_id)).await?;
        Ok(StatusReport::from(&frame))
    }

    pub async fn check_health(&mut self) -> Result<(HealthStatus, String), ClientError> {
        let response = self
            .inner
            .check_health(tonic::Request::new(CheckHealthRequest {}))
            .await?
            .into_inner();
        Ok((response.status(), response.message))
    }

    /// Send a single query and unpack its frame.
    async fn query(&mut self, query: QueryModel) -> Result<Frame, ClientError> {
        debug!(action = %query.action, job_id = %query.job_id, "Sending query");
        let request = tonic::Request::new(QueryDataRequest {
            queries: vec![DataQuery {
                ref_id: REF_ID.to_string(),
                json: query.to_json(),
            }],
        });
        let mut responses = self.inner.query_data(request).await?.into_inner().responses;
        let response = responses.remove(REF_ID).ok_or(ClientError::EmptyResponse)?;
        if !response.error.is_empty() {
            return Err(ClientError::Query {
                status: response.status,
                message: response.error,
            });
        }
        let frame = response
            .frames
            .into_iter()
            .next()
            .ok_or(ClientError::EmptyResponse)?;

        let mut converted = Frame::new(frame.name);
        converted.fields = frame
            .fields
            .into_iter()
            .map(|field| extractlib::Field {
                name: field.name,
                values: field.values,
            })
            .collect();
        Ok(converted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_status_frame() {
        let frame = Frame::new("step_function_status")
            .with_field("status", "FAILED")
            .with_field("error", "Task failed")
            .with_field("cause", "Network timeout");
        assert_eq!(
            StatusReport::from(&frame),
            StatusReport {
                status: ExecutionStatus::Failed,
                error: Some("Task failed".into()),
                cause: Some("Network timeout".into()),
                download_url: None,
            }
        );
    }

    #[test]
    fn missing_status_is_not_running() {
        let report = StatusReport::from(&Frame::new("step_function_status"));
        assert!(report.status.is_failure());
    }
}
