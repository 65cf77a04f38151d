use extractlib::error::QueryError;
use extractlib::{Datasource, Frame, HealthStatus};
use protobuf::check_health_response;
use protobuf::pcap_extractor_server::PcapExtractor;
use protobuf::{
    CheckHealthRequest, CheckHealthResponse, DataResponse, Field, QueryDataRequest,
    QueryDataResponse,
};
use std::sync::Arc;
use tonic::{Request, Response, Status};
use tracing::debug;

pub const STATUS_OK: i32 = 200;
pub const STATUS_BAD_REQUEST: i32 = 400;

/// Serves one datasource instance.
///
/// Query failures are reported per ref id inside the response, never as a gRPC error.
pub struct DatasourceService {
    datasource: Arc<Datasource>,
}

impl DatasourceService {
    pub fn new(datasource: Arc<Datasource>) -> Self {
        Self { datasource }
    }
}

fn frame_to_proto(frame: Frame) -> protobuf::Frame {
    protobuf::Frame {
        name: frame.name,
        fields: frame
            .fields
            .into_iter()
            .map(|field| Field {
                name: field.name,
                values: field.values,
            })
            .collect(),
    }
}

fn to_data_response(result: Result<Frame, QueryError>) -> DataResponse {
    match result {
        Ok(frame) => DataResponse {
            frames: vec![frame_to_proto(frame)],
            error: String::new(),
            status: STATUS_OK,
        },
        Err(err) => DataResponse {
            frames: vec![],
            error: err.to_string(),
            status: STATUS_BAD_REQUEST,
        },
    }
}

#[tonic::async_trait]
impl PcapExtractor for DatasourceService {
    async fn query_data(
        &self,
        req: Request<QueryDataRequest>,
    ) -> Result<Response<QueryDataResponse>, Status> {
        let queries = req.into_inner().queries;
        debug!(queries = queries.len(), "QueryData");

        let queries = queries.into_iter().map(|query| extractlib::DataQuery {
            ref_id: query.ref_id,
            json: query.json,
        });
        let responses = self
            .datasource
            .query_data(queries)
            .await
            .into_iter()
            .map(|(ref_id, result)| (ref_id, to_data_response(result)))
            .collect();

        Ok(Response::new(QueryDataResponse { responses }))
    }

    async fn check_health(
        &self,
        _req: Request<CheckHealthRequest>,
    ) -> Result<Response<CheckHealthResponse>, Status> {
        let result = self.datasource.check_health().await;
        debug!(status = ?result.status, message = %result.message, "CheckHealth");

        let status = match result.status {
            HealthStatus::Ok => check_health_response::HealthStatus::Ok,
            HealthStatus::Error => check_health_response::HealthStatus::Error,
        };
        Ok(Response::new(CheckHealthResponse {
            status: status.into(),
            message: result.message,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use extractlib::settings::PluginSettings;
    use extractlib::testing::FakeWorkflow;
    use extractlib::{ExecutionDescription, ExecutionStatus, QueryModel};
    use protobuf::DataQuery;

    const ARN: &str = "arn:aws:states:us-east-1:123456789012:stateMachine:test-state-machine";

    fn service(bucket: &str) -> DatasourceService {
        let workflow = Arc::new(FakeWorkflow::describing(
            ExecutionDescription::new(ExecutionStatus::Failed)
                .with_error("Task failed")
                .with_cause("Network timeout"),
        ));
        DatasourceService::new(Arc::new(Datasource::new(
            PluginSettings::new(ARN, bucket),
            Some(workflow),
            None,
        )))
    }

    #[tokio::test]
    async fn answers_each_ref_id() {
        let request = Request::new(QueryDataRequest {
            queries: vec![
                DataQuery {
                    ref_id: "A".into(),
                    json: QueryModel::status("test-job-123").to_json(),
                },
                DataQuery {
                    ref_id: "B".into(),
                    json: b"invalid json".to_vec(),
                },
            ],
        });
        let responses = service("test-bucket")
            .query_data(request)
            .await
            .unwrap()
            .into_inner()
            .responses;

        let ok = &responses["A"];
        assert_eq!(ok.status, STATUS_OK);
        assert!(ok.error.is_empty());
        let frame = &ok.frames[0];
        assert_eq!(frame.name, "step_function_status");
        let fields: Vec<(&str, &str)> = frame
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.values[0].as_str()))
            .collect();
        assert_eq!(
            fields,
            vec![
                ("status", "FAILED"),
                ("error", "Task failed"),
                ("cause", "Network timeout")
            ]
        );

        let bad = &responses["B"];
        assert_eq!(bad.status, STATUS_BAD_REQUEST);
        assert!(bad.frames.is_empty());
        assert!(bad.error.starts_with("json unmarshal"));
    }

    #[tokio::test]
    async fn reports_health() {
        let healthy = service("test-bucket")
            .check_health(Request::new(CheckHealthRequest {}))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(healthy.status(), check_health_response::HealthStatus::Ok);

        let unhealthy = service("")
            .check_health(Request::new(CheckHealthRequest {}))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(unhealthy.status(), check_health_response::HealthStatus::Error);
        assert_eq!(unhealthy.message, "S3 Bucket name is missing");
    }
}
