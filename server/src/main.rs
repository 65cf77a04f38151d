mod config;
mod services;
mod tls;

use clap::Parser;
use config::ServerArgs;
use extractlib::error::SettingsError;
use extractlib::settings::InstanceSettings;
use extractlib::Datasource;
use protobuf::pcap_extractor_server::PcapExtractorServer;
use services::datasource::DatasourceService;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::{Server, ServerTlsConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(thiserror::Error, Debug)]
pub enum ServeError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("failed to bind {addr}: {source}")]
    Bind { addr: SocketAddr, source: io::Error },
    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = ServerArgs::parse();

    let instance = read_instance_settings(&args.settings).await?;
    let datasource = Datasource::from_instance_settings(&instance).await?;

    let tls_config = match (&args.tls_cert, &args.tls_key) {
        (Some(cert), Some(key)) => Some(
            tls::load_tls_config(cert, key, args.client_ca.as_deref()).await?,
        ),
        _ => None,
    };

    let listener = TcpListener::bind(args.addr)
        .await
        .map_err(|source| ServeError::Bind {
            addr: args.addr,
            source,
        })?;
    info!(addr = %args.addr, tls = tls_config.is_some(), "Listening");

    serve(listener, datasource, tls_config, shutdown_signal()).await?;

    Ok(())
}

async fn shutdown_signal() {
    shutdown_on(tokio::signal::ctrl_c()).await
}

/// Resolves with `signal`, right away if the signal handler could not be installed.
async fn shutdown_on<F>(signal: F)
where
    F: Future<Output = io::Result<()>>,
{
    match signal.await {
        Ok(()) => info!("Shutting down"),
        Err(err) => error!(error = %err, "Failed to listen for ctrl-c, shutting down"),
    }
}

async fn read_instance_settings(path: &Path) -> Result<InstanceSettings, ServeError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| ServeError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(InstanceSettings::from_json(&bytes)?)
}

async fn serve<F>(
    listener: TcpListener,
    datasource: Datasource,
    tls_config: Option<ServerTlsConfig>,
    shutdown: F,
) -> Result<(), ServeError>
where
    F: Future<Output = ()>,
{
    let service = PcapExtractorServer::new(DatasourceService::new(Arc::new(datasource)));

    let mut builder = Server::builder();
    if let Some(tls_config) = tls_config {
        builder = builder.tls_config(tls_config)?;
    }
    builder
        .add_service(service)
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use extractlib::settings::PluginSettings;
    use extractlib::testing::{FakePresigner, FakeWorkflow};
    use extractlib::types::Extract;
    use extractlib::{ExecutionDescription, ExecutionStatus, QueryModel};
    use protobuf::check_health_response::HealthStatus;
    use protobuf::pcap_extractor_client::PcapExtractorClient;
    use protobuf::{CheckHealthRequest, DataQuery, QueryDataRequest};
    use tonic::transport::Channel;
    use tracing_test::traced_test;

    const ARN: &str = "arn:aws:states:us-east-1:123456789012:stateMachine:test-state-machine";

    // start the server on an ephemeral port and connect a client to it
    async fn start_server(workflow: FakeWorkflow) -> PcapExtractorClient<Channel> {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let datasource = Datasource::new(
            PluginSettings::new(ARN, "test-bucket"),
            Some(Arc::new(workflow)),
            Some(Arc::new(FakePresigner::default())),
        );
        tokio::spawn(async move {
            let _ = serve(listener, datasource, None, std::future::pending()).await;
        });

        PcapExtractorClient::connect(format!("http://{}", addr))
            .await
            .expect("channel connect")
    }

    #[tokio::test]
    async fn request_then_status() {
        let workflow = FakeWorkflow::describing(ExecutionDescription::new(
            ExecutionStatus::Succeeded,
        ));
        let mut client = start_server(workflow).await;

        let extract = Extract::from([("file1.pcap".to_string(), vec![1, 2, 3])]);
        let response = client
            .query_data(QueryDataRequest {
                queries: vec![
                    DataQuery {
                        ref_id: "request".into(),
                        json: QueryModel::request("test-job-123", extract).to_json(),
                    },
                    DataQuery {
                        ref_id: "status".into(),
                        json: QueryModel::status("test-job-123").to_json(),
                    },
                ],
            })
            .await
            .expect("query data")
            .into_inner();

        let request = &response.responses["request"];
        assert_eq!(request.status, 200);
        assert_eq!(request.frames[0].name, "step_function_request");
        assert_eq!(request.frames[0].fields[0].values, vec!["RUNNING"]);
        assert_eq!(request.frames[0].fields[1].values, vec!["test-job-123"]);

        let status = &response.responses["status"];
        let fields = &status.frames[0].fields;
        assert_eq!(fields[0].values, vec!["SUCCEEDED"]);
        assert_eq!(fields[1].name, "download_url");
        assert_eq!(
            fields[1].values,
            vec!["https://test-bucket.s3.amazonaws.com/test-job-123.pcapng?presigned=true"]
        );
    }

    #[tokio::test]
    async fn health_over_the_wire() {
        let mut client = start_server(FakeWorkflow::default()).await;
        let response = client
            .check_health(CheckHealthRequest {})
            .await
            .expect("check health")
            .into_inner();
        assert_eq!(response.status(), HealthStatus::Ok);
        assert!(response.message.starts_with("Data source is working"));
    }

    #[tokio::test]
    #[traced_test]
    async fn logs_failed_signal_handler() {
        shutdown_on(async { Err(io::Error::new(io::ErrorKind::Other, "no signal driver")) }).await;
        assert!(logs_contain("Failed to listen for ctrl-c"));
        assert!(logs_contain("no signal driver"));
    }

    #[tokio::test]
    async fn reads_instance_settings_file() {
        let path = std::env::temp_dir().join(format!("pcap-extractor-{}.json", std::process::id()));
        tokio::fs::write(
            &path,
            br#"{"jsonData": {"stepFunctionArn": "arn:aws:states:us-east-1:123456789012:stateMachine:test", "s3Bucket": "test-bucket"}}"#,
        )
        .await
        .unwrap();

        let instance = read_instance_settings(&path).await.unwrap();
        let settings = PluginSettings::load(&instance).unwrap();
        assert_eq!(settings.s3_bucket, "test-bucket");
        let _ = tokio::fs::remove_file(&path).await;

        let err = read_instance_settings(&path).await.unwrap_err();
        assert!(matches!(err, ServeError::Read { .. }));
    }
}
