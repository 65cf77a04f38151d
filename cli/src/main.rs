mod arg_parser;
mod client_cli;
mod download;
mod poller;

use arg_parser::{ArgParser, SubCommand};
use client_cli::ClientCli;
use extractlib::types::Extract;
use poller::{PollError, PollerHandle, DEFAULT_POLL_INTERVAL};
use protobuf::check_health_response::HealthStatus;

use clap::Parser;
use std::error;
use tonic::transport::{Certificate, ClientTlsConfig};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<(), Box<dyn error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = ArgParser::parse();

    let tls_config = match &args.ca_cert {
        Some(path) => {
            let pem = tokio::fs::read(path).await?;
            let mut tls = ClientTlsConfig::new().ca_certificate(Certificate::from_pem(pem));
            if let Some(domain) = &args.domain {
                tls = tls.domain_name(domain.clone());
            }
            Some(tls)
        }
        None => None,
    };
    let mut client = ClientCli::connect(&args.server, tls_config).await?;

    match args.sub_command {
        SubCommand::Extract {
            packets,
            job_id,
            output_dir,
            interval,
        } => {
            let job_id = job_id.unwrap_or_else(|| format!("run-{}", Uuid::new_v4()));
            let mut extract = Extract::new();
            for (file, numbers) in packets {
                extract.entry(file).or_default().extend(numbers);
            }

            let status = client.request_extraction(&job_id, extract).await?;
            println!("Started job id: {} ({})", job_id, status);

            let interval = interval.unwrap_or(DEFAULT_POLL_INTERVAL);
            let mut poller = PollerHandle::spawn(client, job_id.clone(), interval);
            let url = tokio::select! {
                result = poller.wait() => result?,
                _ = tokio::signal::ctrl_c() => return Err(PollError::Cancelled.into()),
            };

            let dest = download::archive_path(&output_dir, &job_id);
            let bytes = download::download_archive(&url, &dest).await?;
            println!("Saved {} ({} bytes)", dest.display(), bytes);
        }
        SubCommand::Status { job_id } => {
            let report = client.query_status(&job_id).await?;
            println!("Status: {}", report.status);
            if let Some(error) = report.error {
                println!("Error: {}", error);
            }
            if let Some(cause) = report.cause {
                println!("Cause: {}", cause);
            }
            if let Some(url) = report.download_url {
                println!("Download URL: {}", url);
            }
        }
        SubCommand::Health => {
            let (status, message) = client.check_health().await?;
            let status = match status {
                HealthStatus::Ok => "OK",
                HealthStatus::Error => "ERROR",
                HealthStatus::Unknown => "UNKNOWN",
            };
            println!("{}: {}", status, message);
        }
    }

    Ok(())
}
