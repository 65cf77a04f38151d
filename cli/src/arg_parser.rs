use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// Connect to a pcap extractor datasource
#[derive(Debug, Parser)]
pub struct ArgParser {
    /// The address of the server, e.g. http://[::1]:50051
    #[clap(short = 's', long = "server", env = "PCAP_EXTRACTOR_SERVER")]
    pub server: String,
    /// PEM CA certificate to verify the server with, enables TLS
    #[clap(long = "ca-cert", parse(from_os_str))]
    pub ca_cert: Option<PathBuf>,
    /// Domain name expected in the server certificate
    #[clap(long = "domain", requires = "ca-cert")]
    pub domain: Option<String>,
    /// The sub-command to use
    #[clap(subcommand)]
    pub sub_command: SubCommand,
}

#[derive(Clone, Debug, PartialEq, Eq, Subcommand)]
pub enum SubCommand {
    /// extract packets and download the resulting archive
    Extract {
        #[clap(
            short = 'p',
            long = "packets",
            required = true,
            multiple_occurrences = true,
            parse(try_from_str = file_eq_packets)
        )]
        /// packets to extract from one capture, as FILE=N,N,...
        packets: Vec<(String, Vec<i64>)>,

        #[clap(long)]
        /// job id, generated when omitted
        job_id: Option<String>,

        #[clap(long, default_value = ".", parse(from_os_str))]
        /// directory the archive is saved in
        output_dir: PathBuf,

        #[clap(long, parse(try_from_str = seconds))]
        /// seconds between status polls [default: 10]
        interval: Option<Duration>,
    },
    /// get a job's status
    Status {
        /// job id given when the extraction was requested
        job_id: String,
    },
    /// check the datasource's configuration
    Health,
}

/// try_from_str parse function for packet selections
fn file_eq_packets(s: &str) -> Result<(String, Vec<i64>), String> {
    let (file, packets) = s
        .split_once('=')
        .ok_or_else(|| "Required format is FILE=N,N,...".to_string())?;
    if file.is_empty() {
        return Err("Missing file name".to_string());
    }
    let packets = packets
        .split(',')
        .map(str::trim)
        .map(|n| {
            n.parse::<i64>()
                .map_err(|err| format!("Invalid packet number '{}': {}", n, err))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok((file.to_string(), packets))
}

/// try_from_str parse function for poll intervals
fn seconds(s: &str) -> Result<Duration, String> {
    match s.parse::<u64>() {
        Ok(0) => Err("Interval must be at least one second".to_string()),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(err) => Err(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_args() {
        ArgParser::command().debug_assert();
    }

    #[test]
    fn domain_needs_ca_cert() {
        assert!(ArgParser::try_parse_from([
            "cli",
            "--server",
            "http://[::1]:50051",
            "--domain",
            "localhost",
            "health",
        ])
        .is_err());

        let args = ArgParser::try_parse_from([
            "cli",
            "--server",
            "http://[::1]:50051",
            "--ca-cert",
            "ca.cert",
            "--domain",
            "localhost",
            "health",
        ])
        .unwrap();
        assert_eq!(args.domain.as_deref(), Some("localhost"));
    }

    #[test]
    fn parses_packet_selection() {
        assert_eq!(
            file_eq_packets("capture.pcap=1, 2,30"),
            Ok(("capture.pcap".to_string(), vec![1, 2, 30]))
        );
        assert!(file_eq_packets("capture.pcap").is_err());
        assert!(file_eq_packets("=1,2").is_err());
        assert!(file_eq_packets("capture.pcap=1,x").is_err());
        assert!(file_eq_packets("capture.pcap=").is_err());
    }

    #[test]
    fn parses_extract_command() {
        let args = ArgParser::try_parse_from([
            "cli",
            "--server",
            "http://[::1]:50051",
            "extract",
            "-p",
            "a.pcap=1,2",
            "-p",
            "b.pcap=3",
            "--job-id",
            "job-1",
        ])
        .unwrap();
        assert_eq!(
            args.sub_command,
            SubCommand::Extract {
                packets: vec![
                    ("a.pcap".to_string(), vec![1, 2]),
                    ("b.pcap".to_string(), vec![3])
                ],
                job_id: Some("job-1".to_string()),
                output_dir: PathBuf::from("."),
                interval: None,
            }
        );
    }

    #[test]
    fn parses_interval() {
        let args = ArgParser::try_parse_from([
            "cli",
            "--server",
            "http://[::1]:50051",
            "extract",
            "-p",
            "a.pcap=1",
            "--interval",
            "3",
        ])
        .unwrap();
        match args.sub_command {
            SubCommand::Extract { interval, .. } => {
                assert_eq!(interval, Some(Duration::from_secs(3)))
            }
            other => panic!("unexpected sub-command {:?}", other),
        }
    }

    #[test]
    fn rejects_zero_interval() {
        assert!(seconds("0").is_err());
        assert_eq!(seconds("3"), Ok(Duration::from_secs(3)));
    }
}
