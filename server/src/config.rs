use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Serve the pcap extractor datasource over gRPC
#[derive(Debug, Parser)]
pub struct ServerArgs {
    /// The address to listen on
    #[clap(long, env = "PCAP_EXTRACTOR_ADDR", default_value = "[::1]:50051")]
    pub addr: SocketAddr,

    /// Datasource instance settings, a JSON file with `jsonData` and `secureJsonData`
    #[clap(long, env = "PCAP_EXTRACTOR_SETTINGS", parse(from_os_str))]
    pub settings: PathBuf,

    /// PEM certificate presented to clients
    #[clap(long, env = "PCAP_EXTRACTOR_TLS_CERT", requires = "tls-key", parse(from_os_str))]
    pub tls_cert: Option<PathBuf>,

    /// PEM private key of the certificate
    #[clap(long, env = "PCAP_EXTRACTOR_TLS_KEY", requires = "tls-cert", parse(from_os_str))]
    pub tls_key: Option<PathBuf>,

    /// PEM CA that client certificates must chain to
    #[clap(long, env = "PCAP_EXTRACTOR_CLIENT_CA", requires = "tls-cert", parse(from_os_str))]
    pub client_ca: Option<PathBuf>,
}
