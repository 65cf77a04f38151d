use crate::ServeError;
use std::path::Path;
use tonic::transport::{Certificate, Identity, ServerTlsConfig};

/// Load the server identity, and the client CA when client certificates are required.
///
/// A read failure names the file that could not be read.
pub async fn load_tls_config(
    cert: &Path,
    key: &Path,
    client_ca: Option<&Path>,
) -> Result<ServerTlsConfig, ServeError> {
    let cert = read_pem(cert).await?;
    let key = read_pem(key).await?;
    let mut tls_config = ServerTlsConfig::new().identity(Identity::from_pem(cert, key));

    if let Some(client_ca) = client_ca {
        let ca_cert = read_pem(client_ca).await?;
        tls_config = tls_config.client_ca_root(Certificate::from_pem(ca_cert));
    }
    Ok(tls_config)
}

async fn read_pem(path: &Path) -> Result<Vec<u8>, ServeError> {
    tokio::fs::read(path).await.map_err(|source| ServeError::Read {
        path: path.to_path_buf(),
        source,
    })
}
