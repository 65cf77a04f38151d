use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::info;

#[derive(thiserror::Error, Debug)]
pub enum DownloadError {
    #[error("download request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("download refused with status {0}")]
    Status(reqwest::StatusCode),
    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// Where the archive of `job_id` is saved.
pub fn archive_path(output_dir: &Path, job_id: &str) -> PathBuf {
    output_dir.join(format!("{}.pcapng", job_id))
}

/// Stream `url` into `dest`, returning the number of bytes written.
pub async fn download_archive(url: &str, dest: &Path) -> Result<u64, DownloadError> {
    let mut response = reqwest::get(url).await?;
    if !response.status().is_success() {
        return Err(DownloadError::Status(response.status()));
    }

    let write_err = |source| DownloadError::Write {
        path: dest.to_path_buf(),
        source,
    };
    let mut file = File::create(dest).await.map_err(write_err)?;
    let mut written = 0u64;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await.map_err(write_err)?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(write_err)?;

    info!(path = %dest.display(), bytes = written, "Archive downloaded");
    Ok(written)
}
