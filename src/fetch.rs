use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::{Client, Response};
use tempfile::NamedTempFile;
use tracing::{debug, info};

pub fn client() -> Result<Client> {
    Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")
}

/// Download `url` into a fresh temporary file in `dir`, named with `extension`.
///
/// The file is removed when the returned handle is dropped, so every exit
/// path cleans up after itself.
pub async fn download(
    client: &Client,
    url: &str,
    extension: &str,
    dir: &Path,
) -> Result<NamedTempFile> {
    info!("Fetching dataset: {}", url);
    let mut response = client
        .get(url)
        .send()
        .await
        .and_then(Response::error_for_status)
        .with_context(|| format!("Failed to fetch {url}"))?;

    let mut file = tempfile::Builder::new()
        .prefix("alar-")
        .suffix(extension)
        .tempfile_in(dir)
        .context("Failed to create temporary file")?;
    debug!("Writing download to {}", file.path().display());

    let pb = progress_bar(response.content_length())?;
    let mut written = 0u64;
    while let Some(chunk) = response
        .chunk()
        .await
        .with_context(|| format!("Failed to read response body from {url}"))?
    {
        file.write_all(&chunk).context("Failed to write temporary file")?;
        written += chunk.len() as u64;
        pb.inc(chunk.len() as u64);
    }
    file.flush().context("Failed to write temporary file")?;
    pb.finish_and_clear();

    info!("Downloaded {} bytes", written);
    Ok(file)
}

fn progress_bar(len: Option<u64>) -> Result<ProgressBar> {
    let pb = match len {
        Some(len) => {
            let pb = ProgressBar::new(len);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "[{elapsed_precise}] {bar:40} {bytes}/{total_bytes} ({bytes_per_sec}, eta {eta})",
                    )?
                    .progress_chars("=> "),
            );
            pb
        }
        None => {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner} [{elapsed_precise}] {bytes} ({bytes_per_sec})")?,
            );
            pb
        }
    };
    Ok(pb)
}
