//! Blocking HTTP transport for index pages, metadata documents and artifacts.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;

use reqfold_util::errors::ReqfoldError;

use crate::auth;
use crate::repository::PackageIndex;

const MAX_RETRIES: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Build a shared blocking client with the given request timeout.
pub fn build_client(timeout: Duration) -> miette::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("reqfold/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| {
            ReqfoldError::Network {
                message: format!("Failed to create HTTP client: {e}"),
            }
            .into()
        })
}

/// GET `url` with authentication and retries on connect errors, timeouts
/// and 5xx responses.
///
/// Returns `Ok(None)` for 404.
pub fn fetch_bytes(
    client: &Client,
    index: &PackageIndex,
    url: &str,
    accept: Option<&str>,
) -> miette::Result<Option<Vec<u8>>> {
    let mut last_err = String::new();

    for attempt in 0..MAX_RETRIES {
        if attempt > 0 {
            std::thread::sleep(RETRY_DELAY * attempt);
        }

        let mut req = client.get(url);
        if let Some(accept) = accept {
            req = req.header(ACCEPT, accept);
        }
        req = auth::apply_auth(req, index);

        match req.send() {
            Ok(resp) => {
                let status = resp.status();
                if status == reqwest::StatusCode::NOT_FOUND {
                    return Ok(None);
                }
                if status.is_server_error() {
                    last_err = format!("HTTP {status} from {url}");
                    continue;
                }
                if !status.is_success() {
                    return Err(ReqfoldError::Network {
                        message: format!("HTTP {status} fetching {url}"),
                    }
                    .into());
                }

                let bytes = resp.bytes().map_err(|e| ReqfoldError::Network {
                    message: format!("Failed to read response from {url}: {e}"),
                })?;
                return Ok(Some(bytes.to_vec()));
            }
            Err(e) if e.is_timeout() || e.is_connect() => {
                tracing::debug!("Attempt {} for {url} failed: {e}", attempt + 1);
                last_err = format!("{e}");
                continue;
            }
            Err(e) => {
                return Err(ReqfoldError::Network {
                    message: format!("Request to {url} failed: {e}"),
                }
                .into());
            }
        }
    }

    Err(ReqfoldError::Network {
        message: format!("Failed after {MAX_RETRIES} retries for {url}: {last_err}"),
    }
    .into())
}

/// Fetch a text document (project page, JSON release document).
pub fn fetch_text(
    client: &Client,
    index: &PackageIndex,
    url: &str,
    accept: Option<&str>,
) -> miette::Result<Option<String>> {
    match fetch_bytes(client, index, url, accept)? {
        Some(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).to_string())),
        None => Ok(None),
    }
}

/// Download an artifact (wheel, sdist) with a progress bar for large files.
pub fn download_artifact(
    client: &Client,
    index: &PackageIndex,
    url: &str,
    label: &str,
) -> miette::Result<Option<Vec<u8>>> {
    let req = auth::apply_auth(client.get(url), index);

    let resp = req.send().map_err(|e| ReqfoldError::Network {
        message: format!("Request to {url} failed: {e}"),
    })?;

    if resp.status() == reqwest::StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !resp.status().is_success() {
        return Err(ReqfoldError::Network {
            message: format!("HTTP {} fetching {url}", resp.status()),
        }
        .into());
    }

    let total = resp.content_length().unwrap_or(0);
    let pb = (total > 100_000).then(|| {
        let pb = ProgressBar::new(total);
        if let Ok(style) =
            ProgressStyle::with_template("  {msg} {bar:30.cyan/dim} {bytes}/{total_bytes}")
        {
            pb.set_style(style.progress_chars("##-"));
        }
        pb.set_message(label.to_string());
        pb
    });

    tracing::info!("Downloading {label} from {url}");
    let bytes = resp.bytes().map_err(|e| ReqfoldError::Network {
        message: format!("Failed to read {url}: {e}"),
    })?;

    if let Some(pb) = pb {
        pb.set_position(bytes.len() as u64);
        pb.finish_and_clear();
    }

    Ok(Some(bytes.to_vec()))
}
