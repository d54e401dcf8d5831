//! Archive acquisition over HTTP.
//!
//! A download is attempted only after a `HEAD` request confirms the archive
//! exists. The body is streamed into a `.part` file beside the destination
//! and renamed into place once complete, so the archive path either holds a
//! full download or nothing.

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;

use super::distribution::DistributionLocator;
use super::paths::PhpvmPaths;
use super::platform::Platform;
use crate::errors::{PhpvmError, Result};

/// Request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 300;

/// Minimum interval between progress updates in milliseconds.
const CLI_PROGRESS_INTERVAL_MS: u128 = 250;

/// Downloads the archive for `version` into its version directory.
///
/// # Process
///
/// 1. Resolve the URL for `platform`
/// 2. Probe it with `HEAD`
/// 3. Create `versions/<version>/`
/// 4. Stream the body to `versions/<version>/php-<version>.tar.gz`
///
/// # Errors
///
/// - `NoDirectDownload` if the platform has no archive
/// - `BinaryNotAvailable` if the probe fails or is not a success
/// - `Download` if the transfer fails; no partial file is left behind
/// - `Io` if the destination cannot be written
pub async fn acquire(
    locator: &DistributionLocator,
    paths: &PhpvmPaths,
    version: &str,
    platform: Platform,
) -> Result<PathBuf> {
    let url = locator
        .download_url(platform, version)
        .ok_or(PhpvmError::NoDirectDownload { platform })?;

    let client = http_client().map_err(|e| PhpvmError::download(&url, e))?;

    let available = client
        .head(&url)
        .send()
        .await
        .is_ok_and(|response| response.status().is_success());
    if !available {
        return Err(PhpvmError::BinaryNotAvailable {
            url,
            platform,
            version: version.to_string(),
        });
    }

    let dest = paths.archive_path(version);
    tracing::info!(url = %url, dest = %dest.display(), "downloading PHP archive");
    download_file(&client, &url, &dest).await?;
    Ok(dest)
}

fn http_client() -> std::result::Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .user_agent(concat!("phpvm/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Downloads `url` to `dest` through a sibling `.part` file.
///
/// # Errors
///
/// Returns `Download` for transport or HTTP failures and `Io` for local
/// filesystem failures.
pub async fn download_file(client: &reqwest::Client, url: &str, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            PhpvmError::io(format!("failed to create directory {}", parent.display()), e)
        })?;
    }

    let temp_path = part_path(dest);
    if let Err(e) = download_with_progress(client, url, &temp_path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e);
    }

    tokio::fs::rename(&temp_path, dest).await.map_err(|e| {
        PhpvmError::io(
            format!(
                "failed to rename {} to {}",
                temp_path.display(),
                dest.display()
            ),
            e,
        )
    })
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = OsString::from(dest.as_os_str());
    name.push(".part");
    PathBuf::from(name)
}

async fn download_with_progress(client: &reqwest::Client, url: &str, dest: &Path) -> Result<()> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| PhpvmError::download(url, e))?;

    if !response.status().is_success() {
        return Err(PhpvmError::download_status(url, response.status()));
    }

    let total_size = response.content_length().unwrap_or(0);

    let mut file = tokio::fs::File::create(dest).await.map_err(|e| {
        PhpvmError::io(format!("failed to create file {}", dest.display()), e)
    })?;

    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;
    let start_time = Instant::now();
    let mut last_update = Instant::now();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| PhpvmError::download(url, e))?;
        file.write_all(&chunk)
            .await
            .map_err(|e| PhpvmError::io(format!("failed to write to {}", dest.display()), e))?;
        downloaded += chunk.len() as u64;

        let now = Instant::now();
        if now.duration_since(last_update).as_millis() >= CLI_PROGRESS_INTERVAL_MS {
            print_progress(downloaded, total_size, start_time.elapsed().as_secs_f64());
            last_update = now;
        }
    }

    file.flush()
        .await
        .map_err(|e| PhpvmError::io(format!("failed to flush {}", dest.display()), e))?;

    print_progress(downloaded, total_size, start_time.elapsed().as_secs_f64());
    println!();

    Ok(())
}

/// Prints a simple text-based progress line.
#[allow(clippy::cast_precision_loss)]
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
fn print_progress(downloaded: u64, total: u64, elapsed_secs: f64) {
    let percent = if total > 0 {
        (downloaded as f64 / total as f64 * 100.0) as u8
    } else {
        0
    };
    let speed = if elapsed_secs > 0.0 {
        downloaded as f64 / elapsed_secs
    } else {
        0.0
    };

    print!(
        "\r{}/{} ({percent}%) {}     ",
        format_bytes(downloaded),
        format_bytes(total),
        format_speed(speed)
    );
    let _ = std::io::stdout().flush();
}

/// Formats bytes into a human-readable string (KB, MB, GB).
fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    #[allow(clippy::cast_precision_loss)]
    let bytes_f = bytes as f64;

    if bytes_f >= GB {
        format!("{:.2} GB", bytes_f / GB)
    } else if bytes_f >= MB {
        format!("{:.2} MB", bytes_f / MB)
    } else if bytes_f >= KB {
        format!("{:.2} KB", bytes_f / KB)
    } else {
        format!("{bytes} B")
    }
}

/// Formats speed (bytes/sec) into a human-readable string.
fn format_speed(speed: f64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;

    if speed >= MB {
        format!("{:.2} MB/s", speed / MB)
    } else if speed >= KB {
        format!("{:.2} KB/s", speed / KB)
    } else {
        format!("{speed:.0} B/s")
    }
}
