//! Background download of remote sources.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;

use crate::error::{AppError, AppResult};

pub(super) type FetchResult = AppResult<Arc<[u8]>>;

/// Download `url` on a worker thread. The receiver yields exactly one result;
/// dropping it abandons the download.
pub(super) fn spawn_fetch(url: String, timeout: Duration) -> Receiver<FetchResult> {
    let (tx, rx) = mpsc::channel::<FetchResult>();
    thread::spawn(move || {
        let result = fetch(&url, timeout);
        if let Err(e) = &result {
            log::warn!("fetching {url} failed: {e}");
        }
        let _ = tx.send(result);
    });
    rx
}

fn fetch(url: &str, timeout: Duration) -> FetchResult {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AppError::Fetch(e.to_string()))?;

    let response = client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .map_err(|e| AppError::Fetch(e.to_string()))?;

    let bytes = response
        .bytes()
        .map_err(|e| AppError::Fetch(e.to_string()))?;
    log::debug!("fetched {} bytes from {url}", bytes.len());
    Ok(Arc::from(bytes.as_ref()))
}
