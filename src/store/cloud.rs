use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::config::CloudSettings;
use crate::error::{AppError, AppResult};
use crate::library::{CloudRecord, now_millis};

/// Subscription side of the shared feed: incremental "added" notifications.
pub trait CloudFeed {
    /// Records added since the previous call, in insertion order. Each record
    /// is delivered once per subscriber.
    fn poll_added(&mut self) -> AppResult<Vec<CloudRecord>>;
}

/// Publishing side of the shared feed. Runs on a worker thread.
pub trait CloudPublisher: Send {
    /// Store `bytes` as a durable object and return its download URL.
    /// `progress` is called with values in `[0, 1]`, ending with `1.0`.
    fn upload(
        &self,
        file_name: &str,
        bytes: &[u8],
        progress: &mut dyn FnMut(f32),
    ) -> AppResult<String>;

    /// Append `record` to the feed.
    fn publish(&self, record: &CloudRecord) -> AppResult<()>;
}

/// A shared directory acting as object store plus append-only record feed:
///
/// ```text
/// <root>/objects/<millis>-<file name>
/// <root>/feed.jsonl
/// ```
#[derive(Debug, Clone)]
pub struct DirCloud {
    root: PathBuf,
    chunk_size: usize,
    delivered: usize,
}

impl DirCloud {
    /// Open the configured shared directory. Fails with
    /// `AppError::CloudNotConfigured` before touching the filesystem when
    /// sharing is disabled.
    pub fn connect(settings: &CloudSettings) -> AppResult<Self> {
        let root = match (&settings.root, settings.enabled) {
            (Some(root), true) => root.clone(),
            _ => return Err(AppError::CloudNotConfigured),
        };
        fs::create_dir_all(root.join("objects"))?;
        Ok(Self {
            root,
            chunk_size: settings.chunk_size.max(1),
            delivered: 0,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn feed_path(&self) -> PathBuf {
        self.root.join("feed.jsonl")
    }
}

impl CloudFeed for DirCloud {
    fn poll_added(&mut self) -> AppResult<Vec<CloudRecord>> {
        let text = match fs::read_to_string(self.feed_path()) {
            Ok(t) => t,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        // Only newline-terminated lines are complete; a concurrent writer may
        // still be appending the last one.
        let complete = match text.rfind('\n') {
            Some(end) => &text[..=end],
            None => return Ok(Vec::new()),
        };

        let mut added: Vec<CloudRecord> = Vec::new();
        for line in complete.lines().skip(self.delivered) {
            self.delivered += 1;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<CloudRecord>(line) {
                Ok(record) => added.push(record),
                Err(e) => log::warn!("skipping malformed feed record: {e}"),
            }
        }
        Ok(added)
    }
}

impl CloudPublisher for DirCloud {
    fn upload(
        &self,
        file_name: &str,
        bytes: &[u8],
        progress: &mut dyn FnMut(f32),
    ) -> AppResult<String> {
        let object = self
            .root
            .join("objects")
            .join(format!("{}-{}", now_millis(), object_name_for(file_name)));

        if let Err(e) = write_chunked(&object, bytes, self.chunk_size, progress) {
            let _ = fs::remove_file(&object);
            return Err(AppError::Upload(format!("{file_name}: {e}")));
        }
        progress(1.0);

        Ok(format!("file://{}", object.display()))
    }

    fn publish(&self, record: &CloudRecord) -> AppResult<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut feed = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.feed_path())?;
        feed.write_all(line.as_bytes())?;
        Ok(())
    }
}

fn write_chunked(
    path: &Path,
    bytes: &[u8],
    chunk_size: usize,
    progress: &mut dyn FnMut(f32),
) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    let total = bytes.len();
    let mut written = 0usize;
    progress(0.0);
    for chunk in bytes.chunks(chunk_size) {
        file.write_all(chunk)?;
        written += chunk.len();
        progress(written as f32 / total as f32);
    }
    file.sync_all()
}

fn object_name_for(file_name: &str) -> String {
    let name: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if name.is_empty() {
        "upload".to_string()
    } else {
        name
    }
}
