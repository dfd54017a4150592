use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::library::{StoredTrack, Track, TrackId};

/// Key-value store for private tracks, keyed by track id.
pub trait LocalStore {
    /// Every stored record with its bytes, oldest first.
    fn get_all(&self) -> AppResult<Vec<(StoredTrack, Arc<[u8]>)>>;

    /// Store a new record. Fails if a record with the same id exists.
    fn add(&mut self, record: &StoredTrack, bytes: &[u8]) -> AppResult<()>;
}

/// Directory-backed store: `<id>.json` holds the metadata, `<id>.bin` the bytes.
///
/// The metadata file is written last, so a record only becomes visible once
/// its bytes are complete.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn open(root: impl Into<PathBuf>) -> AppResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn meta_path(&self, id: &TrackId) -> PathBuf {
        self.root.join(format!("{}.json", file_stem_for(id)))
    }

    fn blob_path(&self, id: &TrackId) -> PathBuf {
        self.root.join(format!("{}.bin", file_stem_for(id)))
    }

    fn read_entry(&self, meta_path: &Path) -> AppResult<(StoredTrack, Arc<[u8]>)> {
        let record: StoredTrack = serde_json::from_slice(&fs::read(meta_path)?)?;
        let bytes = fs::read(self.blob_path(&record.id))?;
        Ok((record, Arc::from(bytes)))
    }
}

impl LocalStore for DirStore {
    fn get_all(&self) -> AppResult<Vec<(StoredTrack, Arc<[u8]>)>> {
        let mut entries: Vec<(StoredTrack, Arc<[u8]>)> = Vec::new();

        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match self.read_entry(&path) {
                Ok(e) => entries.push(e),
                Err(e) => log::warn!("skipping unreadable stored track {}: {e}", path.display()),
            }
        }

        entries.sort_by(|(a, _), (b, _)| {
            a.timestamp_ms
                .cmp(&b.timestamp_ms)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(entries)
    }

    fn add(&mut self, record: &StoredTrack, bytes: &[u8]) -> AppResult<()> {
        let meta_path = self.meta_path(&record.id);
        match fs::metadata(&meta_path) {
            Ok(_) => {
                return Err(AppError::Store(format!(
                    "a track with id {} is already stored",
                    record.id
                )));
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        fs::write(self.blob_path(&record.id), bytes)?;
        fs::write(&meta_path, serde_json::to_vec_pretty(record)?)?;
        Ok(())
    }
}

/// Turn a pending upload into a store record. Returns `None` when the track
/// has no unsaved bytes (already persisted, or not an upload at all).
pub fn record_for_upload(track: &Track, timestamp_ms: u64) -> Option<(StoredTrack, Arc<[u8]>)> {
    let bytes = track.raw_bytes.clone()?;
    Some((
        StoredTrack {
            id: track.id.clone(),
            name: track.name.clone(),
            artist: track.artist.clone(),
            size_label: track.size_label.clone(),
            timestamp_ms,
        },
        bytes,
    ))
}

/// Ids are opaque; keep only characters that are safe in a file name.
fn file_stem_for(id: &TrackId) -> String {
    id.as_str()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
