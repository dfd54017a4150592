//! Per-origin track records and their normalization into `Track`.
//!
//! Each origin carries exactly the fields it guarantees; `TrackOrigin::into_track`
//! is the only place where defaults (artist placeholder, size labels) are filled in.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::model::{SourceRef, Track, TrackId, Visibility};

/// Artist used for manifest entries that do not name one.
pub const DEFAULT_MANIFEST_ARTIST: &str = "Let It SD Artist";
/// Size label of manifest (featured) entries.
pub const FEATURED_LABEL: &str = "Featured";
/// Size label of shared-feed entries that did not record a size.
pub const SHARED_LABEL: &str = "Shared";

/// One hand-authored public track.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    #[serde(default)]
    pub artist: Option<String>,
    pub url: String,
}

/// Metadata of a track saved in the local store; the bytes live next to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredTrack {
    pub id: TrackId,
    pub name: String,
    #[serde(default)]
    pub artist: Option<String>,
    pub size_label: String,
    pub timestamp_ms: u64,
}

/// One entry of the shared feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudRecord {
    pub id: TrackId,
    pub name: String,
    #[serde(default)]
    pub artist: Option<String>,
    pub url: String,
    #[serde(default)]
    pub size_label: Option<String>,
    pub created_at_ms: u64,
}

pub enum TrackOrigin {
    Manifest {
        position: usize,
        entry: ManifestEntry,
    },
    LocalUpload {
        id: TrackId,
        file_name: String,
        artist: Option<String>,
        bytes: Arc<[u8]>,
    },
    Persisted {
        record: StoredTrack,
        bytes: Arc<[u8]>,
    },
    CloudShared(CloudRecord),
}

impl TrackOrigin {
    pub fn into_track(self) -> Track {
        match self {
            TrackOrigin::Manifest { position, entry } => Track {
                id: TrackId::new(format!("public-{position}")),
                name: entry.name,
                artist: Some(
                    entry
                        .artist
                        .filter(|a| !a.trim().is_empty())
                        .unwrap_or_else(|| DEFAULT_MANIFEST_ARTIST.to_string()),
                ),
                source: SourceRef::parse(&entry.url),
                visibility: Visibility::Public,
                size_label: FEATURED_LABEL.to_string(),
                raw_bytes: None,
            },
            TrackOrigin::LocalUpload {
                id,
                file_name,
                artist,
                bytes,
            } => Track {
                id,
                name: track_name_from_file_name(&file_name),
                artist,
                size_label: size_label(bytes.len() as u64),
                source: SourceRef::Memory(bytes.clone()),
                visibility: Visibility::Private,
                raw_bytes: Some(bytes),
            },
            TrackOrigin::Persisted { record, bytes } => Track {
                id: record.id,
                name: record.name,
                artist: record.artist,
                source: SourceRef::Memory(bytes),
                visibility: Visibility::Private,
                size_label: record.size_label,
                raw_bytes: None,
            },
            TrackOrigin::CloudShared(record) => Track {
                id: record.id,
                name: record.name,
                artist: record.artist,
                source: SourceRef::parse(&record.url),
                visibility: Visibility::Public,
                size_label: record.size_label.unwrap_or_else(|| SHARED_LABEL.to_string()),
                raw_bytes: None,
            },
        }
    }
}

/// `"Song One.mp3"` -> `"Song One"`. Names without an extension are kept as-is.
pub fn track_name_from_file_name(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() && !ext.contains('/') => {
            stem.to_string()
        }
        _ => file_name.to_string(),
    }
}

/// Byte size rendered in mebibytes with two decimals, e.g. `"3.00 MB"`.
pub fn size_label(len: u64) -> String {
    format!("{:.2} MB", len as f64 / (1024.0 * 1024.0))
}
