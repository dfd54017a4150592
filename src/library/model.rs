use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Shown wherever a track carries no artist.
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Opaque, unique identifier of a track inside the repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh id for an upload: wall-clock millis plus a random suffix.
    pub fn generate() -> Self {
        let suffix: u32 = rand::random();
        Self(format!("{:x}-{:08x}", now_millis(), suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Milliseconds since the Unix epoch (0 if the clock is before it).
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Which library tab a track belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    #[serde(alias = "global", alias = "shared")]
    Public,
    #[serde(alias = "local")]
    Private,
}

impl Visibility {
    pub fn toggle(self) -> Self {
        match self {
            Visibility::Public => Visibility::Private,
            Visibility::Private => Visibility::Public,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Visibility::Public => "Public",
            Visibility::Private => "Private",
        }
    }
}

/// Where the bytes of a track come from.
///
/// `Memory` is the in-process stand-in for an object URL: the bytes live as
/// long as any `Track` (or media element) still holds the `Arc`.
#[derive(Clone)]
pub enum SourceRef {
    Remote(String),
    Path(PathBuf),
    Memory(Arc<[u8]>),
}

impl SourceRef {
    /// Interpret a manifest or feed URL.
    pub fn parse(url: &str) -> Self {
        let url = url.trim();
        if let Some(rest) = url.strip_prefix("file://") {
            SourceRef::Path(PathBuf::from(percent_decode(rest)))
        } else if url.starts_with("http://") || url.starts_with("https://") {
            SourceRef::Remote(url.to_string())
        } else {
            SourceRef::Path(PathBuf::from(url))
        }
    }

    pub fn is_ephemeral(&self) -> bool {
        matches!(self, SourceRef::Memory(_))
    }

    /// A URL-ish rendering for logs and MPRIS metadata.
    pub fn describe(&self) -> String {
        match self {
            SourceRef::Remote(url) => url.clone(),
            SourceRef::Path(path) => format!("file://{}", path.display()),
            SourceRef::Memory(bytes) => format!("memory:{}-bytes", bytes.len()),
        }
    }
}

impl fmt::Debug for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceRef::Remote(url) => f.debug_tuple("Remote").field(url).finish(),
            SourceRef::Path(path) => f.debug_tuple("Path").field(path).finish(),
            SourceRef::Memory(bytes) => write!(f, "Memory({} bytes)", bytes.len()),
        }
    }
}

/// Decode `%XX` escapes as produced by terminals and file managers.
pub(crate) fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let decoded = std::str::from_utf8(&bytes[i + 1..i + 3])
                .ok()
                .and_then(|hex| u8::from_str_radix(hex, 16).ok());
            if let Some(v) = decoded {
                out.push(v);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Artwork placeholder shown next to the now-playing title.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ArtGlyph {
    /// Track plays from bytes uploaded in this session or loaded from the local store.
    Uploaded,
    Note,
}

/// A playable item, normalized from whatever origin produced it.
#[derive(Debug, Clone)]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    pub artist: Option<String>,
    pub source: SourceRef,
    pub visibility: Visibility,
    pub size_label: String,
    /// Present only while a fresh upload has not been saved anywhere yet.
    pub raw_bytes: Option<Arc<[u8]>>,
}

impl Track {
    pub fn artist_or_unknown(&self) -> &str {
        self.artist
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(UNKNOWN_ARTIST)
    }

    pub fn art(&self) -> ArtGlyph {
        if self.source.is_ephemeral() {
            ArtGlyph::Uploaded
        } else {
            ArtGlyph::Note
        }
    }
}
