//! Track library: the track model, per-origin records, the ordered
//! repository with its public/private views, and upload ingestion.

mod ingest;
mod manifest;
mod model;
mod origin;
mod repository;

pub use ingest::{read_uploads, split_pasted_paths};
pub use manifest::{builtin_manifest, load_manifest, manifest_tracks};
pub use model::{ArtGlyph, SourceRef, Track, TrackId, Visibility, now_millis};
pub use origin::{
    CloudRecord, DEFAULT_MANIFEST_ARTIST, FEATURED_LABEL, ManifestEntry, SHARED_LABEL, StoredTrack,
    TrackOrigin, size_label, track_name_from_file_name,
};
pub use repository::TrackRepository;

#[cfg(test)]
mod tests;
