use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::AppResult;

use super::model::Track;
use super::origin::{ManifestEntry, TrackOrigin};

/// On-disk manifest layout:
///
/// ```toml
/// [[track]]
/// name = "Welcome Chill"
/// artist = "Let It SD"
/// url = "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-1.mp3"
/// ```
#[derive(Debug, Deserialize)]
struct ManifestFile {
    #[serde(default, rename = "track")]
    tracks: Vec<ManifestEntry>,
}

pub fn parse_manifest(text: &str) -> AppResult<Vec<ManifestEntry>> {
    let file: ManifestFile = toml::from_str(text)?;
    Ok(file.tracks)
}

/// Load the configured manifest, or the built-in featured list when none is set.
pub fn load_manifest(path: Option<&Path>) -> AppResult<Vec<ManifestEntry>> {
    match path {
        Some(path) => parse_manifest(&fs::read_to_string(path)?),
        None => Ok(builtin_manifest()),
    }
}

pub fn builtin_manifest() -> Vec<ManifestEntry> {
    [
        (
            "Welcome Chill",
            "Let It SD",
            "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-1.mp3",
        ),
        (
            "Ocean Waves",
            "Nature",
            "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-2.mp3",
        ),
        (
            "Electronic Beats",
            "Cyber",
            "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-8.mp3",
        ),
    ]
    .into_iter()
    .map(|(name, artist, url)| ManifestEntry {
        name: name.to_string(),
        artist: Some(artist.to_string()),
        url: url.to_string(),
    })
    .collect()
}

/// Normalize manifest entries into public tracks; ids follow manifest order.
pub fn manifest_tracks(entries: Vec<ManifestEntry>) -> Vec<Track> {
    entries
        .into_iter()
        .enumerate()
        .map(|(position, entry)| TrackOrigin::Manifest { position, entry }.into_track())
        .collect()
}
