use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lofty::prelude::{Accessor, TaggedFileExt};
use lofty::probe::Probe;
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::model::{Track, TrackId, percent_decode};
use super::origin::TrackOrigin;

/// Whether an upload candidate should be accepted: an `audio/*` MIME type, or
/// one of the configured extensions (case-insensitive).
pub fn is_supported(file_name: &str, mime: Option<&str>, extensions: &[String]) -> bool {
    if mime.is_some_and(|m| m.trim().to_ascii_lowercase().starts_with("audio/")) {
        return true;
    }

    Path::new(file_name)
        .extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            extensions
                .iter()
                .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
                .any(|e| !e.is_empty() && e == ext)
        })
        .unwrap_or(false)
}

/// Expand dropped/picked paths into the audio files they name. Directories are
/// walked recursively; anything unsupported is dropped silently.
pub fn collect_candidates(paths: &[PathBuf], settings: &LibrarySettings) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .follow_links(true)
                .into_iter()
                .filter_map(Result::ok)
                .map(|entry| entry.into_path())
                .filter(|p| p.is_file() && accepts(p, settings))
                .collect();
            found.sort();
            files.extend(found);
        } else if path.is_file() && accepts(path, settings) {
            files.push(path.clone());
        } else {
            log::debug!("skipping unsupported upload {}", path.display());
        }
    }

    files
}

fn accepts(path: &Path, settings: &LibrarySettings) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| is_supported(name, None, &settings.extensions))
        .unwrap_or(false)
}

/// Build a private, not-yet-saved track from an uploaded file's bytes.
pub fn upload_from_bytes(file_name: &str, bytes: Vec<u8>) -> Track {
    let bytes: Arc<[u8]> = Arc::from(bytes);
    TrackOrigin::LocalUpload {
        id: TrackId::generate(),
        file_name: file_name.to_string(),
        artist: embedded_artist(&bytes),
        bytes,
    }
    .into_track()
}

/// Read every accepted file under `paths` into upload tracks. Unreadable files
/// are logged and skipped.
pub fn read_uploads(paths: &[PathBuf], settings: &LibrarySettings) -> Vec<Track> {
    collect_candidates(paths, settings)
        .into_iter()
        .filter_map(|path| {
            let file_name = path.file_name()?.to_string_lossy().into_owned();
            match fs::read(&path) {
                Ok(bytes) => Some(upload_from_bytes(&file_name, bytes)),
                Err(e) => {
                    log::warn!("failed to read upload {}: {e}", path.display());
                    None
                }
            }
        })
        .collect()
}

fn embedded_artist(bytes: &[u8]) -> Option<String> {
    let mut cursor = Cursor::new(bytes);
    let tagged = Probe::new(&mut cursor).guess_file_type().ok()?.read().ok()?;
    let tag = tagged.primary_tag().or_else(|| tagged.first_tag())?;
    let artist = tag.artist()?;
    let artist = artist.trim();
    if artist.is_empty() {
        None
    } else {
        Some(artist.to_string())
    }
}

/// Split text pasted into the terminal (what a file drop produces) into paths.
///
/// Handles single/double quoting, backslash-escaped spaces, newline separated
/// lists and `file://` URIs.
pub fn split_pasted_paths(text: &str) -> Vec<PathBuf> {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => current.push(c),
            (None, '\'' | '"') => {
                quote = Some(c);
                in_word = true;
            }
            (None, '\\') => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if in_word {
        words.push(current);
    }

    words
        .into_iter()
        .filter(|w| !w.is_empty())
        .map(|w| match w.strip_prefix("file://") {
            Some(rest) => PathBuf::from(percent_decode(rest)),
            None => PathBuf::from(w),
        })
        .collect()
}
