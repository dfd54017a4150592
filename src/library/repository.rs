use std::collections::HashMap;
use std::sync::Arc;

use super::model::{Track, TrackId, Visibility};

/// Ordered, append-only collection of every known track.
///
/// Ids are unique: appending a track whose id is already present is a no-op,
/// which makes re-delivered feed records harmless.
#[derive(Default)]
pub struct TrackRepository {
    tracks: Vec<Track>,
    positions: HashMap<TrackId, usize>,
}

impl TrackRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `track`; returns false (and drops it) when the id is taken.
    pub fn append(&mut self, track: Track) -> bool {
        if self.positions.contains_key(&track.id) {
            log::debug!("ignoring duplicate track id {}", track.id);
            return false;
        }
        self.positions.insert(track.id.clone(), self.tracks.len());
        self.tracks.push(track);
        true
    }

    /// Append every track, returning how many were new.
    pub fn extend(&mut self, tracks: impl IntoIterator<Item = Track>) -> usize {
        tracks
            .into_iter()
            .map(|t| self.append(t))
            .filter(|added| *added)
            .count()
    }

    /// Tracks with the given visibility, in repository order. The view is lazy
    /// and can be restarted by cloning it before iterating.
    pub fn filtered_view(&self, visibility: Visibility) -> FilteredView<'_> {
        FilteredView {
            tracks: &self.tracks,
            visibility,
            pos: 0,
        }
    }

    /// Canonical position of the track with `id`.
    pub fn index_of(&self, id: &TrackId) -> Option<usize> {
        self.positions.get(id).copied()
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn by_id(&self, id: &TrackId) -> Option<&Track> {
        self.index_of(id).and_then(|i| self.tracks.get(i))
    }

    /// Drop the pending-upload copy of the bytes once they are stored elsewhere.
    /// The playable source keeps its own reference.
    pub fn release_raw_bytes(&mut self, id: &TrackId) -> Option<Arc<[u8]>> {
        let index = self.index_of(id)?;
        self.tracks[index].raw_bytes.take()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

#[derive(Clone)]
pub struct FilteredView<'a> {
    tracks: &'a [Track],
    visibility: Visibility,
    pos: usize,
}

impl<'a> Iterator for FilteredView<'a> {
    type Item = &'a Track;

    fn next(&mut self) -> Option<&'a Track> {
        while let Some(track) = self.tracks.get(self.pos) {
            self.pos += 1;
            if track.visibility == self.visibility {
                return Some(track);
            }
        }
        None
    }
}
