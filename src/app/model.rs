//! Application model types: `App`, `InputMode` and `UploadOverlay`.
//!
//! The `App` struct holds view state only: which tab is shown, the cursor,
//! popups, and the uploads that have not been saved yet. Playback state lives
//! in the `PlaybackSession` and reaches the view as `SessionEvent`s.

use crate::library::{TrackId, TrackRepository, Visibility};
use crate::player::SessionEvent;

/// What the keyboard currently drives.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    /// Typing a file or directory path to ingest.
    OpenPath(String),
    /// Choosing where freshly uploaded tracks go.
    SaveChoice,
    /// A blocking message; any key dismisses it.
    Message(String),
}

/// Progress of the cloud upload in flight, if any.
#[derive(Clone, Debug, PartialEq)]
pub struct UploadOverlay {
    pub file_name: String,
    pub progress: f32,
}

/// The main application model.
pub struct App {
    pub tab: Visibility,
    /// Canonical repository index under the cursor.
    pub selected: Option<usize>,
    pub follow_playback: bool,
    pub mode: InputMode,
    pub upload: Option<UploadOverlay>,
    pub status: Option<String>,
    pub store_available: bool,
    pub cloud_available: bool,

    pending_uploads: Vec<TrackId>,
    publish_generation: u64,
}

impl App {
    pub fn new(tab: Visibility) -> Self {
        Self {
            tab,
            selected: None,
            follow_playback: true,
            mode: InputMode::Normal,
            upload: None,
            status: None,
            store_available: false,
            cloud_available: false,
            pending_uploads: Vec::new(),
            publish_generation: 0,
        }
    }

    /// Canonical indices of the tracks on the current tab, in repository order.
    pub fn visible_indices(&self, repo: &TrackRepository) -> Vec<usize> {
        repo.filtered_view(self.tab)
            .filter_map(|t| repo.index_of(&t.id))
            .collect()
    }

    /// Number of tracks on each tab, `(public, private)`.
    pub fn tab_counts(repo: &TrackRepository) -> (usize, usize) {
        let public = repo.filtered_view(Visibility::Public).count();
        (public, repo.len() - public)
    }

    pub fn show_tab(&mut self, tab: Visibility, repo: &TrackRepository) {
        if self.tab != tab {
            self.tab = tab;
            self.selected = None;
        }
        self.ensure_selected_visible(repo);
    }

    pub fn toggle_tab(&mut self, repo: &TrackRepository) {
        self.show_tab(self.tab.toggle(), repo);
    }

    /// Keep the cursor on the current tab; fall back to its first track.
    pub fn ensure_selected_visible(&mut self, repo: &TrackRepository) {
        let display = self.visible_indices(repo);
        match self.selected {
            Some(i) if display.contains(&i) => {}
            _ => self.selected = display.first().copied(),
        }
    }

    /// Move the cursor to the next track on the tab, wrapping around.
    pub fn select_next(&mut self, repo: &TrackRepository) {
        let display = self.visible_indices(repo);
        if display.is_empty() {
            return;
        }
        let pos = self
            .selected
            .and_then(|s| display.iter().position(|&i| i == s));
        self.selected = Some(match pos {
            Some(p) => display[(p + 1) % display.len()],
            None => display[0],
        });
        self.follow_playback = false;
    }

    /// Move the cursor to the previous track on the tab, wrapping around.
    pub fn select_prev(&mut self, repo: &TrackRepository) {
        let display = self.visible_indices(repo);
        if display.is_empty() {
            return;
        }
        let pos = self
            .selected
            .and_then(|s| display.iter().position(|&i| i == s));
        self.selected = Some(match pos {
            Some(0) | None => display[display.len() - 1],
            Some(p) => display[p - 1],
        });
        self.follow_playback = false;
    }

    pub fn select_first(&mut self, repo: &TrackRepository) {
        if let Some(&first) = self.visible_indices(repo).first() {
            self.selected = Some(first);
            self.follow_playback = false;
        }
    }

    pub fn select_last(&mut self, repo: &TrackRepository) {
        if let Some(&last) = self.visible_indices(repo).last() {
            self.selected = Some(last);
            self.follow_playback = false;
        }
    }

    /// Record freshly ingested uploads awaiting a save decision.
    pub fn add_pending(&mut self, ids: impl IntoIterator<Item = TrackId>) {
        for id in ids {
            if !self.pending_uploads.contains(&id) {
                self.pending_uploads.push(id);
            }
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.pending_uploads.is_empty()
    }

    pub fn pending(&self) -> &[TrackId] {
        &self.pending_uploads
    }

    pub fn take_pending(&mut self) -> Vec<TrackId> {
        std::mem::take(&mut self.pending_uploads)
    }

    /// Start a new publish batch. Completions tagged with an older generation
    /// are stale and must be ignored.
    pub fn begin_publish(&mut self) -> u64 {
        self.publish_generation += 1;
        self.publish_generation
    }

    pub fn is_current_generation(&self, generation: u64) -> bool {
        generation == self.publish_generation
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }

    pub fn show_message(&mut self, message: impl Into<String>) {
        self.mode = InputMode::Message(message.into());
    }

    pub fn open_path_prompt(&mut self) {
        self.mode = InputMode::OpenPath(String::new());
    }

    pub fn push_prompt_char(&mut self, c: char) {
        if let InputMode::OpenPath(buf) = &mut self.mode {
            buf.push(c);
        }
    }

    pub fn pop_prompt_char(&mut self) {
        if let InputMode::OpenPath(buf) = &mut self.mode {
            buf.pop();
        }
    }

    pub fn push_prompt_str(&mut self, text: &str) {
        if let InputMode::OpenPath(buf) = &mut self.mode {
            buf.push_str(text);
        }
    }

    /// Close the path prompt and hand back what was typed.
    pub fn take_prompt(&mut self) -> Option<String> {
        match std::mem::take(&mut self.mode) {
            InputMode::OpenPath(buf) => Some(buf),
            other => {
                self.mode = other;
                None
            }
        }
    }

    pub fn close_popup(&mut self) {
        self.mode = InputMode::Normal;
    }

    /// React to a playback session notification. Returns true when the view
    /// needs a redraw.
    pub fn on_session_event(&mut self, event: &SessionEvent, repo: &TrackRepository) -> bool {
        match event {
            SessionEvent::TrackLoaded { index } => {
                let on_tab = repo.get(*index).is_some_and(|t| t.visibility == self.tab);
                if self.follow_playback && on_tab {
                    self.selected = Some(*index);
                }
                true
            }
            SessionEvent::StateChanged { .. } => true,
            SessionEvent::TimeUpdated { .. } => true,
            SessionEvent::PlaybackFailed { index, message } => {
                let name = repo.get(*index).map(|t| t.name.as_str()).unwrap_or("track");
                self.set_status(format!("Could not play {name}: {message}"));
                true
            }
            SessionEvent::LibraryChanged => {
                self.ensure_selected_visible(repo);
                true
            }
        }
    }
}
