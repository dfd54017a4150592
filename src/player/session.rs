//! The playback session: the single owner of "what is loaded" and "is it
//! playing", and the only code that touches the media element.

use std::sync::mpsc::Receiver;

use crate::audio::{MediaElement, MediaEvent};
use crate::config::EndOfListSetting;
use crate::error::AppResult;
use crate::library::{ArtGlyph, Track, TrackId, TrackRepository};
use crate::visualizer::Visualizer;

use super::events::{Observers, SessionEvent};
use super::time::format_time;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    Empty,
    Paused,
    Playing,
}

/// What happens when the last track in the repository ends.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum EndOfList {
    /// Continue from index 0.
    #[default]
    Wrap,
    /// Stay on the last track, paused and rewound.
    Stop,
}

impl From<EndOfListSetting> for EndOfList {
    fn from(value: EndOfListSetting) -> Self {
        match value {
            EndOfListSetting::Wrap => EndOfList::Wrap,
            EndOfListSetting::Stop => EndOfList::Stop,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SeekTarget {
    Seconds(f64),
    /// Fraction of the duration, `0.0..=1.0`.
    Fraction(f64),
    /// Offset from the current position.
    Relative(f64),
}

/// Display snapshot of the loaded track.
#[derive(Clone, Debug, PartialEq)]
pub struct NowPlaying {
    pub index: usize,
    pub title: String,
    pub artist: String,
    pub art: ArtGlyph,
    pub playing: bool,
    pub elapsed_secs: f64,
    pub duration_secs: f64,
    pub elapsed: String,
    pub duration: String,
}

pub struct PlaybackSession<M: MediaElement> {
    repository: TrackRepository,
    media: M,
    visualizer: Visualizer,
    end_of_list: EndOfList,
    current: Option<usize>,
    playing: bool,
    observers: Observers,
}

impl<M: MediaElement> PlaybackSession<M> {
    pub fn new(
        repository: TrackRepository,
        media: M,
        visualizer: Visualizer,
        end_of_list: EndOfList,
    ) -> Self {
        Self {
            repository,
            media,
            visualizer,
            end_of_list,
            current: None,
            playing: false,
            observers: Observers::default(),
        }
    }

    /// Register an observer. Events are queued until the receiver drains them.
    pub fn subscribe(&mut self) -> Receiver<SessionEvent> {
        self.observers.subscribe()
    }

    pub fn repository(&self) -> &TrackRepository {
        &self.repository
    }

    /// Append tracks (duplicates by id are skipped); returns how many were new.
    pub fn append_tracks(&mut self, tracks: impl IntoIterator<Item = Track>) -> usize {
        let added = self.repository.extend(tracks);
        if added > 0 {
            self.observers.emit(SessionEvent::LibraryChanged);
        }
        added
    }

    pub fn release_raw_bytes(&mut self, id: &TrackId) {
        self.repository.release_raw_bytes(id);
    }

    pub fn state(&self) -> PlaybackState {
        match (self.current, self.playing) {
            (None, _) => PlaybackState::Empty,
            (Some(_), false) => PlaybackState::Paused,
            (Some(_), true) => PlaybackState::Playing,
        }
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current.and_then(|i| self.repository.get(i))
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn media(&self) -> &M {
        &self.media
    }

    #[cfg(test)]
    pub(crate) fn media_mut_for_test(&mut self) -> &mut M {
        &mut self.media
    }

    pub fn visualizer(&self) -> &Visualizer {
        &self.visualizer
    }

    pub fn visualizer_mut(&mut self) -> &mut Visualizer {
        &mut self.visualizer
    }

    /// Bind the track at canonical `index` and leave it paused. Out-of-range
    /// indices are ignored and return false.
    pub fn load(&mut self, index: usize) -> bool {
        let Some(track) = self.repository.get(index) else {
            log::debug!("load({index}) ignored: {} tracks", self.repository.len());
            return false;
        };
        log::info!("loading [{index}] {} ({})", track.name, track.source.describe());
        self.media.set_source(&track.source);

        self.current = Some(index);
        self.playing = false;
        self.visualizer.stop();
        self.observers.emit(SessionEvent::TrackLoaded { index });
        self.emit_state();
        true
    }

    /// Start or resume the loaded track.
    ///
    /// The first successful call also wires the visualizer into the media
    /// element. Only call this from a user-initiated path (key press, media
    /// key, auto-advance after such a play): output devices and browsers alike
    /// may refuse to start audio that no user asked for.
    ///
    /// On failure the session stays `Paused` and the error is returned.
    pub fn play(&mut self) -> AppResult<()> {
        let Some(index) = self.current else {
            return Ok(());
        };
        if self.playing {
            return Ok(());
        }

        if let Err(e) = self.visualizer.ensure_initialized(&mut self.media) {
            log::warn!("visualizer unavailable: {e}");
        }

        if let Err(e) = self.media.play() {
            log::warn!("playback of track {index} failed: {e}");
            self.playing = false;
            self.visualizer.stop();
            self.observers.emit(SessionEvent::PlaybackFailed {
                index,
                message: e.to_string(),
            });
            self.emit_state();
            return Err(e);
        }

        self.playing = true;
        self.visualizer.start();
        self.emit_state();
        Ok(())
    }

    pub fn pause(&mut self) {
        if self.current.is_none() || !self.playing {
            return;
        }
        self.media.pause();
        self.playing = false;
        self.visualizer.stop();
        self.emit_state();
    }

    pub fn toggle_playback(&mut self) -> AppResult<()> {
        match self.state() {
            PlaybackState::Empty => Ok(()),
            PlaybackState::Paused => self.play(),
            PlaybackState::Playing => {
                self.pause();
                Ok(())
            }
        }
    }

    pub fn previous(&mut self) -> AppResult<()> {
        let len = self.repository.len();
        if len == 0 {
            return Ok(());
        }
        let target = match self.current {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.load(target);
        self.play()
    }

    pub fn next(&mut self) -> AppResult<()> {
        let len = self.repository.len();
        if len == 0 {
            return Ok(());
        }
        let target = match self.current {
            Some(i) => (i + 1) % len,
            None => 0,
        };
        self.load(target);
        self.play()
    }

    /// Move the playback position, clamped to `[0, duration]`. Ignored while
    /// nothing is loaded, while the duration is unknown, or for non-finite
    /// targets.
    pub fn seek(&mut self, target: SeekTarget) {
        if self.current.is_none() {
            return;
        }
        let duration = self.media.duration();
        if !duration.is_finite() {
            log::debug!("seek {target:?} ignored: duration unknown");
            return;
        }

        let seconds = match target {
            SeekTarget::Seconds(s) => s,
            SeekTarget::Fraction(f) => f * duration,
            SeekTarget::Relative(d) => self.media.current_time() + d,
        };
        if !seconds.is_finite() {
            return;
        }

        self.media.set_current_time(seconds.clamp(0.0, duration.max(0.0)));
        self.on_time_update();
    }

    /// Set output gain. Values are clamped to `[0, 1]`; NaN is ignored.
    pub fn set_volume(&mut self, level: f32) {
        if level.is_nan() {
            return;
        }
        self.media.set_volume(level.clamp(0.0, 1.0));
    }

    pub fn volume(&self) -> f32 {
        self.media.volume()
    }

    pub fn on_time_update(&mut self) {
        self.observers.emit(SessionEvent::TimeUpdated {
            elapsed: self.media.current_time(),
            duration: self.media.duration(),
        });
    }

    pub fn on_loaded_metadata(&mut self) {
        self.on_time_update();
    }

    /// Auto-advance after the current track finishes.
    pub fn on_ended(&mut self) -> AppResult<()> {
        let Some(index) = self.current else {
            return Ok(());
        };
        let len = self.repository.len();
        self.playing = false;

        let is_last = index + 1 >= len;
        if is_last && self.end_of_list == EndOfList::Stop {
            log::info!("end of list reached");
            self.visualizer.stop();
            self.media.set_current_time(0.0);
            self.emit_state();
            self.on_time_update();
            return Ok(());
        }

        self.load((index + 1) % len);
        self.play()
    }

    /// An asynchronous load or decode failure on the current source.
    pub fn on_media_error(&mut self, message: &str) {
        let Some(index) = self.current else {
            return;
        };
        log::warn!("media error on track {index}: {message}");
        self.media.pause();
        self.playing = false;
        self.visualizer.stop();
        self.observers.emit(SessionEvent::PlaybackFailed {
            index,
            message: message.to_string(),
        });
        self.emit_state();
    }

    /// Drain the media element's notifications and react to each one.
    /// Returns true when anything was processed.
    pub fn pump_media_events(&mut self) -> bool {
        let events = self.media.poll_events();
        let any = !events.is_empty();
        for event in events {
            match event {
                MediaEvent::LoadedMetadata => self.on_loaded_metadata(),
                MediaEvent::TimeUpdate => self.on_time_update(),
                MediaEvent::Ended => {
                    if let Err(e) = self.on_ended() {
                        log::warn!("auto-advance failed: {e}");
                    }
                }
                MediaEvent::Error(message) => self.on_media_error(&message),
            }
        }
        any
    }

    pub fn now_playing(&self) -> Option<NowPlaying> {
        let index = self.current?;
        let track = self.repository.get(index)?;
        let elapsed_secs = self.media.current_time();
        let duration_secs = self.media.duration();

        Some(NowPlaying {
            index,
            title: track.name.clone(),
            artist: track.artist_or_unknown().to_string(),
            art: track.art(),
            playing: self.playing,
            elapsed_secs,
            duration_secs,
            elapsed: format_time(elapsed_secs),
            duration: format_time(duration_secs),
        })
    }

    fn emit_state(&mut self) {
        self.observers.emit(SessionEvent::StateChanged {
            index: self.current,
            playing: self.playing,
        });
    }
}
