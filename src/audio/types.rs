//! The media element abstraction the playback session drives.
//!
//! One element exists per process; the session is its only mutator.

use crate::error::AppResult;
use crate::library::SourceRef;

use super::tap::SampleTap;

/// Notifications emitted by a media element, drained by `poll_events`.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// The bound source decoded and its duration (if any) is known.
    LoadedMetadata,
    /// Playback position advanced.
    TimeUpdate,
    /// The current source played to its end.
    Ended,
    /// Loading or playing the current source failed asynchronously.
    Error(String),
}

pub trait MediaElement {
    /// Bind a new source, discarding undelivered events about the old one.
    /// Never fails synchronously; load problems surface on `play` or as
    /// `MediaEvent::Error`.
    fn set_source(&mut self, source: &SourceRef);

    /// Start or resume playback of the bound source.
    fn play(&mut self) -> AppResult<()>;

    fn pause(&mut self);

    /// Current position in seconds.
    fn current_time(&self) -> f64;

    /// Duration in seconds; NaN while unknown.
    fn duration(&self) -> f64;

    fn set_current_time(&mut self, seconds: f64);

    fn volume(&self) -> f32;

    fn set_volume(&mut self, level: f32);

    /// Route the decoded output through an analysis tap. Can succeed only once
    /// per element.
    fn attach_analyser(&mut self) -> AppResult<SampleTap>;

    fn poll_events(&mut self) -> Vec<MediaEvent>;
}
