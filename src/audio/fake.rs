//! In-memory `MediaElement` for unit tests.

use crate::error::{AppError, AppResult};
use crate::library::SourceRef;

use super::tap::SampleTap;
use super::types::{MediaElement, MediaEvent};

#[derive(Default)]
pub(crate) struct FakeMedia {
    pub source: Option<SourceRef>,
    pub playing: bool,
    pub time: f64,
    pub duration: f64,
    pub volume: f32,
    pub play_calls: usize,
    pub attach_calls: usize,
    pub tap: Option<SampleTap>,
    /// Sources whose `play` is rejected.
    pub broken: Vec<String>,
    pub events: Vec<MediaEvent>,
}

impl FakeMedia {
    pub fn new() -> Self {
        Self {
            duration: f64::NAN,
            volume: 1.0,
            ..Self::default()
        }
    }

    pub fn with_duration(duration: f64) -> Self {
        Self {
            duration,
            ..Self::new()
        }
    }

    pub fn source_label(&self) -> Option<String> {
        self.source.as_ref().map(SourceRef::describe)
    }
}

impl MediaElement for FakeMedia {
    fn set_source(&mut self, source: &SourceRef) {
        self.source = Some(source.clone());
        self.playing = false;
        self.time = 0.0;
        self.events.clear();
    }

    fn play(&mut self) -> AppResult<()> {
        self.play_calls += 1;
        let Some(label) = self.source_label() else {
            return Err(AppError::Playback("no source bound".to_string()));
        };
        if self.broken.contains(&label) {
            return Err(AppError::Playback(format!("cannot play {label}")));
        }
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn current_time(&self) -> f64 {
        self.time
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.time = seconds;
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, level: f32) {
        self.volume = level;
    }

    fn attach_analyser(&mut self) -> AppResult<SampleTap> {
        self.attach_calls += 1;
        if self.tap.is_some() {
            return Err(AppError::AnalyserAttached);
        }
        let tap = SampleTap::new();
        self.tap = Some(tap.clone());
        Ok(tap)
    }

    fn poll_events(&mut self) -> Vec<MediaEvent> {
        std::mem::take(&mut self.events)
    }
}
