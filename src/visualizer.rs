//! Frequency visualizer driven by the media element's analyser tap.

mod analyser;
mod layout;

use std::time::{Duration, Instant};

use crate::audio::MediaElement;
use crate::config::VisualizerSettings;
use crate::error::AppResult;

use analyser::FFT_SIZE;
pub use analyser::{Analyser, BIN_COUNT};
pub use layout::{bar_layout, gradient_rgb};

/// Per-frame spectrum state. The analyser graph is built at most once per
/// session, lazily on the first play, and then reused for every track.
pub struct Visualizer {
    analyser: Option<Analyser>,
    enabled: bool,
    running: bool,
    bins: Vec<u8>,
    frame_interval: Duration,
    last_frame: Option<Instant>,
}

impl Visualizer {
    pub fn new(settings: &VisualizerSettings) -> Self {
        let fps = settings.fps.max(1);
        Self {
            analyser: None,
            enabled: settings.enabled,
            running: false,
            bins: vec![0; BIN_COUNT],
            frame_interval: Duration::from_secs_f64(1.0 / fps as f64),
            last_frame: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[cfg(test)]
    pub fn is_initialized(&self) -> bool {
        self.analyser.is_some()
    }

    /// Attach the analyser to `media` if that has not happened yet. Later calls
    /// are no-ops, so a second playback never wires a second graph.
    pub fn ensure_initialized<M: MediaElement + ?Sized>(&mut self, media: &mut M) -> AppResult<()> {
        if !self.enabled || self.analyser.is_some() {
            return Ok(());
        }
        let tap = media.attach_analyser()?;
        self.analyser = Some(Analyser::new(tap));
        log::debug!("visualizer attached ({FFT_SIZE}-point FFT, {BIN_COUNT} bins)");
        Ok(())
    }

    pub fn start(&mut self) {
        if self.analyser.is_some() {
            self.running = true;
        }
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.last_frame = None;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Advance one frame if the loop is running and a frame is due. Returns
    /// whether the bins changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.running {
            return false;
        }
        let Some(analyser) = self.analyser.as_mut() else {
            return false;
        };
        if let Some(last) = self.last_frame {
            if now.duration_since(last) < self.frame_interval {
                return false;
            }
        }
        self.last_frame = Some(now);
        analyser.byte_frequency_data(&mut self.bins);
        true
    }

    pub fn bins(&self) -> &[u8] {
        &self.bins
    }

    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }
}
