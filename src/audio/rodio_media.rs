//! `MediaElement` backed by a rodio `Sink` on the default output device.

use std::fs;
use std::io::Cursor;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::{Duration, Instant};

use lofty::prelude::AudioFile;
use lofty::probe::Probe;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};

use crate::error::{AppError, AppResult};
use crate::library::SourceRef;

use super::fetch::{FetchResult, spawn_fetch};
use super::tap::{SampleTap, TapSource};
use super::types::{MediaElement, MediaEvent};

const TIME_UPDATE_INTERVAL: Duration = Duration::from_millis(250);

pub struct RodioMedia {
    stream: OutputStream,
    sink: Option<Sink>,
    /// Bytes of the bound source; kept so the sink can be rebuilt (analyser
    /// attach, replay after end, failed seeks).
    bytes: Option<Arc<[u8]>>,
    load_error: Option<String>,
    pending: Option<Receiver<FetchResult>>,
    play_when_ready: bool,
    playing: bool,
    ended: bool,
    duration: f64,
    volume: f32,
    tap: Option<SampleTap>,
    events: Vec<MediaEvent>,
    last_time_update: Instant,
    fetch_timeout: Duration,
}

impl RodioMedia {
    pub fn open(volume: f32, fetch_timeout: Duration) -> AppResult<Self> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| AppError::Output(e.to_string()))?;
        // rodio logs to stderr when the stream is dropped, which garbles the TUI.
        stream.log_on_drop(false);

        Ok(Self {
            stream,
            sink: None,
            bytes: None,
            load_error: None,
            pending: None,
            play_when_ready: false,
            playing: false,
            ended: false,
            duration: f64::NAN,
            volume: volume.clamp(0.0, 1.0),
            tap: None,
            events: Vec::new(),
            last_time_update: Instant::now(),
            fetch_timeout,
        })
    }

    fn reset(&mut self) {
        if let Some(old) = self.sink.take() {
            old.stop();
        }
        self.bytes = None;
        self.load_error = None;
        self.pending = None;
        self.play_when_ready = false;
        self.playing = false;
        self.ended = false;
        self.duration = f64::NAN;
        // Notifications about the previous source no longer apply.
        self.events.clear();
        if let Some(tap) = &self.tap {
            tap.clear();
        }
    }

    /// Decode `bytes` into a fresh paused sink positioned at `start_at`.
    fn install(&mut self, bytes: Arc<[u8]>, start_at: Duration) -> AppResult<()> {
        let decoder =
            Decoder::new(Cursor::new(bytes.clone())).map_err(|e| AppError::Decode(e.to_string()))?;
        let total = decoder.total_duration().or_else(|| probe_duration(&bytes));

        let sink = Sink::connect_new(self.stream.mixer());
        sink.set_volume(self.volume);
        sink.pause();
        match &self.tap {
            Some(tap) => sink.append(TapSource::new(decoder, tap.clone())),
            None => sink.append(decoder),
        }
        if !start_at.is_zero() {
            if let Err(e) = sink.try_seek(start_at) {
                log::debug!("seek to {start_at:?} unsupported: {e}");
            }
        }

        if let Some(old) = self.sink.replace(sink) {
            old.stop();
        }
        self.bytes = Some(bytes);
        self.ended = false;
        self.duration = total.map(|d| d.as_secs_f64()).unwrap_or(f64::NAN);
        self.events.push(MediaEvent::LoadedMetadata);
        Ok(())
    }

    fn load_bytes(&mut self, bytes: Arc<[u8]>) {
        if let Err(e) = self.install(bytes, Duration::ZERO) {
            log::warn!("failed to decode source: {e}");
            self.load_error = Some(e.to_string());
        }
    }

    /// Rebuild the sink from the bound bytes, keeping position and play state.
    fn rebuild_at(&mut self, position: Duration) -> AppResult<()> {
        let Some(bytes) = self.bytes.clone() else {
            return Ok(());
        };
        self.install(bytes, position)?;
        if self.playing {
            if let Some(sink) = &self.sink {
                sink.play();
            }
        }
        Ok(())
    }

    fn settle_fetch(&mut self) {
        let received = match self.pending.as_ref().map(|rx| rx.try_recv()) {
            None | Some(Err(TryRecvError::Empty)) => return,
            Some(Ok(result)) => result,
            Some(Err(TryRecvError::Disconnected)) => {
                Err(AppError::Fetch("download worker stopped".to_string()))
            }
        };
        self.pending = None;

        let installed = received.and_then(|bytes| self.install(bytes, Duration::ZERO));
        match installed {
            Ok(()) => {
                if self.play_when_ready {
                    self.play_when_ready = false;
                    if let Some(sink) = &self.sink {
                        sink.play();
                    }
                }
            }
            Err(e) => {
                self.load_error = Some(e.to_string());
                self.play_when_ready = false;
                self.playing = false;
                self.events.push(MediaEvent::Error(e.to_string()));
            }
        }
    }
}

impl MediaElement for RodioMedia {
    fn set_source(&mut self, source: &SourceRef) {
        self.reset();
        match source {
            SourceRef::Memory(bytes) => self.load_bytes(bytes.clone()),
            SourceRef::Path(path) => match fs::read(path) {
                Ok(bytes) => self.load_bytes(Arc::from(bytes)),
                Err(e) => {
                    log::warn!("failed to read {}: {e}", path.display());
                    self.load_error = Some(format!("{}: {e}", path.display()));
                }
            },
            SourceRef::Remote(url) => {
                self.pending = Some(spawn_fetch(url.clone(), self.fetch_timeout));
            }
        }
    }

    fn play(&mut self) -> AppResult<()> {
        if let Some(msg) = &self.load_error {
            return Err(AppError::Playback(msg.clone()));
        }
        if self.pending.is_some() {
            // Starts as soon as the download lands.
            self.play_when_ready = true;
            self.playing = true;
            return Ok(());
        }
        if self.ended {
            self.rebuild_at(Duration::ZERO)?;
        }
        let Some(sink) = &self.sink else {
            return Err(AppError::Playback("no source bound".to_string()));
        };
        sink.play();
        self.playing = true;
        self.last_time_update = Instant::now();
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
        self.play_when_ready = false;
        self.playing = false;
    }

    fn current_time(&self) -> f64 {
        if self.ended && self.duration.is_finite() {
            return self.duration;
        }
        self.sink
            .as_ref()
            .map(|s| s.get_pos().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn set_current_time(&mut self, seconds: f64) {
        if !seconds.is_finite() || seconds < 0.0 {
            return;
        }
        let target = Duration::from_secs_f64(seconds);

        let seeked = !self.ended
            && self
                .sink
                .as_ref()
                .map(|s| s.try_seek(target).is_ok())
                .unwrap_or(false);
        if !seeked {
            if let Err(e) = self.rebuild_at(target) {
                log::warn!("seek failed: {e}");
                return;
            }
        }
        self.events.push(MediaEvent::TimeUpdate);
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, level: f32) {
        self.volume = level;
        if let Some(sink) = &self.sink {
            sink.set_volume(level);
        }
    }

    fn attach_analyser(&mut self) -> AppResult<SampleTap> {
        if self.tap.is_some() {
            return Err(AppError::AnalyserAttached);
        }
        let tap = SampleTap::new();
        self.tap = Some(tap.clone());

        // The current sink was built without the tap; splice it in.
        if self.sink.is_some() && !self.ended {
            let position = Duration::from_secs_f64(self.current_time().max(0.0));
            self.rebuild_at(position)?;
        }
        Ok(tap)
    }

    fn poll_events(&mut self) -> Vec<MediaEvent> {
        self.settle_fetch();

        if self.playing && !self.ended && self.pending.is_none() {
            let finished = self.sink.as_ref().map(Sink::empty).unwrap_or(false);
            if finished {
                self.ended = true;
                self.playing = false;
                self.events.push(MediaEvent::Ended);
            } else if self.last_time_update.elapsed() >= TIME_UPDATE_INTERVAL {
                self.last_time_update = Instant::now();
                self.events.push(MediaEvent::TimeUpdate);
            }
        }

        std::mem::take(&mut self.events)
    }
}

/// Container-level duration for formats whose decoder cannot tell (VBR mp3).
fn probe_duration(bytes: &[u8]) -> Option<Duration> {
    let mut cursor = Cursor::new(bytes);
    let tagged = Probe::new(&mut cursor).guess_file_type().ok()?.read().ok()?;
    let duration = tagged.properties().duration();
    if duration.is_zero() {
        None
    } else {
        Some(duration)
    }
}
