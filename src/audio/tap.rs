use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rodio::Source;
use rodio::source::SeekError;

/// Interleaved samples kept for analysis.
pub const TAP_CAPACITY: usize = 8192;

#[derive(Default)]
struct TapBuffer {
    samples: VecDeque<f32>,
    channels: u16,
}

/// Shared ring buffer filled by the audio mixer thread and read by the visualizer.
#[derive(Clone, Default)]
pub struct SampleTap {
    inner: Arc<Mutex<TapBuffer>>,
}

impl SampleTap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, sample: f32) {
        // Never block the mixer; a skipped sample is invisible in a spectrum.
        if let Ok(mut buf) = self.inner.try_lock() {
            if buf.samples.len() >= TAP_CAPACITY {
                buf.samples.pop_front();
            }
            buf.samples.push_back(sample);
        }
    }

    pub fn set_channels(&self, channels: u16) {
        if let Ok(mut buf) = self.inner.lock() {
            if buf.channels != channels {
                buf.samples.clear();
                buf.channels = channels;
            }
        }
    }

    pub fn clear(&self) {
        if let Ok(mut buf) = self.inner.lock() {
            buf.samples.clear();
        }
    }

    /// Fill `out` with the most recent `frames` mono frames, zero-padded at the
    /// front when fewer are available.
    pub fn latest_mono(&self, frames: usize, out: &mut Vec<f32>) {
        out.clear();
        out.resize(frames, 0.0);

        let Ok(buf) = self.inner.lock() else {
            return;
        };
        let channels = buf.channels.max(1) as usize;
        let available = buf.samples.len() / channels;
        let take = available.min(frames);
        let start = (available - take) * channels;

        for i in 0..take {
            let base = start + i * channels;
            let sum: f32 = (0..channels).map(|c| buf.samples[base + c]).sum();
            out[frames - take + i] = sum / channels as f32;
        }
    }
}

/// Source wrapper that copies every sample into a `SampleTap`.
pub(crate) struct TapSource<S> {
    inner: S,
    tap: SampleTap,
}

impl<S> TapSource<S>
where
    S: Source<Item = f32>,
{
    pub(crate) fn new(inner: S, tap: SampleTap) -> Self {
        tap.set_channels(inner.channels());
        Self { inner, tap }
    }
}

impl<S> Iterator for TapSource<S>
where
    S: Source<Item = f32>,
{
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let sample = self.inner.next()?;
        self.tap.push(sample);
        Some(sample)
    }
}

impl<S> Source for TapSource<S>
where
    S: Source<Item = f32>,
{
    fn current_span_len(&self) -> Option<usize> {
        self.inner.current_span_len()
    }

    fn channels(&self) -> u16 {
        self.inner.channels()
    }

    fn sample_rate(&self) -> u32 {
        self.inner.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        self.inner.total_duration()
    }

    fn try_seek(&mut self, pos: Duration) -> Result<(), SeekError> {
        self.tap.clear();
        self.inner.try_seek(pos)
    }
}
