use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::audio::SampleTap;

/// Analysis window length.
pub const FFT_SIZE: usize = 256;
/// Magnitude bins produced per frame (`FFT_SIZE / 2`).
pub const BIN_COUNT: usize = FFT_SIZE / 2;

const MIN_DECIBELS: f32 = -100.0;
const MAX_DECIBELS: f32 = -30.0;
const SMOOTHING: f32 = 0.8;

/// Frequency analyser over a `SampleTap`, producing byte magnitudes the way an
/// `AnalyserNode` does: Blackman window, `|X| / N`, exponential smoothing over
/// time, then a linear map of `[MIN_DECIBELS, MAX_DECIBELS]` onto `0..=255`.
pub struct Analyser {
    tap: SampleTap,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    smoothed: Vec<f32>,
    mono: Vec<f32>,
    scratch: Vec<Complex<f32>>,
}

impl Analyser {
    pub fn new(tap: SampleTap) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);

        Self {
            tap,
            fft,
            window: blackman_window(FFT_SIZE),
            smoothed: vec![0.0; BIN_COUNT],
            mono: Vec::with_capacity(FFT_SIZE),
            scratch: vec![Complex::new(0.0, 0.0); FFT_SIZE],
        }
    }

    /// Sample the tap and write `BIN_COUNT` magnitudes into `out`.
    pub fn byte_frequency_data(&mut self, out: &mut [u8]) {
        self.tap.latest_mono(FFT_SIZE, &mut self.mono);
        self.analyse(out);
    }

    fn analyse(&mut self, out: &mut [u8]) {
        for (i, slot) in self.scratch.iter_mut().enumerate() {
            *slot = Complex::new(self.mono[i] * self.window[i], 0.0);
        }
        self.fft.process(&mut self.scratch);

        let scale = 1.0 / FFT_SIZE as f32;
        for (k, value) in out.iter_mut().take(BIN_COUNT).enumerate() {
            let magnitude = self.scratch[k].norm() * scale;
            let smoothed = SMOOTHING * self.smoothed[k] + (1.0 - SMOOTHING) * magnitude;
            self.smoothed[k] = smoothed;
            *value = decibels_to_byte(linear_to_decibels(smoothed));
        }
    }

    #[cfg(test)]
    pub(crate) fn analyse_frame(&mut self, frame: &[f32], out: &mut [u8]) {
        self.mono.clear();
        self.mono.extend_from_slice(frame);
        self.mono.resize(FFT_SIZE, 0.0);
        self.analyse(out);
    }
}

fn blackman_window(n: usize) -> Vec<f32> {
    let alpha = 0.16f32;
    let a0 = 0.5 * (1.0 - alpha);
    let a1 = 0.5f32;
    let a2 = 0.5 * alpha;
    let tau = 2.0 * std::f32::consts::PI;
    (0..n)
        .map(|i| {
            let x = i as f32 / n as f32;
            a0 - a1 * (tau * x).cos() + a2 * (2.0 * tau * x).cos()
        })
        .collect()
}

fn linear_to_decibels(value: f32) -> f32 {
    if value <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * value.log10()
    }
}

pub(crate) fn decibels_to_byte(db: f32) -> u8 {
    let scaled = 255.0 / (MAX_DECIBELS - MIN_DECIBELS) * (db - MIN_DECIBELS);
    if scaled.is_nan() {
        0
    } else {
        scaled.clamp(0.0, 255.0) as u8
    }
}
