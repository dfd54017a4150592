use super::tap::{TAP_CAPACITY, TapSource};
use super::*;
use rodio::Source;
use rodio::buffer::SamplesBuffer;

#[test]
fn latest_mono_zero_pads_when_short() {
    let tap = SampleTap::new();
    tap.set_channels(1);
    for s in [0.25f32, 0.5, 0.75] {
        tap.push(s);
    }

    let mut out = Vec::new();
    tap.latest_mono(5, &mut out);
    assert_eq!(out, vec![0.0, 0.0, 0.25, 0.5, 0.75]);
}

#[test]
fn latest_mono_averages_channels_and_keeps_most_recent_frames() {
    let tap = SampleTap::new();
    tap.set_channels(2);
    // frames: (0,1) (1,1) (2,2) (4,0)
    for s in [0.0f32, 1.0, 1.0, 1.0, 2.0, 2.0, 4.0, 0.0] {
        tap.push(s);
    }

    let mut out = Vec::new();
    tap.latest_mono(2, &mut out);
    assert_eq!(out, vec![2.0, 2.0]);
}

#[test]
fn tap_capacity_is_bounded() {
    let tap = SampleTap::new();
    tap.set_channels(1);
    for i in 0..(TAP_CAPACITY + 10) {
        tap.push(i as f32);
    }

    let mut out = Vec::new();
    tap.latest_mono(TAP_CAPACITY + 10, &mut out);
    assert_eq!(out[..10], [0.0; 10]);
    assert_eq!(out[10], 10.0);
    assert_eq!(*out.last().unwrap(), (TAP_CAPACITY + 9) as f32);
}

#[test]
fn tap_source_passes_samples_through_and_records_them() {
    let tap = SampleTap::new();
    let buffer = SamplesBuffer::new(1, 44_100, vec![0.1f32, 0.2, 0.3]);
    let source = TapSource::new(buffer, tap.clone());
    assert_eq!(source.channels(), 1);

    let played: Vec<f32> = source.collect();
    assert_eq!(played, vec![0.1, 0.2, 0.3]);

    let mut out = Vec::new();
    tap.latest_mono(3, &mut out);
    assert_eq!(out, vec![0.1, 0.2, 0.3]);
}
