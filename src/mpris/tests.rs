use super::*;
use crate::library::{TrackId, Visibility};
use std::sync::Arc;
use std::sync::mpsc;

fn make_track(source: SourceRef) -> Track {
    Track {
        id: TrackId::new("public-7"),
        name: "Ocean Waves".to_string(),
        artist: Some("Nature".to_string()),
        source,
        visibility: Visibility::Public,
        size_label: "Featured".to_string(),
        raw_bytes: None,
    }
}

#[test]
fn set_track_metadata_sets_and_clears_shared_state() {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let handle = MprisHandle {
        state: state.clone(),
    };

    let track = make_track(SourceRef::Remote("https://tracks.test/waves.mp3".into()));
    handle.set_track_metadata(Some(7), Some(&track), 1.234567);

    {
        let s = state.lock().unwrap();
        assert_eq!(s.title.as_deref(), Some("Ocean Waves"));
        assert_eq!(s.artist, vec!["Nature".to_string()]);
        assert_eq!(s.url.as_deref(), Some("https://tracks.test/waves.mp3"));
        assert_eq!(s.length_micros, Some(1_234_567));
        assert_eq!(
            s.track_id.as_ref().map(|p| p.as_str()),
            Some("/org/mpris/MediaPlayer2/track/7")
        );
    }

    handle.set_track_metadata(None, None, f64::NAN);
    {
        let s = state.lock().unwrap();
        assert_eq!(s.title, None);
        assert!(s.artist.is_empty());
        assert_eq!(s.url, None);
        assert_eq!(s.length_micros, None);
        assert!(s.track_id.is_none());
    }
}

#[test]
fn memory_tracks_have_no_url_and_unknown_length() {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let handle = MprisHandle {
        state: state.clone(),
    };

    let track = make_track(SourceRef::Memory(Arc::from(vec![0u8; 4])));
    handle.set_track_metadata(Some(0), Some(&track), f64::NAN);

    let s = state.lock().unwrap();
    assert_eq!(s.url, None);
    assert_eq!(s.length_micros, None);
}

#[test]
fn playback_status_maps_state_to_mpris_strings() {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (tx, _rx) = mpsc::channel::<ControlCmd>();
    let iface = PlayerIface {
        tx,
        state: state.clone(),
    };
    assert_eq!(iface.playback_status(), "Stopped");

    let handle = MprisHandle {
        state: state.clone(),
    };
    handle.set_playback(PlaybackState::Playing);
    assert_eq!(iface.playback_status(), "Playing");

    handle.set_playback(PlaybackState::Paused);
    assert_eq!(iface.playback_status(), "Paused");
}

#[test]
fn metadata_includes_expected_keys_when_present() {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (tx, _rx) = mpsc::channel::<ControlCmd>();
    let iface = PlayerIface {
        tx,
        state: state.clone(),
    };
    assert!(iface.metadata().is_empty());

    let handle = MprisHandle {
        state: state.clone(),
    };
    let track = make_track(SourceRef::Remote("https://tracks.test/waves.mp3".into()));
    handle.set_track_metadata(Some(1), Some(&track), 42.0);

    let map = iface.metadata();
    for k in [
        "mpris:trackid",
        "xesam:title",
        "xesam:artist",
        "xesam:url",
        "mpris:length",
    ] {
        assert!(map.contains_key(k), "missing key: {k}");
    }
}

#[test]
fn transport_methods_forward_commands() {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (tx, rx) = mpsc::channel::<ControlCmd>();
    let iface = PlayerIface { tx, state };

    iface.play_pause();
    iface.next();
    iface.previous();
    iface.stop();

    let got: Vec<ControlCmd> = rx.try_iter().collect();
    assert_eq!(
        got,
        vec![
            ControlCmd::PlayPause,
            ControlCmd::Next,
            ControlCmd::Prev,
            ControlCmd::Stop
        ]
    );
}
