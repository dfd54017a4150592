use std::fs;
use std::sync::mpsc;

use tempfile::tempdir;

use super::event_loop::{activate_selected, sync_session};
use super::startup::build_library;
use super::uploads::{
    PublishEvent, PublishJob, PublishMsg, apply_publish_msg, begin_share, ingest_paths,
    run_publish, save_local,
};
use crate::app::App;
use crate::audio::MediaEvent;
use crate::audio::fake::FakeMedia;
use crate::config::{Settings, VisualizerSettings};
use crate::library::{
    CloudRecord, StoredTrack, TrackId, TrackRepository, Visibility, size_label,
};
use crate::mpris::ControlCmd;
use crate::player::{EndOfList, PlaybackSession, PlaybackState};
use crate::store::{CloudFeed, CloudPublisher, DirCloud, DirStore, LocalStore};
use crate::visualizer::Visualizer;

fn empty_session() -> PlaybackSession<FakeMedia> {
    PlaybackSession::new(
        TrackRepository::new(),
        FakeMedia::new(),
        Visualizer::new(&VisualizerSettings::default()),
        EndOfList::Wrap,
    )
}

fn settings_in(root: &std::path::Path) -> Settings {
    let mut settings = Settings::default();
    settings.library.store_dir = Some(root.join("songs"));
    settings.cloud.enabled = true;
    settings.cloud.root = Some(root.join("cloud"));
    settings.cloud.chunk_size = 4;
    settings
}

#[test]
fn library_loads_manifest_then_store_then_feed() {
    let dir = tempdir().unwrap();
    let settings = settings_in(dir.path());

    let mut store = DirStore::open(dir.path().join("songs")).unwrap();
    store
        .add(
            &StoredTrack {
                id: TrackId::new("saved-1"),
                name: "Kept".into(),
                artist: None,
                size_label: "0.00 MB".into(),
                timestamp_ms: 5,
            },
            b"bytes",
        )
        .unwrap();
    let cloud = DirCloud::connect(&settings.cloud).unwrap();
    cloud
        .publish(&CloudRecord {
            id: TrackId::new("shared-1"),
            name: "From Afar".into(),
            artist: Some("Friend".into()),
            url: "https://tracks.test/afar.mp3".into(),
            size_label: None,
            created_at_ms: 9,
        })
        .unwrap();

    let library = build_library(&settings);
    let repo = &library.repository;

    assert_eq!(repo.len(), 5);
    assert_eq!(repo.get(0).unwrap().name, "Welcome Chill");
    assert_eq!(repo.get(3).unwrap().name, "Kept");
    assert_eq!(repo.get(3).unwrap().visibility, Visibility::Private);
    assert_eq!(repo.get(4).unwrap().name, "From Afar");
    assert_eq!(repo.get(4).unwrap().size_label, "Shared");
    assert!(library.store.is_some());
    assert!(library.cloud.is_some());
    assert!(library.notices.is_empty());
}

#[test]
fn library_degrades_when_backends_are_missing() {
    let dir = tempdir().unwrap();
    let mut settings = Settings::default();
    settings.library.manifest_path = Some(dir.path().join("missing.toml"));
    settings.library.persist = false;

    let library = build_library(&settings);

    assert_eq!(library.repository.len(), 3);
    assert!(library.store.is_none());
    assert!(library.cloud.is_none());
    assert_eq!(library.notices.len(), 1);
    assert!(library.notices[0].starts_with("Manifest unreadable"));
}

#[test]
fn library_reports_unusable_store_directory() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    fs::write(&blocker, b"file").unwrap();

    let mut settings = Settings::default();
    settings.library.store_dir = Some(blocker);

    let library = build_library(&settings);
    assert!(library.store.is_none());
    assert_eq!(
        library.notices,
        vec!["Local library unavailable: uploads are session-only".to_string()]
    );
}

#[test]
fn ingest_adds_private_pending_tracks_and_loads_when_idle() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("Song One.mp3"), vec![0u8; 2048]).unwrap();
    fs::write(dir.path().join("notes.txt"), b"not audio").unwrap();

    let settings = Settings::default();
    let mut app = App::new(Visibility::Public);
    let mut session = empty_session();

    let added = ingest_paths(
        &[dir.path().to_path_buf()],
        &settings.library,
        &mut app,
        &mut session,
    );

    assert_eq!(added, 1);
    assert_eq!(app.tab, Visibility::Private);
    assert_eq!(app.pending().len(), 1);
    assert_eq!(app.selected, Some(0));
    assert_eq!(session.state(), PlaybackState::Paused);
    let track = session.current_track().unwrap();
    assert_eq!(track.name, "Song One");
    assert_eq!(track.size_label, size_label(2048));
}

#[test]
fn ingest_of_nothing_supported_only_sets_status() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("cover.jpg"), b"jpeg").unwrap();

    let mut app = App::new(Visibility::Public);
    let mut session = empty_session();
    let added = ingest_paths(
        &[dir.path().join("cover.jpg")],
        &Settings::default().library,
        &mut app,
        &mut session,
    );

    assert_eq!(added, 0);
    assert_eq!(app.tab, Visibility::Public);
    assert_eq!(app.status.as_deref(), Some("No supported audio files found"));
    assert_eq!(session.state(), PlaybackState::Empty);
}

#[test]
fn save_local_persists_pending_and_releases_bytes() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.ogg"), b"aaaa").unwrap();
    fs::write(dir.path().join("b.wav"), b"bbbbbb").unwrap();

    let mut app = App::new(Visibility::Private);
    let mut session = empty_session();
    ingest_paths(
        &[dir.path().to_path_buf()],
        &Settings::default().library,
        &mut app,
        &mut session,
    );
    let ids = app.pending().to_vec();

    let mut store = DirStore::open(dir.path().join("songs")).unwrap();
    assert_eq!(save_local(&mut store, &mut app, &mut session), (2, 0));
    assert!(!app.has_pending());

    for id in &ids {
        assert!(session.repository().by_id(id).unwrap().raw_bytes.is_none());
    }
    let stored = store.get_all().unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].0.name, "a");
    assert_eq!(&stored[1].1[..], b"bbbbbb");

    // Nothing left to save the second time around.
    app.add_pending(ids.iter().cloned());
    assert_eq!(save_local(&mut store, &mut app, &mut session), (0, 0));
}

#[test]
fn publish_worker_reports_progress_and_appends_to_feed() {
    let dir = tempdir().unwrap();
    let settings = settings_in(dir.path());
    let cloud = DirCloud::connect(&settings.cloud).unwrap();

    let (tx, rx) = mpsc::channel::<PublishMsg>();
    let jobs = vec![PublishJob {
        id: TrackId::new("upload-1"),
        file_name: "Song One".into(),
        name: "Song One".into(),
        artist: None,
        size_label: "0.00 MB".into(),
        bytes: std::sync::Arc::from(vec![7u8; 10]),
    }];
    run_publish(&cloud, 3, jobs, &tx);

    let msgs: Vec<PublishMsg> = rx.try_iter().collect();
    assert!(msgs.iter().all(|m| m.generation == 3));
    assert_eq!(
        msgs.first().map(|m| &m.event),
        Some(&PublishEvent::Started {
            file_name: "Song One".into()
        })
    );
    assert_eq!(
        msgs.last().map(|m| &m.event),
        Some(&PublishEvent::Finished {
            published: 1,
            failed: 0
        })
    );
    let progress: Vec<f32> = msgs
        .iter()
        .filter_map(|m| match m.event {
            PublishEvent::Progress { fraction } => Some(fraction),
            _ => None,
        })
        .collect();
    assert_eq!(progress.first(), Some(&0.0));
    assert_eq!(progress.last(), Some(&1.0));
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));

    let mut subscriber = DirCloud::connect(&settings.cloud).unwrap();
    let records = subscriber.poll_added().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "Song One");
    assert_eq!(records[0].size_label.as_deref(), Some("0.00 MB"));
    assert!(records[0].url.starts_with("file://"));
}

#[test]
fn stale_publish_messages_do_not_touch_the_view() {
    let mut app = App::new(Visibility::Private);
    let mut session = empty_session();
    let old = app.begin_publish();
    let current = app.begin_publish();

    let changed = apply_publish_msg(
        &mut app,
        &mut session,
        PublishMsg {
            generation: old,
            event: PublishEvent::Started {
                file_name: "late.mp3".into(),
            },
        },
    );
    assert!(!changed);
    assert!(app.upload.is_none());

    let msg = |event| PublishMsg {
        generation: current,
        event,
    };
    assert!(apply_publish_msg(
        &mut app,
        &mut session,
        msg(PublishEvent::Started {
            file_name: "now.mp3".into()
        })
    ));
    apply_publish_msg(&mut app, &mut session, msg(PublishEvent::Progress { fraction: 0.5 }));
    assert_eq!(app.upload.as_ref().map(|u| u.progress), Some(0.5));

    apply_publish_msg(
        &mut app,
        &mut session,
        msg(PublishEvent::Failed {
            id: TrackId::new("now"),
            file_name: "now.mp3".into(),
            error: "disk full".into(),
        }),
    );
    assert!(app.upload.is_none());
    assert_eq!(
        app.status.as_deref(),
        Some("Sharing now.mp3 failed: disk full")
    );
}

fn session_with_upload(dir: &std::path::Path) -> (App, PlaybackSession<FakeMedia>, TrackId) {
    fs::write(dir.join("Song One.mp3"), vec![1u8; 64]).unwrap();
    let mut app = App::new(Visibility::Private);
    let mut session = empty_session();
    ingest_paths(
        &[dir.join("Song One.mp3")],
        &Settings::default().library,
        &mut app,
        &mut session,
    );
    let id = app.pending()[0].clone();
    (app, session, id)
}

fn share_now(
    cloud: &DirCloud,
    app: &mut App,
    session: &mut PlaybackSession<FakeMedia>,
) {
    let (generation, jobs) = begin_share(app, session).unwrap();
    assert!(!app.has_pending());
    let (tx, rx) = mpsc::channel::<PublishMsg>();
    run_publish(cloud, generation, jobs, &tx);
    for msg in rx.try_iter() {
        apply_publish_msg(app, session, msg);
    }
}

#[test]
fn failed_share_leaves_the_upload_pending_with_its_bytes() {
    let dir = tempdir().unwrap();
    let settings = settings_in(dir.path());
    let cloud = DirCloud::connect(&settings.cloud).unwrap();
    fs::remove_dir_all(dir.path().join("cloud").join("objects")).unwrap();

    let (mut app, mut session, id) = session_with_upload(dir.path());
    share_now(&cloud, &mut app, &mut session);

    assert_eq!(app.pending(), &[id.clone()]);
    assert!(session.repository().by_id(&id).unwrap().raw_bytes.is_some());
    assert_eq!(
        app.status.as_deref(),
        Some("Shared 0 track(s), 1 failed")
    );

    // The retry goes through once the shared directory is back.
    fs::create_dir_all(dir.path().join("cloud").join("objects")).unwrap();
    share_now(&cloud, &mut app, &mut session);
    assert!(!app.has_pending());
    assert!(session.repository().by_id(&id).unwrap().raw_bytes.is_none());
}

#[test]
fn shared_upload_keeps_bytes_until_published() {
    let dir = tempdir().unwrap();
    let (mut app, session, id) = session_with_upload(dir.path());

    let (_, jobs) = begin_share(&mut app, &session).unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].id, id);
    assert!(session.repository().by_id(&id).unwrap().raw_bytes.is_some());

    // Nothing left to send.
    assert!(begin_share(&mut app, &session).is_none());
}

#[test]
fn failed_local_save_stays_pending() {
    let dir = tempdir().unwrap();
    let (mut app, mut session, id) = session_with_upload(dir.path());

    let songs = dir.path().join("songs");
    let mut store = DirStore::open(&songs).unwrap();
    fs::remove_dir_all(&songs).unwrap();

    assert_eq!(save_local(&mut store, &mut app, &mut session), (0, 1));
    assert_eq!(app.pending(), &[id.clone()]);
    assert!(session.repository().by_id(&id).unwrap().raw_bytes.is_some());

    fs::create_dir_all(&songs).unwrap();
    assert_eq!(save_local(&mut store, &mut app, &mut session), (1, 0));
    assert!(!app.has_pending());
}

#[test]
fn enter_on_the_loaded_track_toggles_it() {
    let dir = tempdir().unwrap();
    let (mut app, mut session, _) = session_with_upload(dir.path());
    session.media_mut_for_test().duration = 100.0;
    assert_eq!(session.current_index(), Some(0));

    activate_selected(&mut app, &mut session);
    assert_eq!(session.state(), PlaybackState::Playing);

    session.media_mut_for_test().time = 42.0;
    activate_selected(&mut app, &mut session);
    assert_eq!(session.state(), PlaybackState::Paused);

    activate_selected(&mut app, &mut session);
    assert_eq!(session.state(), PlaybackState::Playing);
    assert_eq!(session.media().time, 42.0);
}

#[test]
fn queued_next_runs_before_a_pending_end_of_track() {
    let dir = tempdir().unwrap();
    for name in ["a.mp3", "b.mp3", "c.mp3"] {
        fs::write(dir.path().join(name), b"xx").unwrap();
    }
    let mut app = App::new(Visibility::Private);
    let mut session = empty_session();
    ingest_paths(
        &[dir.path().to_path_buf()],
        &Settings::default().library,
        &mut app,
        &mut session,
    );
    session.load(0);
    session.play().unwrap();

    let (tx, rx) = mpsc::channel::<ControlCmd>();
    tx.send(ControlCmd::Next).unwrap();
    session.media_mut_for_test().events.push(MediaEvent::Ended);

    assert!(!sync_session(&rx, &mut session));
    // Next moved to b; the stale end belonged to a and is dropped with it.
    assert_eq!(session.current_index(), Some(1));

    tx.send(ControlCmd::Quit).unwrap();
    assert!(sync_session(&rx, &mut session));
}
