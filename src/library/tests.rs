use super::ingest::{is_supported, upload_from_bytes};
use super::manifest::parse_manifest;
use super::model::UNKNOWN_ARTIST;
use super::*;
use crate::config::LibrarySettings;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::tempdir;

fn t(id: &str, visibility: Visibility) -> Track {
    Track {
        id: TrackId::new(id),
        name: id.to_uppercase(),
        artist: None,
        source: SourceRef::Remote(format!("https://example.com/{id}.mp3")),
        visibility,
        size_label: FEATURED_LABEL.to_string(),
        raw_bytes: None,
    }
}

fn extensions() -> Vec<String> {
    LibrarySettings::default().extensions
}

#[test]
fn upload_named_song_one_becomes_private_three_megabyte_track() {
    let track = upload_from_bytes("Song One.mp3", vec![0u8; 3_145_728]);
    assert_eq!(track.name, "Song One");
    assert_eq!(track.size_label, "3.00 MB");
    assert_eq!(track.visibility, Visibility::Private);
    assert!(track.raw_bytes.is_some());
    assert!(track.source.is_ephemeral());
    assert_eq!(track.art(), ArtGlyph::Uploaded);
    assert_eq!(track.artist_or_unknown(), UNKNOWN_ARTIST);
}

#[test]
fn track_name_strips_only_the_last_extension() {
    assert_eq!(track_name_from_file_name("Song One.mp3"), "Song One");
    assert_eq!(track_name_from_file_name("a.b.ogg"), "a.b");
    assert_eq!(track_name_from_file_name("no_extension"), "no_extension");
    assert_eq!(track_name_from_file_name(".hidden"), ".hidden");
}

#[test]
fn size_label_uses_two_decimals() {
    assert_eq!(size_label(0), "0.00 MB");
    assert_eq!(size_label(1024 * 1024 / 2), "0.50 MB");
    assert_eq!(size_label(3_145_728), "3.00 MB");
}

#[test]
fn is_supported_accepts_audio_mime_or_known_extension() {
    let exts = extensions();
    assert!(is_supported("a.mp3", None, &exts));
    assert!(is_supported("a.M4A", None, &exts));
    assert!(is_supported("a.WAV", None, &exts));
    assert!(is_supported("a.ogg", None, &exts));
    assert!(is_supported("weird.bin", Some("audio/flac"), &exts));
    assert!(!is_supported("a.txt", Some("text/plain"), &exts));
    assert!(!is_supported("a.flac", None, &exts));
    assert!(!is_supported("mp3", None, &exts));
}

#[test]
fn append_ignores_duplicate_ids() {
    let mut repo = TrackRepository::new();
    assert!(repo.append(t("a", Visibility::Public)));
    assert!(!repo.append(t("a", Visibility::Private)));
    assert_eq!(repo.len(), 1);
    assert_eq!(repo.get(0).unwrap().visibility, Visibility::Public);
}

#[test]
fn filtered_views_partition_the_repository_in_order() {
    let mut repo = TrackRepository::new();
    let added = repo.extend([
        t("p0", Visibility::Public),
        t("x0", Visibility::Private),
        t("p1", Visibility::Public),
        t("x1", Visibility::Private),
        t("p0", Visibility::Private),
    ]);
    assert_eq!(added, 4);

    let public: Vec<&str> = repo
        .filtered_view(Visibility::Public)
        .map(|t| t.id.as_str())
        .collect();
    let private: Vec<&str> = repo
        .filtered_view(Visibility::Private)
        .map(|t| t.id.as_str())
        .collect();

    assert_eq!(public, vec!["p0", "p1"]);
    assert_eq!(private, vec!["x0", "x1"]);
    assert_eq!(public.len() + private.len(), repo.len());
    assert!(public.iter().all(|id| !private.contains(id)));
}

#[test]
fn filtered_view_is_restartable_by_clone() {
    let mut repo = TrackRepository::new();
    repo.extend([t("a", Visibility::Public), t("b", Visibility::Public)]);

    let view = repo.filtered_view(Visibility::Public);
    assert_eq!(view.clone().count(), 2);
    assert_eq!(view.count(), 2);
}

#[test]
fn index_of_maps_filtered_tracks_back_to_canonical_positions() {
    let mut repo = TrackRepository::new();
    repo.extend([
        t("p0", Visibility::Public),
        t("x0", Visibility::Private),
        t("p1", Visibility::Public),
    ]);

    let indices: Vec<usize> = repo
        .filtered_view(Visibility::Public)
        .filter_map(|t| repo.index_of(&t.id))
        .collect();
    assert_eq!(indices, vec![0, 2]);
    assert_eq!(repo.index_of(&TrackId::new("missing")), None);
}

#[test]
fn release_raw_bytes_keeps_the_playable_source() {
    let mut repo = TrackRepository::new();
    let track = upload_from_bytes("x.mp3", vec![1, 2, 3]);
    let id = track.id.clone();
    repo.append(track);

    assert!(repo.release_raw_bytes(&id).is_some());
    let stored = repo.by_id(&id).unwrap();
    assert!(stored.raw_bytes.is_none());
    match &stored.source {
        SourceRef::Memory(bytes) => assert_eq!(&bytes[..], &[1, 2, 3]),
        other => panic!("unexpected source {other:?}"),
    }
}

#[test]
fn manifest_origin_fills_defaults() {
    let tracks = manifest_tracks(vec![ManifestEntry {
        name: "Plain".into(),
        artist: None,
        url: "https://example.com/plain.mp3".into(),
    }]);
    assert_eq!(tracks.len(), 1);
    let track = &tracks[0];
    assert_eq!(track.id.as_str(), "public-0");
    assert_eq!(track.artist.as_deref(), Some(DEFAULT_MANIFEST_ARTIST));
    assert_eq!(track.size_label, FEATURED_LABEL);
    assert_eq!(track.visibility, Visibility::Public);
    assert_eq!(track.art(), ArtGlyph::Note);
}

#[test]
fn persisted_and_cloud_origins_keep_their_ids() {
    let persisted = TrackOrigin::Persisted {
        record: StoredTrack {
            id: TrackId::new("saved-1"),
            name: "Saved".into(),
            artist: None,
            size_label: "1.00 MB".into(),
            timestamp_ms: 5,
        },
        bytes: Arc::from(vec![0u8; 4]),
    }
    .into_track();
    assert_eq!(persisted.id.as_str(), "saved-1");
    assert_eq!(persisted.visibility, Visibility::Private);
    assert!(persisted.raw_bytes.is_none());

    let shared = TrackOrigin::CloudShared(CloudRecord {
        id: TrackId::new("cloud-1"),
        name: "Shared".into(),
        artist: Some("Someone".into()),
        url: "file:///tmp/shared/objects/a%20b.mp3".into(),
        size_label: None,
        created_at_ms: 9,
    })
    .into_track();
    assert_eq!(shared.visibility, Visibility::Public);
    assert_eq!(shared.size_label, SHARED_LABEL);
    match shared.source {
        SourceRef::Path(p) => assert_eq!(p, PathBuf::from("/tmp/shared/objects/a b.mp3")),
        other => panic!("unexpected source {other:?}"),
    }
}

#[test]
fn parse_manifest_reads_track_tables() {
    let entries = parse_manifest(
        r#"
[[track]]
name = "One"
url = "https://example.com/1.mp3"

[[track]]
name = "Two"
artist = "Duo"
url = "/music/2.ogg"
"#,
    )
    .unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].artist, None);
    assert_eq!(entries[1].artist.as_deref(), Some("Duo"));
    assert!(matches!(SourceRef::parse(&entries[1].url), SourceRef::Path(_)));
    assert!(matches!(SourceRef::parse(&entries[0].url), SourceRef::Remote(_)));
}

#[test]
fn builtin_manifest_has_three_featured_tracks() {
    assert_eq!(builtin_manifest().len(), 3);
    assert_eq!(load_manifest(None).unwrap().len(), 3);
}

#[test]
fn read_uploads_filters_unsupported_files_and_walks_directories() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("b.MP3"), b"not a real mp3").unwrap();
    fs::write(dir.path().join("c.txt"), b"ignore me").unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir_all(&sub).unwrap();
    fs::write(sub.join("a.ogg"), b"not a real ogg").unwrap();

    let tracks = read_uploads(&[dir.path().to_path_buf()], &LibrarySettings::default());
    let mut names: Vec<String> = tracks.iter().map(|t| t.name.clone()).collect();
    names.sort();
    assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    assert!(tracks.iter().all(|t| t.visibility == Visibility::Private));

    let direct = read_uploads(
        &[dir.path().join("c.txt"), dir.path().join("missing.mp3")],
        &LibrarySettings::default(),
    );
    assert!(direct.is_empty());
}

#[test]
fn split_pasted_paths_handles_quotes_escapes_and_uris() {
    let paths = split_pasted_paths("'/music/Song One.mp3' /music/Two\\ Words.ogg\nfile:///tmp/a%20b.wav");
    assert_eq!(
        paths,
        vec![
            PathBuf::from("/music/Song One.mp3"),
            PathBuf::from("/music/Two Words.ogg"),
            PathBuf::from("/tmp/a b.wav"),
        ]
    );
    assert!(split_pasted_paths("   ").is_empty());
    assert_eq!(
        split_pasted_paths("\"/x/y z.mp3\""),
        vec![Path::new("/x/y z.mp3").to_path_buf()]
    );
}

#[test]
fn generated_ids_are_unique() {
    let a = TrackId::generate();
    let b = TrackId::generate();
    assert_ne!(a, b);
}
