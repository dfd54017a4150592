use std::path::PathBuf;

use crate::config::{self, Settings};
use crate::library::{TrackOrigin, TrackRepository, builtin_manifest, load_manifest, manifest_tracks};
use crate::store::{CloudFeed, DirCloud, DirStore, LocalStore};

/// Everything known at startup: the populated repository and whichever
/// persistence backends could be opened.
pub struct Library {
    pub repository: TrackRepository,
    pub store: Option<DirStore>,
    pub cloud: Option<DirCloud>,
    /// User-facing notes about degraded backends.
    pub notices: Vec<String>,
}

pub fn store_dir(settings: &Settings) -> Option<PathBuf> {
    settings
        .library
        .store_dir
        .clone()
        .or_else(|| config::default_data_dir().map(|d| d.join("songs")))
}

/// Populate the repository in order: manifest, persisted uploads, then the
/// shared feed's backlog.
pub fn build_library(settings: &Settings) -> Library {
    let mut repository = TrackRepository::new();
    let mut notices: Vec<String> = Vec::new();

    let entries = match load_manifest(settings.library.manifest_path.as_deref()) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("failed to load manifest, using built-in list: {e}");
            notices.push(format!("Manifest unreadable ({}), using built-in tracks", e.kind()));
            builtin_manifest()
        }
    };
    let added = repository.extend(manifest_tracks(entries));
    log::info!("{added} manifest track(s)");

    let store = if settings.library.persist {
        open_store(settings, &mut repository, &mut notices)
    } else {
        None
    };

    let cloud = if settings.cloud.enabled {
        connect_cloud(settings, &mut repository, &mut notices)
    } else {
        None
    };

    Library {
        repository,
        store,
        cloud,
        notices,
    }
}

fn open_store(
    settings: &Settings,
    repository: &mut TrackRepository,
    notices: &mut Vec<String>,
) -> Option<DirStore> {
    let Some(dir) = store_dir(settings) else {
        log::warn!("no data directory; private library is session-only");
        notices.push("No data directory: uploads are session-only".to_string());
        return None;
    };

    let stored = DirStore::open(&dir).and_then(|store| {
        let records = store.get_all()?;
        Ok((store, records))
    });
    match stored {
        Ok((store, records)) => {
            let added = repository.extend(
                records
                    .into_iter()
                    .map(|(record, bytes)| TrackOrigin::Persisted { record, bytes }.into_track()),
            );
            log::info!("{added} stored track(s) from {}", store.root().display());
            Some(store)
        }
        Err(e) => {
            log::warn!("local store at {} unavailable: {e}", dir.display());
            notices.push("Local library unavailable: uploads are session-only".to_string());
            None
        }
    }
}

fn connect_cloud(
    settings: &Settings,
    repository: &mut TrackRepository,
    notices: &mut Vec<String>,
) -> Option<DirCloud> {
    let mut cloud = match DirCloud::connect(&settings.cloud) {
        Ok(c) => c,
        Err(e) => {
            log::warn!("shared feed unavailable: {e}");
            notices.push(format!("Shared feed unavailable: {e}"));
            return None;
        }
    };

    match cloud.poll_added() {
        Ok(records) => {
            let added = repository.extend(
                records
                    .into_iter()
                    .map(|r| TrackOrigin::CloudShared(r).into_track()),
            );
            log::info!("{added} shared track(s) from {}", cloud.root().display());
        }
        Err(e) => log::warn!("reading shared feed failed: {e}"),
    }
    Some(cloud)
}
