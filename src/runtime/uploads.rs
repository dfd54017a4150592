//! Upload workflow: ingest dropped files, then keep them private (local
//! store) or share them (cloud feed) on request.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;

use crate::app::App;
use crate::audio::MediaElement;
use crate::config::LibrarySettings;
use crate::error::AppResult;
use crate::library::{CloudRecord, TrackId, Visibility, now_millis, read_uploads};
use crate::player::PlaybackSession;
use crate::store::{CloudPublisher, LocalStore, record_for_upload};

/// Read, filter and append dropped or picked files as private uploads.
/// Returns how many tracks were added.
pub fn ingest_paths<M: MediaElement>(
    paths: &[PathBuf],
    library: &LibrarySettings,
    app: &mut App,
    session: &mut PlaybackSession<M>,
) -> usize {
    let uploads = read_uploads(paths, library);
    if uploads.is_empty() {
        app.set_status("No supported audio files found");
        return 0;
    }

    let ids: Vec<TrackId> = uploads.iter().map(|t| t.id.clone()).collect();
    let added = session.append_tracks(uploads);
    app.add_pending(ids.iter().cloned());
    app.show_tab(Visibility::Private, session.repository());

    if session.current_index().is_none() {
        let last = ids.last().and_then(|id| session.repository().index_of(id));
        if let Some(index) = last {
            session.load(index);
        }
    }

    log::info!("ingested {added} upload(s)");
    app.set_status(format!("Added {added} track(s); press S to save"));
    added
}

/// Write every pending upload to `store`. Returns `(saved, failed)`; failures
/// are logged per track, stay pending and keep their bytes for a retry.
pub fn save_local<M: MediaElement>(
    store: &mut dyn LocalStore,
    app: &mut App,
    session: &mut PlaybackSession<M>,
) -> (usize, usize) {
    let ids = app.take_pending();
    let mut saved = 0;
    let mut failed = 0;
    let timestamp = now_millis();

    for (offset, id) in ids.iter().enumerate() {
        let record = session
            .repository()
            .by_id(id)
            .and_then(|t| record_for_upload(t, timestamp + offset as u64));
        let Some((record, bytes)) = record else {
            continue;
        };
        match store.add(&record, &bytes) {
            Ok(()) => {
                saved += 1;
                session.release_raw_bytes(id);
            }
            Err(e) => {
                failed += 1;
                log::warn!("saving {} failed: {e}", record.name);
                app.add_pending([id.clone()]);
            }
        }
    }
    (saved, failed)
}

/// One upload handed to the publish worker.
pub struct PublishJob {
    pub id: TrackId,
    pub file_name: String,
    pub name: String,
    pub artist: Option<String>,
    pub size_label: String,
    pub bytes: Arc<[u8]>,
}

impl PublishJob {
    pub fn from_pending<M: MediaElement>(
        ids: &[TrackId],
        session: &PlaybackSession<M>,
    ) -> Vec<PublishJob> {
        ids.iter()
            .filter_map(|id| session.repository().by_id(id))
            .filter_map(|t| {
                let bytes = t.raw_bytes.clone()?;
                Some(PublishJob {
                    id: t.id.clone(),
                    file_name: t.name.clone(),
                    name: t.name.clone(),
                    artist: t.artist.clone(),
                    size_label: t.size_label.clone(),
                    bytes,
                })
            })
            .collect()
    }
}

/// Move every pending upload into a new publish batch. The tracks keep their
/// raw bytes until the worker reports them published. Returns `None` when no
/// pending upload still has bytes to send.
pub fn begin_share<M: MediaElement>(
    app: &mut App,
    session: &PlaybackSession<M>,
) -> Option<(u64, Vec<PublishJob>)> {
    let ids = app.take_pending();
    let jobs = PublishJob::from_pending(&ids, session);
    if jobs.is_empty() {
        return None;
    }
    let generation = app.begin_publish();
    log::info!("publishing {} track(s) as batch {generation}", jobs.len());
    Some((generation, jobs))
}

#[derive(Debug, Clone, PartialEq)]
pub enum PublishEvent {
    Started { file_name: String },
    Progress { fraction: f32 },
    /// `id` is the local upload the record was made from.
    Published { id: TrackId, record: CloudRecord },
    Failed {
        id: TrackId,
        file_name: String,
        error: String,
    },
    Finished { published: usize, failed: usize },
}

/// Worker message, tagged with the batch it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishMsg {
    pub generation: u64,
    pub event: PublishEvent,
}

/// Upload and publish `jobs` one after another on a worker thread.
pub fn spawn_publish<P>(publisher: P, generation: u64, jobs: Vec<PublishJob>, tx: Sender<PublishMsg>)
where
    P: CloudPublisher + 'static,
{
    thread::spawn(move || run_publish(&publisher, generation, jobs, &tx));
}

pub(crate) fn run_publish(
    publisher: &dyn CloudPublisher,
    generation: u64,
    jobs: Vec<PublishJob>,
    tx: &Sender<PublishMsg>,
) {
    let send = |event: PublishEvent| {
        let _ = tx.send(PublishMsg { generation, event });
    };

    let mut published = 0;
    let mut failed = 0;
    for job in jobs {
        send(PublishEvent::Started {
            file_name: job.file_name.clone(),
        });
        match publish_one(publisher, &job, &mut |fraction| {
            send(PublishEvent::Progress { fraction })
        }) {
            Ok(record) => {
                published += 1;
                send(PublishEvent::Published {
                    id: job.id.clone(),
                    record,
                });
            }
            Err(e) => {
                failed += 1;
                log::warn!("sharing {} failed: {e}", job.file_name);
                send(PublishEvent::Failed {
                    id: job.id.clone(),
                    file_name: job.file_name.clone(),
                    error: e.to_string(),
                });
            }
        }
    }
    send(PublishEvent::Finished { published, failed });
}

fn publish_one(
    publisher: &dyn CloudPublisher,
    job: &PublishJob,
    progress: &mut dyn FnMut(f32),
) -> AppResult<CloudRecord> {
    let url = publisher.upload(&job.file_name, &job.bytes, progress)?;
    let record = CloudRecord {
        id: TrackId::generate(),
        name: job.name.clone(),
        artist: job.artist.clone(),
        url,
        size_label: Some(job.size_label.clone()),
        created_at_ms: now_millis(),
    };
    publisher.publish(&record)?;
    Ok(record)
}

/// Apply a worker message. A published upload drops its raw bytes; a failed
/// one goes back to pending so it can be saved or shared again. Messages from
/// an older batch only do that bookkeeping and leave the view alone.
/// Returns true when the view changed.
pub fn apply_publish_msg<M: MediaElement>(
    app: &mut App,
    session: &mut PlaybackSession<M>,
    msg: PublishMsg,
) -> bool {
    match &msg.event {
        PublishEvent::Published { id, .. } => session.release_raw_bytes(id),
        PublishEvent::Failed { id, .. } => app.add_pending([id.clone()]),
        _ => {}
    }

    if !app.is_current_generation(msg.generation) {
        log::debug!("ignoring stale publish message from batch {}", msg.generation);
        return false;
    }
    match msg.event {
        PublishEvent::Started { file_name } => {
            app.upload = Some(crate::app::UploadOverlay {
                file_name,
                progress: 0.0,
            });
        }
        PublishEvent::Progress { fraction } => {
            if let Some(overlay) = app.upload.as_mut() {
                overlay.progress = fraction.clamp(0.0, 1.0);
            }
        }
        PublishEvent::Published { record, .. } => {
            app.upload = None;
            app.set_status(format!("Shared {}", record.name));
        }
        PublishEvent::Failed {
            file_name, error, ..
        } => {
            app.upload = None;
            app.set_status(format!("Sharing {file_name} failed: {error}"));
        }
        PublishEvent::Finished { published, failed } => {
            app.upload = None;
            if failed > 0 {
                app.set_status(format!("Shared {published} track(s), {failed} failed"));
            } else {
                app.set_status(format!("Shared {published} track(s)"));
            }
        }
    }
    true
}
