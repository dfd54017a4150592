use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::{App, InputMode};
use crate::audio::MediaElement;
use crate::config;
use crate::error::AppError;
use crate::library::{TrackOrigin, split_pasted_paths};
use crate::mpris::{ControlCmd, MprisHandle};
use crate::player::{PlaybackSession, PlaybackState, SeekTarget, SessionEvent};
use crate::runtime::mpris_sync::update_mpris;
use crate::runtime::uploads::{
    PublishMsg, apply_publish_msg, begin_share, ingest_paths, save_local, spawn_publish,
};
use crate::store::{CloudFeed, DirCloud, DirStore};
use crate::ui;

const IDLE_POLL: Duration = Duration::from_millis(100);

/// Backends and channels the loop talks to besides the session.
pub struct Services {
    pub store: Option<DirStore>,
    pub cloud: Option<DirCloud>,
    pub mpris: Option<MprisHandle>,
    pub control_tx: mpsc::Sender<ControlCmd>,
    pub control_rx: mpsc::Receiver<ControlCmd>,
    pub session_rx: mpsc::Receiver<SessionEvent>,
    pub publish_tx: mpsc::Sender<PublishMsg>,
    pub publish_rx: mpsc::Receiver<PublishMsg>,
}

/// State tracked by the runtime event loop across iterations.
pub struct EventLoopState {
    /// Internal two-key prefix state used for `gg` handling.
    pub pending_gg: bool,
    /// Last-known playing index as emitted to MPRIS.
    pub last_mpris_index: Option<usize>,
    /// Last-known playback state as emitted to MPRIS.
    pub last_mpris_playback: PlaybackState,
    last_cloud_poll: Instant,
}

impl EventLoopState {
    pub fn new() -> Self {
        Self {
            pending_gg: false,
            last_mpris_index: None,
            last_mpris_playback: PlaybackState::Empty,
            last_cloud_poll: Instant::now(),
        }
    }
}

/// Main terminal event loop: handles input, UI drawing, media and worker
/// notifications and MPRIS. Returns `Ok(())` when shutdown is requested.
pub fn run<M: MediaElement>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    session: &mut PlaybackSession<M>,
    services: &mut Services,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        if sync_session(&services.control_rx, session) {
            return Ok(());
        }

        while let Ok(event) = services.session_rx.try_recv() {
            app.on_session_event(&event, session.repository());
        }

        while let Ok(msg) = services.publish_rx.try_recv() {
            apply_publish_msg(app, session, msg);
        }

        poll_cloud(settings, session, services, state);

        // Keep MPRIS in sync even when playback changes come from media keys or auto-advance.
        if let Some(mpris) = &services.mpris {
            let index = session.current_index();
            let playback = session.state();
            if index != state.last_mpris_index || playback != state.last_mpris_playback {
                update_mpris(mpris, session);
                state.last_mpris_index = index;
                state.last_mpris_playback = playback;
            }
        }

        session.visualizer_mut().tick(Instant::now());

        terminal.draw(|f| ui::draw(f, app, session, &settings.ui, &settings.controls))?;

        let timeout = if session.visualizer().is_running() {
            session.visualizer().frame_interval()
        } else {
            IDLE_POLL
        };
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if handle_key_event(key, settings, app, session, services, state) {
                        break;
                    }
                }
                Event::Paste(text) => handle_paste(&text, settings, app, session),
                _ => {}
            }
        }
    }

    Ok(())
}

/// Run queued transport commands, then react to media notifications.
/// Commands go first so a queued Next acts on the track the user saw.
/// Returns true when shutdown was requested.
pub(crate) fn sync_session<M: MediaElement>(
    control_rx: &mpsc::Receiver<ControlCmd>,
    session: &mut PlaybackSession<M>,
) -> bool {
    while let Ok(cmd) = control_rx.try_recv() {
        if handle_control_cmd(cmd, session) {
            return true;
        }
    }
    session.pump_media_events();
    false
}

/// Enter on a track: toggle it when it is the loaded one, otherwise load and
/// play it.
pub(crate) fn activate_selected<M: MediaElement>(app: &mut App, session: &mut PlaybackSession<M>) {
    app.ensure_selected_visible(session.repository());
    let Some(index) = app.selected else {
        return;
    };
    app.follow_playback = true;
    let r = if session.current_index() == Some(index) {
        session.toggle_playback()
    } else {
        session.load(index);
        session.play()
    };
    report(r, session);
}

fn poll_cloud<M: MediaElement>(
    settings: &config::Settings,
    session: &mut PlaybackSession<M>,
    services: &mut Services,
    state: &mut EventLoopState,
) {
    let Some(cloud) = services.cloud.as_mut() else {
        return;
    };
    let interval = Duration::from_millis(settings.cloud.poll_interval_ms);
    if state.last_cloud_poll.elapsed() < interval {
        return;
    }
    state.last_cloud_poll = Instant::now();

    match cloud.poll_added() {
        Ok(records) if !records.is_empty() => {
            let added = session.append_tracks(
                records
                    .into_iter()
                    .map(|r| TrackOrigin::CloudShared(r).into_track()),
            );
            if added > 0 {
                log::info!("{added} new shared track(s)");
            }
        }
        Ok(_) => {}
        Err(e) => log::warn!("polling shared feed failed: {e}"),
    }
}

fn report<M: MediaElement>(result: crate::error::AppResult<()>, session: &PlaybackSession<M>) {
    if let Err(e) = result {
        log::debug!("{} while at {:?}: {e}", e.kind(), session.current_index());
    }
}

/// Returns true when the process should exit.
fn handle_control_cmd<M: MediaElement>(cmd: ControlCmd, session: &mut PlaybackSession<M>) -> bool {
    match cmd {
        ControlCmd::Quit => return true,
        ControlCmd::Play => {
            let r = session.play();
            report(r, session);
        }
        ControlCmd::Pause => session.pause(),
        ControlCmd::PlayPause => {
            let r = session.toggle_playback();
            report(r, session);
        }
        ControlCmd::Stop => {
            session.pause();
            session.seek(SeekTarget::Seconds(0.0));
        }
        ControlCmd::Next => {
            let r = session.next();
            report(r, session);
        }
        ControlCmd::Prev => {
            let r = session.previous();
            report(r, session);
        }
    }
    false
}

fn handle_paste<M: MediaElement>(
    text: &str,
    settings: &config::Settings,
    app: &mut App,
    session: &mut PlaybackSession<M>,
) {
    if matches!(app.mode, InputMode::OpenPath(_)) {
        app.push_prompt_str(text.trim_end_matches(['\r', '\n']));
        return;
    }
    let paths = split_pasted_paths(text);
    if !paths.is_empty() {
        ingest_paths(&paths, &settings.library, app, session);
    }
}

/// Returns true when the process should exit.
fn handle_key_event<M: MediaElement>(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App,
    session: &mut PlaybackSession<M>,
    services: &mut Services,
    state: &mut EventLoopState,
) -> bool {
    match app.mode.clone() {
        InputMode::Message(_) => {
            app.close_popup();
            return false;
        }
        InputMode::OpenPath(_) => {
            match key.code {
                KeyCode::Esc => app.close_popup(),
                KeyCode::Backspace => app.pop_prompt_char(),
                KeyCode::Enter => {
                    if let Some(input) = app.take_prompt() {
                        let paths = split_pasted_paths(&input);
                        if !paths.is_empty() {
                            ingest_paths(&paths, &settings.library, app, session);
                        }
                    }
                }
                KeyCode::Char(c) if !c.is_control() => app.push_prompt_char(c),
                _ => {}
            }
            return false;
        }
        InputMode::SaveChoice => {
            match key.code {
                KeyCode::Char('l') => {
                    app.close_popup();
                    keep_private(app, session, services);
                }
                KeyCode::Char('c') => {
                    app.close_popup();
                    share_globally(app, session, services);
                }
                KeyCode::Esc | KeyCode::Char('q') => app.close_popup(),
                _ => {}
            }
            return false;
        }
        InputMode::Normal => {}
    }

    let repo_len = session.repository().len();
    if key.code != KeyCode::Char('g') {
        state.pending_gg = false;
    }

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Tab | KeyCode::BackTab => app.toggle_tab(session.repository()),
        KeyCode::Char('o') => app.open_path_prompt(),
        KeyCode::Char('S') => {
            if app.has_pending() {
                app.mode = InputMode::SaveChoice;
            } else {
                app.set_status("Nothing to save");
            }
        }
        KeyCode::Char('g') => {
            if state.pending_gg {
                state.pending_gg = false;
                app.select_first(session.repository());
            } else {
                state.pending_gg = true;
            }
        }
        KeyCode::Char('G') => app.select_last(session.repository()),
        KeyCode::Char('j') | KeyCode::Down => app.select_next(session.repository()),
        KeyCode::Char('k') | KeyCode::Up => app.select_prev(session.repository()),
        KeyCode::Enter => activate_selected(app, session),
        KeyCode::Char('p') | KeyCode::Char(' ') => {
            let _ = services.control_tx.send(ControlCmd::PlayPause);
        }
        KeyCode::Char('l') | KeyCode::Right if repo_len > 0 => {
            app.follow_playback = true;
            let _ = services.control_tx.send(ControlCmd::Next);
        }
        KeyCode::Char('h') | KeyCode::Left if repo_len > 0 => {
            app.follow_playback = true;
            let _ = services.control_tx.send(ControlCmd::Prev);
        }
        KeyCode::Char('L') => {
            session.seek(SeekTarget::Relative(settings.controls.scrub_seconds as f64));
        }
        KeyCode::Char('H') => {
            session.seek(SeekTarget::Relative(-(settings.controls.scrub_seconds as f64)));
        }
        KeyCode::Char(c @ '0'..='9') => {
            let tenth = c.to_digit(10).unwrap_or(0) as f64;
            session.seek(SeekTarget::Fraction(tenth / 10.0));
        }
        KeyCode::Char('-') => {
            let v = session.volume() - settings.controls.volume_step;
            session.set_volume(v);
        }
        KeyCode::Char('+') | KeyCode::Char('=') => {
            let v = session.volume() + settings.controls.volume_step;
            session.set_volume(v);
        }
        _ => {}
    }

    false
}

fn keep_private<M: MediaElement>(
    app: &mut App,
    session: &mut PlaybackSession<M>,
    services: &mut Services,
) {
    let Some(store) = services.store.as_mut() else {
        app.take_pending();
        app.set_status("Local library unavailable: tracks stay for this session only");
        return;
    };
    let (saved, failed) = save_local(store, app, session);
    if failed > 0 {
        app.set_status(format!("Saved {saved} track(s), {failed} failed (see log)"));
    } else {
        app.set_status(format!("Saved {saved} track(s) to your library"));
    }
}

fn share_globally<M: MediaElement>(
    app: &mut App,
    session: &mut PlaybackSession<M>,
    services: &mut Services,
) {
    let Some(cloud) = services.cloud.clone() else {
        // Nothing is sent and pending uploads stay pending.
        app.show_message(AppError::CloudNotConfigured.to_string());
        return;
    };

    let Some((generation, jobs)) = begin_share(app, session) else {
        app.set_status("Nothing to share");
        return;
    };
    spawn_publish(cloud, generation, jobs, services.publish_tx.clone());
}
