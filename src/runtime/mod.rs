use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{DisableBracketedPaste, EnableBracketedPaste};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::App;
use crate::audio::RodioMedia;
use crate::config;
use crate::mpris::ControlCmd;
use crate::player::{EndOfList, PlaybackSession};
use crate::runtime::uploads::PublishMsg;
use crate::visualizer::Visualizer;

mod event_loop;
mod logging;
mod mpris_sync;
mod settings;
mod startup;
mod uploads;

#[cfg(test)]
mod tests;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let log_path = logging::init_logging(config::default_state_dir().as_deref());
    let settings = settings::load_settings();
    if let Some(path) = &log_path {
        log::info!("letitsd starting, logging to {}", path.display());
    }

    let library = startup::build_library(&settings);

    let media = RodioMedia::open(
        settings.audio.volume,
        Duration::from_secs(settings.audio.fetch_timeout_secs),
    )?;
    let visualizer = Visualizer::new(&settings.visualizer);
    let mut session = PlaybackSession::new(
        library.repository,
        media,
        visualizer,
        EndOfList::from(settings.playback.end_of_list),
    );
    let session_rx = session.subscribe();

    let mut app = App::new(settings.ui.initial_tab);
    app.store_available = library.store.is_some();
    app.cloud_available = library.cloud.is_some();
    if let Some(notice) = library.notices.first() {
        app.set_status(notice.clone());
    }

    // Bind the first track so the player is ready; playing waits for the user.
    if !session.repository().is_empty() {
        session.load(0);
    }
    app.ensure_selected_visible(session.repository());

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let mpris = settings
        .controls
        .mpris
        .then(|| crate::mpris::spawn_mpris(control_tx.clone()));
    let (publish_tx, publish_rx) = mpsc::channel::<PublishMsg>();

    let mut services = event_loop::Services {
        store: library.store,
        cloud: library.cloud,
        mpris,
        control_tx,
        control_rx,
        session_rx,
        publish_tx,
        publish_rx,
    };

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result: Result<(), Box<dyn std::error::Error>> = (|| {
        let mut state = event_loop::EventLoopState::new();
        event_loop::run(
            &mut terminal,
            &settings,
            &mut app,
            &mut session,
            &mut services,
            &mut state,
        )
    })();

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    if let Err(e) = &run_result {
        log::error!("event loop failed: {e}");
    }
    log::info!("letitsd exiting");
    run_result
}
