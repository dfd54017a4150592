//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

mod spectrum;

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Padding, Paragraph, Tabs, Wrap},
};
use std::{collections::BTreeMap, sync::LazyLock};

use crate::app::{App, InputMode, UploadOverlay};
use crate::audio::MediaElement;
use crate::config::{ControlsSettings, TimeField, UiSettings};
use crate::library::{ArtGlyph, Visibility};
use crate::player::{NowPlaying, PlaybackSession, format_time, remaining};

pub use spectrum::SpectrumWidget;

const ACCENT: Color = Color::Rgb(0x8b, 0x5c, 0xf6);

static CONTROLS_MAP: LazyLock<BTreeMap<String, String>> = LazyLock::new(|| {
    let mut map: BTreeMap<String, String> = BTreeMap::new();
    map.insert("j/k".to_string(), "up/down".to_string());
    map.insert("gg/G".to_string(), "top/bottom".to_string());
    map.insert("enter".to_string(), "play selected".to_string());
    map.insert("space/p".to_string(), "play/pause".to_string());
    map.insert("h/l".to_string(), "prev/next".to_string());
    // H/L and -/+ are filled dynamically from config.
    map.insert("0-9".to_string(), "seek to tenth".to_string());
    map.insert("tab".to_string(), "public/private".to_string());
    map.insert("o".to_string(), "open file".to_string());
    map.insert("S".to_string(), "save uploads".to_string());
    map.insert("q".to_string(), "quit".to_string());
    map
});

/// Render the controls help text, incorporating scrub seconds and volume step.
fn controls_text(controls: &ControlsSettings) -> String {
    // Keep the rendered order stable and human-friendly.
    let order = [
        "j/k", "h/l", "H/L", "enter", "space/p", "0-9", "-/+", "tab", "gg/G", "o", "S", "q",
    ];
    order
        .iter()
        .filter_map(|k| match *k {
            "H/L" => Some(format!("[H/L] scrub -/+{}s", controls.scrub_seconds)),
            "-/+" => Some(format!(
                "[-/+] volume -/+{}%",
                (controls.volume_step * 100.0).round() as u32
            )),
            _ => CONTROLS_MAP.get(*k).map(|v| format!("[{}] {}", k, v)),
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Build the now-playing time text (elapsed/total/remaining) per `UiSettings`.
fn now_playing_time_text(np: &NowPlaying, ui: &UiSettings) -> Option<String> {
    if ui.now_playing_time_fields.is_empty() {
        return None;
    }

    let parts: Vec<String> = ui
        .now_playing_time_fields
        .iter()
        .map(|f| match f {
            TimeField::Elapsed => np.elapsed.clone(),
            TimeField::Total => np.duration.clone(),
            TimeField::Remaining => {
                format!("-{}", format_time(remaining(np.elapsed_secs, np.duration_secs)))
            }
        })
        .collect();

    Some(parts.join(&ui.now_playing_time_separator))
}

fn art_symbol(art: ArtGlyph) -> &'static str {
    match art {
        ArtGlyph::Uploaded => "⇪",
        ArtGlyph::Note => "♫",
    }
}

/// Fraction of the track already played, `0.0` while the duration is unknown.
fn progress_ratio(np: &NowPlaying) -> f64 {
    if np.duration_secs.is_finite() && np.duration_secs > 0.0 {
        (np.elapsed_secs / np.duration_secs).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    // Keep the popup smaller and avoid covering the entire UI.
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(5);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

fn left_padded(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .padding(Padding {
            left: 1,
            right: 0,
            top: 0,
            bottom: 0,
        })
}

/// Render the entire UI into the provided `frame`.
pub fn draw<M: MediaElement>(
    frame: &mut Frame,
    app: &App,
    session: &PlaybackSession<M>,
    ui_settings: &UiSettings,
    controls_settings: &ControlsSettings,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(6),
            Constraint::Length(10),
            Constraint::Min(5),
            Constraint::Length(4),
        ])
        .split(frame.area());

    // Header
    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" letitsd ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    draw_now_playing(frame, chunks[1], session, ui_settings);

    let spectrum_title = if session.visualizer().is_enabled() {
        " spectrum "
    } else {
        " spectrum (off) "
    };
    let spectrum = SpectrumWidget::new(session.visualizer().bins())
        .block(Block::default().borders(Borders::ALL).title(spectrum_title));
    frame.render_widget(spectrum, chunks[2]);

    draw_library(frame, chunks[3], app, session);

    match &app.mode {
        InputMode::Normal => {}
        InputMode::OpenPath(input) => draw_open_prompt(frame, chunks[3], input),
        InputMode::SaveChoice => draw_save_choice(frame, chunks[3], app),
        InputMode::Message(message) => draw_message(frame, chunks[3], message),
    }
    if let Some(upload) = &app.upload {
        draw_upload_overlay(frame, chunks[3], upload);
    }

    let mut footer_lines = vec![Line::from(controls_text(controls_settings))];
    if let Some(status) = &app.status {
        footer_lines.push(Line::from(Span::styled(
            status.as_str(),
            Style::default().fg(Color::Yellow),
        )));
    }
    let footer = Paragraph::new(footer_lines)
        .block(left_padded(" controls "))
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[4]);
}

fn draw_now_playing<M: MediaElement>(
    frame: &mut Frame,
    area: Rect,
    session: &PlaybackSession<M>,
    ui: &UiSettings,
) {
    let block = left_padded(" now playing ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(1)])
        .split(inner);

    let volume = format!("Vol: {}%", (session.volume() * 100.0).round() as u32);
    let Some(np) = session.now_playing() else {
        let idle = Paragraph::new(vec![
            Line::from("No track loaded"),
            Line::from(""),
            Line::from(volume),
        ])
        .dim();
        frame.render_widget(idle, rows[0]);
        return;
    };

    let state = if np.playing { "Playing" } else { "Paused" };
    let mut third = vec![Span::raw(state.to_string())];
    if let Some(time) = now_playing_time_text(&np, ui) {
        third.push(Span::raw(format!(" [{time}]")));
    }
    third.push(Span::raw(format!(" • {volume}")));

    let text = vec![
        Line::from(vec![
            Span::styled(
                format!("{} ", art_symbol(np.art)),
                Style::default().fg(ACCENT),
            ),
            Span::styled(np.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
        ]),
        Line::from(np.artist.clone()).italic(),
        Line::from(third),
    ];
    frame.render_widget(Paragraph::new(text), rows[0]);

    let gauge = Gauge::default()
        .ratio(progress_ratio(&np))
        .label(format!("{} / {}", np.elapsed, np.duration))
        .gauge_style(Style::default().fg(ACCENT));
    frame.render_widget(gauge, rows[1]);
}

fn draw_library<M: MediaElement>(
    frame: &mut Frame,
    area: Rect,
    app: &App,
    session: &PlaybackSession<M>,
) {
    let repo = session.repository();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let (public, private) = App::tab_counts(repo);
    let tabs = Tabs::new(vec![
        format!(" {} ({public}) ", Visibility::Public.label()),
        format!(" {} ({private}) ", Visibility::Private.label()),
    ])
    .select(match app.tab {
        Visibility::Public => 0,
        Visibility::Private => 1,
    })
    .highlight_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD));
    frame.render_widget(tabs, chunks[0]);

    let display = app.visible_indices(repo);

    // Center the selected item when possible by creating a visible window.
    // Only build ListItems for the visible window.
    let total = display.len();
    let list_height = chunks[1].height.saturating_sub(2) as usize;
    let sel_pos = app
        .selected
        .and_then(|s| display.iter().position(|&i| i == s))
        .unwrap_or(0);
    let (start, end, selected_pos_in_visible) = if total <= list_height || list_height == 0 {
        (0, total, sel_pos)
    } else {
        let half = list_height / 2;
        let mut start = sel_pos.saturating_sub(half);
        if start + list_height > total {
            start = total - list_height;
        }
        (start, start + list_height, sel_pos - start)
    };

    let current = session.current_index();
    let pending = app.pending();
    let visible_items: Vec<ListItem> = display[start..end]
        .iter()
        .filter_map(|&i| repo.get(i).map(|t| (i, t)))
        .map(|(i, track)| {
            let marker = match (current == Some(i), session.is_playing()) {
                (true, true) => "▶ ",
                (true, false) => "⏸ ",
                _ => "  ",
            };
            let unsaved = if pending.contains(&track.id) { " *" } else { "" };
            let mut line = Line::from(vec![
                Span::raw(marker),
                Span::raw(track.name.clone()),
                Span::raw(unsaved),
                Span::styled(
                    format!("  {} • {}", track.artist_or_unknown(), track.size_label),
                    Style::default().dim(),
                ),
            ]);
            if current == Some(i) {
                line = line.fg(ACCENT);
            }
            ListItem::new(line)
        })
        .collect();

    let title = if total == 0 && app.tab == Visibility::Private {
        " tracks (drop or open audio files to add) "
    } else {
        " tracks "
    };
    let list = List::new(visible_items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ratatui::widgets::ListState::default();
    if total > 0 {
        state.select(Some(selected_pos_in_visible));
    }
    frame.render_stateful_widget(list, chunks[1], &mut state);
}

fn draw_open_prompt(frame: &mut Frame, area: Rect, input: &str) {
    let popup_area = centered_rect_sized(72, 5, area);
    frame.render_widget(Clear, popup_area);
    let prompt = Paragraph::new(vec![
        Line::from(format!("{input}_")),
        Line::from("enter: add • esc: cancel").dim(),
    ])
    .block(left_padded(" open file or directory "));
    frame.render_widget(prompt, popup_area);
}

fn draw_save_choice(frame: &mut Frame, area: Rect, app: &App) {
    let popup_area = centered_rect_sized(56, 7, area);
    frame.render_widget(Clear, popup_area);

    let count = app.pending().len();
    let local = if app.store_available {
        Line::from("[l] keep private (local)")
    } else {
        Line::from("[l] keep private (session only, store unavailable)").dim()
    };
    let cloud = if app.cloud_available {
        Line::from("[c] share globally (cloud)")
    } else {
        Line::from("[c] share globally (not configured)").dim()
    };
    let body = Paragraph::new(vec![
        Line::from(format!("{count} new track(s) not saved yet")),
        local,
        cloud,
    ])
    .block(left_padded(" save uploads (esc cancels) "));
    frame.render_widget(body, popup_area);
}

fn draw_message(frame: &mut Frame, area: Rect, message: &str) {
    let popup_area = centered_rect_sized(60, 6, area);
    frame.render_widget(Clear, popup_area);
    let body = Paragraph::new(message)
        .block(left_padded(" notice (any key) "))
        .wrap(Wrap { trim: true });
    frame.render_widget(body, popup_area);
}

fn draw_upload_overlay(frame: &mut Frame, area: Rect, upload: &UploadOverlay) {
    let popup_area = centered_rect_sized(56, 5, area);
    frame.render_widget(Clear, popup_area);
    let block = left_padded(" uploading ");
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(inner);
    frame.render_widget(Paragraph::new(upload.file_name.as_str()), rows[0]);
    let gauge = Gauge::default()
        .ratio(upload.progress.clamp(0.0, 1.0) as f64)
        .label(format!("{:.0}%", upload.progress * 100.0))
        .gauge_style(Style::default().fg(ACCENT));
    frame.render_widget(gauge, rows[1]);
}
