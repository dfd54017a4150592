use std::path::PathBuf;

use serde::Deserialize;

use crate::library::Visibility;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/letitsd/config.toml` or `~/.config/letitsd/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `LETITSD__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub audio: AudioSettings,
    pub ui: UiSettings,
    pub controls: ControlsSettings,
    pub playback: PlaybackSettings,
    pub library: LibrarySettings,
    pub visualizer: VisualizerSettings,
    pub cloud: CloudSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Initial output volume in `[0.0, 1.0]`.
    pub volume: f32,
    /// How long to wait for a remote track to download before giving up (seconds).
    pub fetch_timeout_secs: u64,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            volume: 1.0,
            fetch_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// The text rendered inside the top header box.
    pub header_text: String,

    /// Which library tab is shown on startup.
    pub initial_tab: Visibility,

    /// Which time fields to show in the now-playing box, and in what order.
    ///
    /// Example: ["elapsed", "total", "remaining"]
    pub now_playing_time_fields: Vec<TimeField>,

    /// Separator used to join `now_playing_time_fields`.
    pub now_playing_time_separator: String,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            header_text: " ~ Let It SD ~ ".to_string(),
            initial_tab: Visibility::Public,
            now_playing_time_fields: vec![TimeField::Elapsed, TimeField::Total],
            now_playing_time_separator: " / ".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControlsSettings {
    /// Number of seconds to scrub when pressing `H` / `L`.
    pub scrub_seconds: u64,
    /// Volume change applied by `-` / `+`.
    pub volume_step: f32,
    /// Expose play/pause/next/previous over MPRIS (D-Bus media keys).
    pub mpris: bool,
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self {
            scrub_seconds: 5,
            volume_step: 0.05,
            mpris: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// What happens when the last track of the library ends.
    pub end_of_list: EndOfListSetting,
}

#[derive(Debug, Copy, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EndOfListSetting {
    #[default]
    #[serde(alias = "loop", alias = "loop-all", alias = "loop_all", alias = "wrap-around")]
    Wrap,
    #[serde(alias = "no-loop", alias = "no_loop", alias = "stop-at-end")]
    Stop,
}

#[derive(Debug, Copy, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeField {
    Elapsed,
    Total,
    Remaining,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// File extensions accepted for upload (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Optional TOML manifest of public tracks. The built-in list is used when unset.
    pub manifest_path: Option<PathBuf>,
    /// Where saved private tracks live. Defaults to `$XDG_DATA_HOME/letitsd/songs`.
    pub store_dir: Option<PathBuf>,
    /// Set to false to keep every upload session-only.
    pub persist: bool,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            extensions: vec!["mp3".into(), "wav".into(), "ogg".into(), "m4a".into()],
            manifest_path: None,
            store_dir: None,
            persist: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VisualizerSettings {
    pub enabled: bool,
    /// Target redraw rate of the spectrum while playing.
    pub fps: u32,
}

impl Default for VisualizerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            fps: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CloudSettings {
    /// Global sharing is off unless explicitly enabled.
    pub enabled: bool,
    /// Shared directory holding `objects/` and `feed.jsonl`.
    pub root: Option<PathBuf>,
    /// Bytes copied per progress step during an upload.
    pub chunk_size: usize,
    /// How often the shared feed is checked for new tracks (milliseconds).
    pub poll_interval_ms: u64,
}

impl Default for CloudSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            root: None,
            chunk_size: 256 * 1024,
            poll_interval_ms: 2000,
        }
    }
}
