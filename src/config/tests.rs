use super::load::{default_config_path, default_data_dir, resolve_config_path};
use super::schema::*;
use crate::library::Visibility;
use std::sync::{Mutex, OnceLock};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct EnvGuard {
    key: &'static str,
    old: Option<std::ffi::OsString>,
}

impl EnvGuard {
    fn set(key: &'static str, val: &str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::set_var(key, val);
        }
        Self { key, old }
    }

    fn remove(key: &'static str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::remove_var(key);
        }
        Self { key, old }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match self.old.take() {
            Some(v) => unsafe {
                std::env::set_var(self.key, v);
            },
            None => unsafe {
                std::env::remove_var(self.key);
            },
        }
    }
}

#[test]
fn resolve_config_path_prefers_letitsd_config_path() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("LETITSD_CONFIG_PATH", "/tmp/letitsd-test-config.toml");
    assert_eq!(
        resolve_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/letitsd-test-config.toml")
    );
}

#[test]
fn default_config_path_prefers_xdg_config_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_CONFIG_HOME", "/tmp/xdg-config-home");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-should-not-win");

    let p = default_config_path().unwrap();
    assert_eq!(
        p,
        std::path::PathBuf::from("/tmp/xdg-config-home")
            .join("letitsd")
            .join("config.toml")
    );
}

#[test]
fn default_data_dir_falls_back_to_home_local_share() {
    let _lock = env_lock();
    let _g1 = EnvGuard::remove("XDG_DATA_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");

    assert_eq!(
        default_data_dir().unwrap(),
        std::path::PathBuf::from("/tmp/home-dir/.local/share/letitsd")
    );
}

#[test]
fn defaults_accept_the_documented_upload_extensions() {
    let s = Settings::default();
    assert_eq!(s.library.extensions, vec!["mp3", "wav", "ogg", "m4a"]);
    assert!(matches!(s.playback.end_of_list, EndOfListSetting::Wrap));
    assert!(!s.cloud.enabled);
    assert!(s.validate().is_ok());
}

#[test]
fn settings_load_from_config_file_and_parse_aliases() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[audio]
volume = 0.5
fetch_timeout_secs = 7

[ui]
header_text = "hello"
initial_tab = "private"
now_playing_time_fields = ["elapsed", "remaining"]
now_playing_time_separator = " | "

[controls]
scrub_seconds = 9
volume_step = 0.1
mpris = false

[playback]
end_of_list = "stop-at-end"

[library]
extensions = ["mp3"]
manifest_path = "/tmp/manifest.toml"
persist = false

[visualizer]
enabled = false
fps = 30

[cloud]
enabled = true
root = "/tmp/shared"
chunk_size = 1024
poll_interval_ms = 500
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("LETITSD_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::remove("LETITSD__AUDIO__VOLUME");

    let s = Settings::load().unwrap();
    assert_eq!(s.audio.volume, 0.5);
    assert_eq!(s.audio.fetch_timeout_secs, 7);
    assert_eq!(s.ui.header_text, "hello");
    assert_eq!(s.ui.initial_tab, Visibility::Private);
    assert_eq!(s.ui.now_playing_time_fields.len(), 2);
    assert!(matches!(s.ui.now_playing_time_fields[1], TimeField::Remaining));
    assert_eq!(s.ui.now_playing_time_separator, " | ");
    assert_eq!(s.controls.scrub_seconds, 9);
    assert!(!s.controls.mpris);
    assert!(matches!(s.playback.end_of_list, EndOfListSetting::Stop));
    assert_eq!(s.library.extensions, vec!["mp3".to_string()]);
    assert_eq!(
        s.library.manifest_path.as_deref(),
        Some(std::path::Path::new("/tmp/manifest.toml"))
    );
    assert!(!s.library.persist);
    assert!(!s.visualizer.enabled);
    assert_eq!(s.visualizer.fps, 30);
    assert!(s.cloud.enabled);
    assert_eq!(s.cloud.chunk_size, 1024);
    assert_eq!(s.cloud.poll_interval_ms, 500);
    assert!(s.validate().is_ok());
}

#[test]
fn settings_env_overrides_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[controls]
scrub_seconds = 5
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("LETITSD_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::set("LETITSD__CONTROLS__SCRUB_SECONDS", "12");

    let s = Settings::load().unwrap();
    assert_eq!(s.controls.scrub_seconds, 12);
}

#[test]
fn validate_rejects_cloud_without_root() {
    let mut s = Settings::default();
    s.cloud.enabled = true;
    assert!(s.validate().is_err());

    s.cloud.root = Some("/tmp/shared".into());
    assert!(s.validate().is_ok());
}

#[test]
fn validate_rejects_out_of_range_volume_and_fps() {
    let mut s = Settings::default();
    s.audio.volume = 1.5;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.visualizer.fps = 0;
    assert!(s.validate().is_err());
}
