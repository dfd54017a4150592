use crate::config::{self, Settings};

/// Load settings, degrading instead of failing: a bad config file never
/// keeps the player from starting.
pub fn load_settings() -> Settings {
    let source = config::resolve_config_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "environment".to_string());

    let mut settings = match Settings::load() {
        Ok(s) => s,
        Err(e) => {
            log::warn!("failed to load config from {source}, using defaults: {e}");
            return Settings::default();
        }
    };

    // Sharing without a destination only disables sharing.
    if settings.cloud.enabled && settings.cloud.root.is_none() {
        log::warn!("cloud.enabled is set without cloud.root; global sharing disabled");
        settings.cloud.enabled = false;
    }

    match settings.validate() {
        Ok(()) => {
            log::info!("settings loaded from {source}");
            settings
        }
        Err(msg) => {
            log::warn!("invalid config in {source}, using defaults: {msg}");
            Settings::default()
        }
    }
}
