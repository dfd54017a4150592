//! Error type shared by the library, storage and playback layers.

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Manifest error: {0}")]
    Manifest(#[from] toml::de::Error),

    #[error("Audio output error: {0}")]
    Output(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Playback error: {0}")]
    Playback(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Global sharing is not configured (set [cloud] enabled = true and root)")]
    CloudNotConfigured,

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("An analyser is already attached to the media element")]
    AnalyserAttached,
}

impl AppError {
    /// Short machine-friendly name, used as a log/status prefix.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Io(_) => "io",
            AppError::Json(_) => "json",
            AppError::Manifest(_) => "manifest",
            AppError::Output(_) => "output",
            AppError::Decode(_) => "decode",
            AppError::Fetch(_) => "fetch",
            AppError::Playback(_) => "playback",
            AppError::Store(_) => "store",
            AppError::CloudNotConfigured => "cloud_not_configured",
            AppError::Upload(_) => "upload",
            AppError::AnalyserAttached => "analyser_attached",
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
