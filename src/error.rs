use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while bringing companions up.
#[derive(Error, Debug)]
pub enum BuddyError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to access config file {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown companion skin: {0}")]
    UnknownSkin(String),

    #[error("Asset error: {0}")]
    Asset(String),

    #[error("Window creation failed: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("Event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("GPU error: {0}")]
    Gpu(String),

    #[cfg(any(windows, target_os = "macos"))]
    #[error("Audio output unavailable: {0}")]
    Audio(String),
}

impl From<toml::de::Error> for BuddyError {
    fn from(err: toml::de::Error) -> Self {
        BuddyError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = BuddyError::Config("volume out of range".to_string());
        assert!(err.to_string().contains("volume out of range"));

        let err = BuddyError::UnknownSkin("dogfriend".to_string());
        assert_eq!(err.to_string(), "Unknown companion skin: dogfriend");
    }
}
