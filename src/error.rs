//! Error types for feedwatch operations

use thiserror::Error;

pub type Result<T> = std::result::Result<T, WatchError>;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Environment file error: {0}")]
    EnvFile(#[from] dotenvy::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Feed request failed with status {status}")]
    FeedStatus { status: u16 },

    #[error("Channel {channel_id} is not available: {reason}")]
    ChannelUnavailable { channel_id: String, reason: String },

    #[error("Message send failed with status {status}: {body}")]
    SendStatus { status: u16, body: String },

    #[error("Snapshot does not match row layout '{layout}': {violations} row(s) out of range")]
    Schema { layout: String, violations: usize },
}

impl WatchError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn channel_unavailable(channel_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ChannelUnavailable {
            channel_id: channel_id.into(),
            reason: reason.into(),
        }
    }

    pub fn send_status(status: u16, body: impl Into<String>) -> Self {
        Self::SendStatus {
            status,
            body: body.into(),
        }
    }

    /// Whether the next poll is expected to clear this error without intervention
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::FeedStatus { .. } | Self::SendStatus { .. }
        )
    }
}
