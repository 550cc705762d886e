//! Telegram API error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Telegram request failed: {0}")]
    Http(reqwest::Error),
    #[error("Telegram API error {code}: {description}")]
    Api { code: i64, description: String },
    #[error("Failed to decode Telegram response: {0}")]
    Decode(String),
    #[error("Telegram returned no download path for file {0}")]
    MissingFilePath(String),
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for TelegramError {
    fn from(e: reqwest::Error) -> Self {
        // Request URLs embed the bot token
        TelegramError::Http(e.without_url())
    }
}

impl TelegramError {
    pub fn api(code: Option<i64>, description: Option<String>) -> Self {
        TelegramError::Api {
            code: code.unwrap_or_default(),
            description: description.unwrap_or_else(|| "no description".to_string()),
        }
    }
}
