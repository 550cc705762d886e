//! Subset of the Bot API object model the bot reads and writes

use crate::funnel::ClientProfile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Incoming webhook update
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    /// Unix time the message was sent
    #[serde(default)]
    pub date: i64,
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub photo: Option<Vec<PhotoSize>>,
    #[serde(default)]
    pub reply_to_message: Option<Box<Message>>,
}

impl Message {
    /// The highest resolution variant of an attached photo
    pub fn largest_photo(&self) -> Option<&PhotoSize> {
        self.photo.as_ref()?.iter().max_by_key(|p| {
            (
                u64::from(p.width) * u64::from(p.height),
                p.file_size.unwrap_or(0),
            )
        })
    }

    pub fn sender_profile(&self) -> Option<ClientProfile> {
        let user = self.from.as_ref()?;
        Some(ClientProfile::new(
            user.id,
            user.first_name.clone(),
            user.username.clone(),
        ))
    }

    pub fn sent_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.date, 0).unwrap_or_else(Utc::now)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub file_size: Option<u64>,
}

/// Envelope around every Bot API response
#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i64>,
}

/// The only field of a sent message the bot keeps
#[derive(Debug, Deserialize)]
pub(crate) struct SentMessage {
    pub message_id: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct File {
    /// Absent when the file is too large to download
    pub file_path: Option<String>,
}

// Reply markup

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum ReplyMarkup {
    Keyboard {
        keyboard: Vec<Vec<KeyboardButton>>,
        resize_keyboard: bool,
        one_time_keyboard: bool,
    },
    Remove {
        remove_keyboard: bool,
    },
    Inline {
        inline_keyboard: Vec<Vec<InlineButton>>,
    },
}

#[derive(Debug, Serialize)]
pub(crate) struct KeyboardButton {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct InlineButton {
    pub text: String,
    pub url: String,
}
