//! Funnel runtime
//!
//! Routes decoded inbound messages through the state machine, commits the
//! resulting stage under the registry lock and executes effects against the
//! collaborators after the lock is released.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::FunnelRuntime;
pub use traits::*;

use crate::funnel::{ChatId, ClientProfile, MessageId};
use crate::orders::CsvOrderLog;
use crate::telegram::{Message, TelegramClient};
use chrono::{DateTime, Utc};

/// Type alias for production runtime with concrete implementations
pub type ProductionRuntime = FunnelRuntime<TelegramClient, TelegramClient, CsvOrderLog>;

/// Slash commands understood by the bot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Contact,
    /// Owner-only download of the order log
    ExportOrders,
}

impl Command {
    /// Parse `/name`, `/name@bot` or `/name payload`; unknown commands are plain text
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.split_whitespace().next()?;
        let name = word.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name);
        match name {
            "start" => Some(Command::Start),
            "contact" => Some(Command::Contact),
            "excel" | "клиенты" => Some(Command::ExportOrders),
            _ => None,
        }
    }
}

/// An inbound message after platform decoding and routing
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Command {
        chat: ChatId,
        command: Command,
    },
    Photo {
        chat: ChatId,
        file_id: String,
        sender: ClientProfile,
    },
    /// The owner replied to one of the bot's messages
    OwnerReply {
        replied_to: MessageId,
        text: Option<String>,
    },
    Text {
        chat: ChatId,
        text: String,
        sent_at: DateTime<Utc>,
    },
}

impl Inbound {
    /// Route a platform message: command, then photo, then owner reply, then text
    pub fn classify(message: Message, owner: ChatId) -> Option<Self> {
        let chat = ChatId(message.chat.id);

        if let Some(command) = message.text.as_deref().and_then(Command::parse) {
            return Some(Inbound::Command { chat, command });
        }

        if let Some(photo) = message.largest_photo() {
            let sender = message.sender_profile()?;
            return Some(Inbound::Photo {
                chat,
                file_id: photo.file_id.clone(),
                sender,
            });
        }

        if chat == owner {
            if let Some(replied) = &message.reply_to_message {
                return Some(Inbound::OwnerReply {
                    replied_to: MessageId(replied.message_id),
                    text: message.text,
                });
            }
        }

        let sent_at = message.sent_at();
        let text = message.text?;
        Some(Inbound::Text {
            chat,
            text,
            sent_at,
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Inbound::Command { .. } => "command",
            Inbound::Photo { .. } => "photo",
            Inbound::OwnerReply { .. } => "owner_reply",
            Inbound::Text { .. } => "text",
        }
    }
}
