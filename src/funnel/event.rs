//! Events that can occur in a conversation

use super::stage::{ClientProfile, PhotoRef};
use chrono::{DateTime, Utc};

/// Events that trigger stage transitions
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    // Client commands
    Start,
    Contact,

    // Client messages
    Text {
        text: String,
        /// Platform timestamp of the message
        sent_at: DateTime<Utc>,
    },
    Photo {
        /// Platform handle of the largest size variant
        file_id: String,
        sender: ClientProfile,
    },

    // Owner events, already resolved to this conversation
    PriceQuoted {
        price: String,
    },

    // Collaborator outcomes, tagged with the upload they concern
    PhotoStored {
        file_id: String,
        photo: PhotoRef,
    },
    PhotoFailed {
        file_id: String,
        reason: String,
    },
    ForwardFailed {
        file_id: String,
        reason: String,
    },
}

impl Event {
    /// Short name for logs and mismatch errors
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Start => "start",
            Event::Contact => "contact",
            Event::Text { .. } => "text",
            Event::Photo { .. } => "photo",
            Event::PriceQuoted { .. } => "price_quoted",
            Event::PhotoStored { .. } => "photo_stored",
            Event::PhotoFailed { .. } => "photo_failed",
            Event::ForwardFailed { .. } => "forward_failed",
        }
    }
}
