//! Effects produced by stage transitions

use super::stage::PhotoRef;
use crate::orders::Order;

/// Recipient of an outbound message, relative to the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatTarget {
    /// The client whose conversation produced the effect
    Client,
    /// The single operator
    Owner,
}

/// Reply markup attached to a text message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    /// Quick-reply buttons shown in place of the keyboard
    Choices(Vec<String>),
    /// Hide a previously shown choice keyboard
    Remove,
    /// A single button opening an external link
    Link { label: String, url: String },
}

impl Keyboard {
    pub fn choices<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Keyboard::Choices(labels.into_iter().map(Into::into).collect())
    }

    pub fn link(label: impl Into<String>, url: impl Into<String>) -> Self {
        Keyboard::Link {
            label: label.into(),
            url: url.into(),
        }
    }
}

/// Effects to be executed after a transition is committed
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Deliver a text message
    SendText {
        to: ChatTarget,
        text: String,
        keyboard: Option<Keyboard>,
    },

    /// Deliver a stored photo
    SendPhoto {
        to: ChatTarget,
        photo: PhotoRef,
        caption: Option<String>,
    },

    /// Download and store the client's upload (yields `PhotoStored` or `PhotoFailed`)
    FetchPhoto { file_id: String, user_id: i64 },

    /// Send the photo to the owner and register a pending quote for the
    /// resulting message (yields `ForwardFailed` on error)
    ForwardForAppraisal {
        file_id: String,
        photo: PhotoRef,
        caption: String,
    },

    /// Append the completed order to the log
    AppendOrder { order: Order },
}

impl Effect {
    pub fn send_client(text: impl Into<String>) -> Self {
        Effect::SendText {
            to: ChatTarget::Client,
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn send_client_with(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Effect::SendText {
            to: ChatTarget::Client,
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }

    /// Whether executing this effect talks to the owner
    #[allow(dead_code)] // Used in tests
    pub fn reaches_owner(&self) -> bool {
        matches!(
            self,
            Effect::SendText {
                to: ChatTarget::Owner,
                ..
            } | Effect::SendPhoto {
                to: ChatTarget::Owner,
                ..
            } | Effect::ForwardForAppraisal { .. }
        )
    }
}
