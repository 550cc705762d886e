//! Conversation stage and captured client data

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Placeholder shown when a client has no public username
pub const NO_HANDLE: &str = "—";

// ============================================================================
// Identifiers
// ============================================================================

/// Chat identifier; one per client conversation (and one for the owner)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a single message within a chat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Stage
// ============================================================================

/// Position of a conversation within the funnel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// No entry exists for the conversation
    #[default]
    Absent,
    /// Asked whether the client is interested
    AwaitInterestConfirm,
    /// Waiting for an image upload
    AwaitPhoto,
    /// Photo forwarded to the owner, waiting for a price
    AwaitOwnerPrice,
    /// Price relayed, waiting for accept/decline
    AwaitPriceConfirm,
    /// Waiting for payment requisites
    AwaitRequisites,
    /// Order recorded (terminal)
    Complete,
    /// Client declined at a decision point (terminal)
    Declined,
}

impl Stage {
    /// Terminal stages are never stored; the entry falls back to `Absent`
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Complete | Stage::Declined)
    }

    /// Whether the stage tracker keeps an entry for this stage
    pub fn is_active(self) -> bool {
        !matches!(self, Stage::Absent) && !self.is_terminal()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Absent => "absent",
            Stage::AwaitInterestConfirm => "await_interest_confirm",
            Stage::AwaitPhoto => "await_photo",
            Stage::AwaitOwnerPrice => "await_owner_price",
            Stage::AwaitPriceConfirm => "await_price_confirm",
            Stage::AwaitRequisites => "await_requisites",
            Stage::Complete => "complete",
            Stage::Declined => "declined",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Captured data
// ============================================================================

/// Opaque handle to a stored client photo (a path on disk in production)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoRef(PathBuf);

impl PhotoRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for PhotoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Identity of the client who submitted the photo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientProfile {
    pub user_id: i64,
    pub display_name: String,
    pub username: Option<String>,
}

impl ClientProfile {
    pub fn new(user_id: i64, display_name: impl Into<String>, username: Option<String>) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
            username,
        }
    }

    /// `@username`, or the placeholder when the client has none
    pub fn handle(&self) -> String {
        match &self.username {
            Some(username) => format!("@{username}"),
            None => NO_HANDLE.to_string(),
        }
    }

    /// Username without the `@`, or the placeholder
    pub fn username_or_placeholder(&self) -> &str {
        self.username.as_deref().unwrap_or(NO_HANDLE)
    }
}

/// Data captured while a conversation is in flight
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    pub profile: ClientProfile,
    /// Platform handle of the submitted upload; collaborator outcomes for
    /// any other upload belong to a superseded submission
    pub file_id: String,
    /// Set once the uploaded image has been stored
    pub photo: Option<PhotoRef>,
}

impl Capture {
    pub fn submitted(profile: ClientProfile, file_id: impl Into<String>) -> Self {
        Self {
            profile,
            file_id: file_id.into(),
            photo: None,
        }
    }

    /// Whether a collaborator outcome for `file_id` belongs to this submission
    pub fn is_for(&self, file_id: &str) -> bool {
        self.file_id == file_id
    }
}

/// Context for a conversation (immutable configuration)
#[derive(Debug, Clone)]
pub struct FunnelContext {
    pub conversation_id: ChatId,
    /// Link attached to "contact the manager" buttons
    pub contact_url: String,
}

impl FunnelContext {
    pub fn new(conversation_id: ChatId, contact_url: impl Into<String>) -> Self {
        Self {
            conversation_id,
            contact_url: contact_url.into(),
        }
    }
}
