//! Telegram Bot API adapter
//!
//! Webhook update types, the HTTP client used to reply, and its errors.

mod client;
mod error;
mod types;

pub use client::TelegramClient;
pub use error::TelegramError;
pub use types::*;
