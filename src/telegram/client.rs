//! HTTP client for the Bot API

use super::error::TelegramError;
use super::types::{ApiResponse, File, InlineButton, KeyboardButton, ReplyMarkup, SentMessage};
use crate::funnel::{ChatId, Keyboard, MessageId, PhotoRef};
use crate::runtime::{CollaboratorError, Messenger, PhotoFetcher};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Name for a downloaded client photo: `photo_<uid>_<YYYYmmddHHMMSS>.jpg`
pub fn photo_file_name(user_id: i64, at: DateTime<Local>) -> String {
    format!("photo_{user_id}_{}.jpg", at.format("%Y%m%d%H%M%S"))
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<ReplyMarkup>,
}

#[derive(Debug, Serialize)]
struct SetWebhookRequest<'a> {
    url: &'a str,
}

fn reply_markup(keyboard: &Keyboard) -> ReplyMarkup {
    match keyboard {
        Keyboard::Choices(labels) => ReplyMarkup::Keyboard {
            keyboard: vec![labels
                .iter()
                .map(|label| KeyboardButton {
                    text: label.clone(),
                })
                .collect()],
            resize_keyboard: true,
            one_time_keyboard: true,
        },
        Keyboard::Remove => ReplyMarkup::Remove {
            remove_keyboard: true,
        },
        Keyboard::Link { label, url } => ReplyMarkup::Inline {
            inline_keyboard: vec![vec![InlineButton {
                text: label.clone(),
                url: url.clone(),
            }]],
        },
    }
}

/// Bot API client; the token never appears in logs or errors
pub struct TelegramClient {
    client: Client,
    token: String,
    api_url: String,
    photos_dir: PathBuf,
}

impl TelegramClient {
    pub fn new(
        token: impl Into<String>,
        api_url: &str,
        photos_dir: impl Into<PathBuf>,
    ) -> Result<Self, TelegramError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            token: token.into(),
            api_url: api_url.trim_end_matches('/').to_string(),
            photos_dir: photos_dir.into(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }

    fn file_url(&self, file_path: &str) -> String {
        format!("{}/file/bot{}/{}", self.api_url, self.token, file_path)
    }

    /// Unwrap the `{ok, result}` envelope
    async fn decode<T: DeserializeOwned>(
        method: &str,
        response: reqwest::Response,
    ) -> Result<T, TelegramError> {
        let body = response.text().await?;
        let envelope: ApiResponse<T> = serde_json::from_str(&body)
            .map_err(|e| TelegramError::Decode(format!("{method}: {e}")))?;

        if !envelope.ok {
            return Err(TelegramError::api(envelope.error_code, envelope.description));
        }
        envelope
            .result
            .ok_or_else(|| TelegramError::Decode(format!("{method}: missing result")))
    }

    async fn call_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<T, TelegramError> {
        let response = self
            .client
            .post(self.method_url(method))
            .json(body)
            .send()
            .await?;
        Self::decode(method, response).await
    }

    async fn call_multipart<T: DeserializeOwned>(
        &self,
        method: &str,
        form: Form,
    ) -> Result<T, TelegramError> {
        let response = self
            .client
            .post(self.method_url(method))
            .multipart(form)
            .send()
            .await?;
        Self::decode(method, response).await
    }

    /// Build an upload form carrying `path` under `field`
    async fn upload_form(
        chat: ChatId,
        field: &'static str,
        path: &Path,
        caption: Option<&str>,
    ) -> Result<Form, TelegramError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map_or_else(|| field.to_string(), |n| n.to_string_lossy().into_owned());
        let mime = mime_guess::from_path(path).first_or_octet_stream();

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime.essence_str())?;

        let mut form = Form::new()
            .text("chat_id", chat.0.to_string())
            .part(field, part);
        if let Some(caption) = caption {
            form = form.text("caption", caption.to_string());
        }
        Ok(form)
    }

    /// Drop any previous registration, then point Telegram at `url`
    pub async fn set_webhook(&self, url: &str) -> Result<(), TelegramError> {
        let _: bool = self
            .call_json("deleteWebhook", &serde_json::json!({}))
            .await?;
        let _: bool = self
            .call_json("setWebhook", &SetWebhookRequest { url })
            .await?;
        tracing::info!(url, "Webhook registered");
        Ok(())
    }

    async fn download_photo(&self, file_id: &str, user_id: i64) -> Result<PhotoRef, TelegramError> {
        let file: File = self
            .call_json("getFile", &serde_json::json!({ "file_id": file_id }))
            .await?;
        let file_path = file
            .file_path
            .ok_or_else(|| TelegramError::MissingFilePath(file_id.to_string()))?;

        let response = self
            .client
            .get(self.file_url(&file_path))
            .send()
            .await?
            .error_for_status()?;
        let bytes = response.bytes().await?;

        tokio::fs::create_dir_all(&self.photos_dir).await?;
        let destination = self
            .photos_dir
            .join(photo_file_name(user_id, Local::now()));
        tokio::fs::write(&destination, &bytes).await?;

        tracing::debug!(
            user_id,
            bytes = bytes.len(),
            path = %destination.display(),
            "Photo downloaded"
        );
        Ok(PhotoRef::new(destination))
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageId, CollaboratorError> {
        let request = SendMessageRequest {
            chat_id: chat.0,
            text,
            reply_markup: keyboard.map(reply_markup),
        };
        let sent: SentMessage = self.call_json("sendMessage", &request).await?;
        Ok(MessageId(sent.message_id))
    }

    async fn send_photo(
        &self,
        chat: ChatId,
        photo: &PhotoRef,
        caption: Option<&str>,
    ) -> Result<MessageId, CollaboratorError> {
        let form = Self::upload_form(chat, "photo", photo.path(), caption).await?;
        let sent: SentMessage = self.call_multipart("sendPhoto", form).await?;
        Ok(MessageId(sent.message_id))
    }

    async fn send_document(
        &self,
        chat: ChatId,
        path: &Path,
        caption: Option<&str>,
    ) -> Result<MessageId, CollaboratorError> {
        let form = Self::upload_form(chat, "document", path, caption).await?;
        let sent: SentMessage = self.call_multipart("sendDocument", form).await?;
        Ok(MessageId(sent.message_id))
    }
}

#[async_trait]
impl PhotoFetcher for TelegramClient {
    async fn fetch_photo(&self, file_id: &str, user_id: i64) -> Result<PhotoRef, CollaboratorError> {
        Ok(self.download_photo(file_id, user_id).await?)
    }
}
