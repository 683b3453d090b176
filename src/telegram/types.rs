//! Telegram Bot API wire types (the subset the bot uses)

use crate::commands::Command;
use crate::runtime::{InboundContent, InboundMessage};
use crate::state_machine::PhotoVariant;
use serde::{Deserialize, Serialize};

/// Envelope every Bot API method responds with
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<u16>,
    pub parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseParameters {
    pub retry_after: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
    /// Available sizes of a photo, smallest first
    #[serde(default)]
    pub photo: Vec<PhotoSize>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    pub width: u32,
    pub height: u32,
    pub file_size: Option<u64>,
}

impl From<PhotoSize> for PhotoVariant {
    fn from(size: PhotoSize) -> Self {
        PhotoVariant {
            file_id: size.file_id,
            width: size.width,
            height: size.height,
            file_size: size.file_size,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct File {
    pub file_id: String,
    /// Present while the file is downloadable
    pub file_path: Option<String>,
}

// Request parameter types

#[derive(Debug, Serialize)]
pub struct GetUpdatesParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    pub timeout: u64,
    pub allowed_updates: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct SendMessageParams<'a> {
    pub chat_id: i64,
    pub text: &'a str,
}

#[derive(Debug, Serialize)]
pub struct GetFileParams<'a> {
    pub file_id: &'a str,
}

impl Update {
    /// Convert to a transport-neutral inbound message. Updates without a
    /// message, and messages sent by bots, yield `None`.
    pub fn into_inbound(self) -> Option<InboundMessage> {
        let message = self.message?;
        let user_id = match &message.from {
            Some(user) if user.is_bot => return None,
            Some(user) => user.id,
            // Channel posts have no sender; key the session on the chat
            None => message.chat.id,
        };

        let content = if let Some(text) = message.text {
            match Command::parse(&text) {
                Some(command) => InboundContent::Command(command),
                None => InboundContent::Text(text),
            }
        } else if !message.photo.is_empty() {
            InboundContent::Photo(message.photo.into_iter().map(PhotoVariant::from).collect())
        } else {
            InboundContent::Unsupported
        };

        Some(InboundMessage {
            chat_id: message.chat.id,
            user_id,
            content,
        })
    }
}
