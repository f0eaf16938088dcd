//! Bot API request and response bodies. Only the fields we send or read.

use serde::{Deserialize, Serialize};

use crate::content::InlineButton;

pub const PARSE_MODE_HTML: &str = "HTML";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SendMessage {
    pub chat_id: String,
    pub text: String,
    pub parse_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_preview_options: Option<LinkPreviewOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SendPhoto {
    pub chat_id: String,
    pub photo: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    pub parse_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SendMediaGroup {
    pub chat_id: String,
    pub media: Vec<InputMediaPhoto>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InputMediaPhoto {
    pub r#type: &'static str,
    pub media: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<&'static str>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SendPoll {
    pub chat_id: String,
    pub question: String,
    pub options: Vec<InputPollOption>,
    pub is_anonymous: bool,
    pub allows_multiple_answers: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InputPollOption {
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LinkPreviewOptions {
    pub is_disabled: bool,
    pub url: String,
    pub prefer_large_media: bool,
    pub show_above_text: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub url: String,
}

impl InlineKeyboardMarkup {
    /// One button per row, `None` when there are no buttons.
    pub fn from_buttons(buttons: &[InlineButton]) -> Option<Self> {
        if buttons.is_empty() {
            return None;
        }

        Some(Self {
            inline_keyboard: buttons
                .iter()
                .map(|b| vec![InlineKeyboardButton { text: b.text.clone(), url: b.url.clone() }])
                .collect(),
        })
    }
}

/// The part of a sent `Message` we need back.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SentMessage {
    pub message_id: i64,
}

/// Bot API answer. `Error` carries `error_code` and `description`.
#[derive(Clone, Debug, PartialEq)]
pub enum TelegramResponse<T> {
    Success(T),
    Error(u16, String),
}

/// Wire shape of every Bot API answer, before it is split into
/// `TelegramResponse`.
#[derive(Deserialize)]
pub(crate) struct RawResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<u16>,
}

impl<T> RawResponse<T> {
    pub(crate) fn into_response(self, http_status: u16) -> TelegramResponse<T> {
        match (self.ok, self.result) {
            (true, Some(result)) => TelegramResponse::Success(result),
            (true, None) => TelegramResponse::Error(http_status, "(postfox) Empty result".into()),
            (false, _) => TelegramResponse::Error(
                self.error_code.unwrap_or(http_status),
                self.description.unwrap_or_else(|| "(postfox) Unknown error".into()),
            ),
        }
    }
}
