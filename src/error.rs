use thiserror::Error;

/// Everything that can stop a post or poll from reaching a channel.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// Channel is unknown or has no bot token.
    #[error("channel not found: {0}")]
    ChannelNotFound(String),

    #[error("invalid image url: {0}")]
    InvalidImageUrl(String),

    #[error("invalid button url: {0}")]
    InvalidButtonUrl(String),

    #[error("button text is empty (url {0})")]
    EmptyButtonText(String),

    #[error("too many images: {0} (max 10)")]
    TooManyImages(usize),

    #[error("too many buttons: {0} (max 5)")]
    TooManyButtons(usize),

    #[error("message is too long: {length} > {max}")]
    MessageTooLong { length: usize, max: usize },

    #[error("caption is too long: {length} > {max}")]
    CaptionTooLong { length: usize, max: usize },

    /// Schedule date is not strictly in the future.
    #[error("schedule date is in the past: {0}")]
    PastSchedule(chrono::DateTime<chrono::Utc>),

    #[error("post has no text and no images")]
    EmptyContent,

    #[error("invalid poll: {0}")]
    InvalidPoll(String),

    /// Bot API answered with `ok: false`.
    #[error("telegram error {code}: {description}")]
    Telegram {
        code: u16,
        kind: TelegramErrorKind,
        description: String,
    },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("image upload failed: {0}")]
    Upload(String),

    #[error("schedule store error: {0}")]
    Store(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// User-facing categories for Bot API failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelegramErrorKind {
    ChatNotFound,
    BotKicked,
    InsufficientRights,
    NotAMember,
    Forbidden,
    PermissionDenied,
    CaptionTooLong,
    MessageTooLong,
    Other,
}

/// Lowercase phrase -> category. Checked in order, so the more specific
/// phrases sit above the generic `forbidden`.
const TELEGRAM_ERROR_PHRASES: &[(&str, TelegramErrorKind)] = &[
    ("chat not found", TelegramErrorKind::ChatNotFound),
    ("bot was kicked", TelegramErrorKind::BotKicked),
    ("not enough rights", TelegramErrorKind::InsufficientRights),
    ("have no rights", TelegramErrorKind::InsufficientRights),
    ("need administrator rights", TelegramErrorKind::InsufficientRights),
    ("bot is not a member", TelegramErrorKind::NotAMember),
    ("not a member", TelegramErrorKind::NotAMember),
    ("permission denied", TelegramErrorKind::PermissionDenied),
    ("forbidden", TelegramErrorKind::Forbidden),
    ("caption is too long", TelegramErrorKind::CaptionTooLong),
    ("message caption is too long", TelegramErrorKind::CaptionTooLong),
    ("message is too long", TelegramErrorKind::MessageTooLong),
];

impl TelegramErrorKind {
    pub fn classify(description: &str) -> Self {
        let lower = description.to_lowercase();
        TELEGRAM_ERROR_PHRASES
            .iter()
            .find(|(phrase, _)| lower.contains(phrase))
            .map(|(_, kind)| *kind)
            .unwrap_or(TelegramErrorKind::Other)
    }

    /// Localization key, `None` for unrecognized errors.
    pub fn key(self) -> Option<&'static str> {
        match self {
            Self::ChatNotFound => Some("telegram_chat_not_found"),
            Self::BotKicked => Some("telegram_bot_kicked"),
            Self::InsufficientRights => Some("telegram_insufficient_rights"),
            Self::NotAMember => Some("telegram_not_a_member"),
            Self::Forbidden => Some("telegram_forbidden"),
            Self::PermissionDenied => Some("telegram_permission_denied"),
            Self::CaptionTooLong => Some("caption_too_long"),
            Self::MessageTooLong => Some("message_too_long"),
            Self::Other => None,
        }
    }
}

impl ComposeError {
    pub fn telegram(code: u16, description: impl Into<String>) -> Self {
        let description = description.into();
        Self::Telegram {
            code,
            kind: TelegramErrorKind::classify(&description),
            description,
        }
    }

    /// The failure half of a `DispatchResult`: a recognized key, or the raw
    /// upstream text for Telegram errors nobody has a key for.
    pub fn message(&self) -> String {
        let key = match self {
            Self::ChannelNotFound(_) => "channel_not_found",
            Self::InvalidImageUrl(_) => "invalid_image_url",
            Self::InvalidButtonUrl(_) => "invalid_button_url",
            Self::EmptyButtonText(_) => "empty_button_text",
            Self::TooManyImages(_) => "too_many_images",
            Self::TooManyButtons(_) => "too_many_buttons",
            Self::MessageTooLong { .. } => "message_too_long",
            Self::CaptionTooLong { .. } => "caption_too_long",
            Self::PastSchedule(_) => "past_schedule",
            Self::EmptyContent => "empty_content",
            Self::InvalidPoll(_) => "invalid_poll",
            Self::Telegram { kind, description, .. } => {
                return match kind.key() {
                    Some(key) => key.to_string(),
                    None => strip_bad_request(description).to_string(),
                };
            }
            other => return other.to_string(),
        };

        key.to_string()
    }

    /// Validation failures are raised before any network call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidImageUrl(_)
                | Self::InvalidButtonUrl(_)
                | Self::EmptyButtonText(_)
                | Self::TooManyImages(_)
                | Self::TooManyButtons(_)
                | Self::MessageTooLong { .. }
                | Self::CaptionTooLong { .. }
                | Self::PastSchedule(_)
                | Self::EmptyContent
                | Self::InvalidPoll(_)
        )
    }
}

fn strip_bad_request(description: &str) -> &str {
    description
        .strip_prefix("Bad Request:")
        .map(str::trim_start)
        .unwrap_or(description)
}
