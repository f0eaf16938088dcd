use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Generic channel post, as composed in the editor.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PostContent {
    /// Post text. Editor HTML or Telegram-tag-restricted string.
    /// May be empty if the post is images only.
    #[serde(default)]
    pub text: String,
    /// Image URLs, 0..10. Empty means text-only post.
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub image_position: ImagePosition,
    /// Hashtags, with or without the leading `#`.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Inline keyboard, one button per row. 0..5
    #[serde(default)]
    pub buttons: Vec<InlineButton>,
    /// `None` sends immediately.
    #[serde(default, deserialize_with = "super::deserialize_schedule")]
    pub schedule: Option<DateTime<Utc>>,
}

/// Where the image goes relative to the text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImagePosition {
    /// Image is attached as media, text becomes its caption.
    #[default]
    Top,
    /// Image is shown as a large link preview under the text.
    Bottom,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineButton {
    pub text: String,
    pub url: String,
}

impl InlineButton {
    pub fn new(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self { text: text.into(), url: url.into() }
    }

    /// Leftover empty row from the editor.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty() && self.url.trim().is_empty()
    }
}

impl PostContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into(), ..Default::default() }
    }

    /// Tags in the form they are rendered: trimmed, `#`-prefixed, blanks dropped.
    pub fn hashtags(&self) -> Vec<String> {
        self.tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty() && *t != "#")
            .map(|t| if t.starts_with('#') { t.to_string() } else { format!("#{t}") })
            .collect()
    }
}
