use crate::content::ImagePosition;
use crate::sanitize::plain_len;

pub const MESSAGE_MAX: usize = 4096;
pub const MESSAGE_WARN: usize = 3800;
pub const CAPTION_MAX: usize = 1024;
pub const CAPTION_WARN: usize = 900;

/// Character budget for one post. `warn` is where the editor starts
/// showing the counter, `max` is where Telegram rejects the message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limits {
    pub warn: usize,
    pub max: usize,
}

impl Limits {
    pub fn new(has_image: bool, position: ImagePosition) -> Self {
        match (has_image, position) {
            // Text becomes a photo caption.
            (true, ImagePosition::Top) => Limits { warn: CAPTION_WARN, max: CAPTION_MAX },
            // Plain message, image is only a link preview.
            (true, ImagePosition::Bottom) | (false, _) => {
                Limits { warn: MESSAGE_WARN, max: MESSAGE_MAX }
            }
        }
    }

    pub fn is_caption(&self) -> bool {
        self.max == CAPTION_MAX
    }
}

/// Plain-text length of `text` plus the hashtag line appended on send:
/// a blank-line separator, then the tags joined by single spaces.
pub fn effective_length(text: &str, tags: &[String]) -> usize {
    let text_len = plain_len(text);
    if tags.is_empty() {
        return text_len;
    }

    let tags_len: usize = tags.iter().map(|t| t.encode_utf16().count()).sum();
    text_len + 2 + tags_len + (tags.len() - 1)
}
