//! Submission checks. Everything here runs before any network call.

use chrono::{DateTime, Utc};
use url::Url;

use crate::content::{ImagePosition, InlineButton, PollContent, PostContent, Publication};
use crate::error::ComposeError;
use crate::limits::{effective_length, Limits};
use crate::sanitize::{escape_text, sanitize};

pub const MAX_IMAGES: usize = 10;
pub const MAX_BUTTONS: usize = 5;
pub const POLL_QUESTION_MAX: usize = 300;
pub const POLL_OPTION_MAX: usize = 100;
pub const POLL_OPTIONS_MIN: usize = 2;
pub const POLL_OPTIONS_MAX: usize = 10;

/// A post that passed validation, with the text already in Telegram HTML
/// and the hashtag line appended.
#[derive(Clone, Debug, PartialEq)]
pub struct PreparedPost {
    pub text: String,
    pub images: Vec<String>,
    pub image_position: ImagePosition,
    pub buttons: Vec<InlineButton>,
    pub schedule: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PreparedPoll {
    pub question: String,
    pub options: Vec<String>,
    pub is_anonymous: bool,
    pub allows_multiple_answers: bool,
    pub schedule: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Prepared {
    Post(PreparedPost),
    Poll(PreparedPoll),
}

impl Prepared {
    pub fn prepare(publication: &Publication, now: DateTime<Utc>) -> Result<Self, ComposeError> {
        Ok(match publication {
            Publication::Post(post) => Prepared::Post(PreparedPost::prepare(post, now)?),
            Publication::Poll(poll) => Prepared::Poll(PreparedPoll::prepare(poll, now)?),
        })
    }

    pub fn schedule(&self) -> Option<DateTime<Utc>> {
        match self {
            Prepared::Post(p) => p.schedule,
            Prepared::Poll(p) => p.schedule,
        }
    }
}

impl PreparedPost {
    pub fn prepare(post: &PostContent, now: DateTime<Utc>) -> Result<Self, ComposeError> {
        if post.images.len() > MAX_IMAGES {
            return Err(ComposeError::TooManyImages(post.images.len()));
        }

        let buttons: Vec<InlineButton> = post
            .buttons
            .iter()
            .filter(|b| !b.is_blank())
            .map(|b| InlineButton::new(b.text.trim(), b.url.trim()))
            .collect();
        if buttons.len() > MAX_BUTTONS {
            return Err(ComposeError::TooManyButtons(buttons.len()));
        }

        let images: Vec<String> = post.images.iter().map(|i| i.trim().to_string()).collect();
        for image in &images {
            validate_image_url(image)?;
        }
        for button in &buttons {
            validate_button_url(&button.url)?;
            if button.text.is_empty() {
                return Err(ComposeError::EmptyButtonText(button.url.clone()));
            }
        }

        check_schedule(post.schedule, now)?;

        let body = sanitize(&post.text);
        let tags = post.hashtags();
        if body.is_empty() && tags.is_empty() && images.is_empty() {
            return Err(ComposeError::EmptyContent);
        }

        let limits = Limits::new(!images.is_empty(), post.image_position);
        let length = effective_length(&body, &tags);
        if length > limits.max {
            return Err(if limits.is_caption() {
                ComposeError::CaptionTooLong { length, max: limits.max }
            } else {
                ComposeError::MessageTooLong { length, max: limits.max }
            });
        }

        Ok(Self {
            text: append_tags(body, &tags),
            images,
            image_position: post.image_position,
            buttons,
            schedule: post.schedule,
        })
    }
}

impl PreparedPoll {
    pub fn prepare(poll: &PollContent, now: DateTime<Utc>) -> Result<Self, ComposeError> {
        let question = poll.question.trim().to_string();
        if question.is_empty() {
            return Err(ComposeError::InvalidPoll("question is empty".into()));
        }
        if utf16_len(&question) > POLL_QUESTION_MAX {
            return Err(ComposeError::InvalidPoll(format!(
                "question is longer than {POLL_QUESTION_MAX} characters"
            )));
        }

        let options: Vec<String> = poll.options.iter().map(|o| o.trim().to_string()).collect();
        if !(POLL_OPTIONS_MIN..=POLL_OPTIONS_MAX).contains(&options.len()) {
            return Err(ComposeError::InvalidPoll(format!(
                "{} options, expected {POLL_OPTIONS_MIN}..{POLL_OPTIONS_MAX}",
                options.len()
            )));
        }
        if let Some(idx) = options.iter().position(|o| o.is_empty()) {
            return Err(ComposeError::InvalidPoll(format!("option {} is empty", idx + 1)));
        }
        if let Some(idx) = options.iter().position(|o| utf16_len(o) > POLL_OPTION_MAX) {
            return Err(ComposeError::InvalidPoll(format!(
                "option {} is longer than {POLL_OPTION_MAX} characters",
                idx + 1
            )));
        }

        check_schedule(poll.schedule, now)?;

        Ok(Self {
            question,
            options,
            is_anonymous: poll.is_anonymous,
            allows_multiple_answers: poll.allows_multiple_answers,
            schedule: poll.schedule,
        })
    }
}

fn utf16_len(s: &str) -> usize {
    s.encode_utf16().count()
}

fn append_tags(body: String, tags: &[String]) -> String {
    if tags.is_empty() {
        return body;
    }

    let line = escape_text(&tags.join(" "));
    if body.is_empty() {
        line
    } else {
        format!("{body}\n\n{line}")
    }
}

fn check_schedule(schedule: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Result<(), ComposeError> {
    match schedule {
        Some(at) if at <= now => Err(ComposeError::PastSchedule(at)),
        _ => Ok(()),
    }
}

fn parse_http_url(s: &str) -> Option<Url> {
    let url = Url::parse(s).ok()?;
    let has_host = url.host_str().map_or(false, |h| !h.is_empty());
    (matches!(url.scheme(), "http" | "https") && has_host).then_some(url)
}

/// Absolute `http(s)` URL with a host and a non-root path.
pub fn validate_image_url(s: &str) -> Result<(), ComposeError> {
    match parse_http_url(s) {
        Some(url) if !url.path().is_empty() && url.path() != "/" => Ok(()),
        _ => Err(ComposeError::InvalidImageUrl(s.to_string())),
    }
}

pub fn validate_button_url(s: &str) -> Result<(), ComposeError> {
    parse_http_url(s)
        .map(|_| ())
        .ok_or_else(|| ComposeError::InvalidButtonUrl(s.to_string()))
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn now() -> DateTime<Utc> {
        "2030-06-01T12:00:00Z".parse().unwrap()
    }

    fn with_image(text: String) -> PostContent {
        PostContent {
            text,
            images: vec!["https://example.com/a.jpg".into()],
            ..Default::default()
        }
    }

    #[test]
    fn test_button_url_validation() {
        assert!(matches!(validate_button_url("not a url"), Err(ComposeError::InvalidButtonUrl(_))));
        assert!(validate_button_url("https://example.com").is_ok());
        assert!(validate_button_url("ftp://example.com").is_err());
        assert!(validate_button_url("").is_err());
    }

    #[test]
    fn test_image_url_validation() {
        assert!(validate_image_url("https://example.com/a.jpg").is_ok());
        assert!(validate_image_url("http://cdn.example.com/i/1").is_ok());
        assert!(validate_image_url("https://example.com/").is_err());
        assert!(validate_image_url("https://example.com").is_err());
        assert!(validate_image_url("file:///tmp/a.jpg").is_err());
        assert!(validate_image_url("a.jpg").is_err());
    }

    #[test]
    fn test_invalid_button_blocks_post() {
        let post = PostContent {
            text: "hi".into(),
            buttons: vec![InlineButton::new("Go", "not a url")],
            ..Default::default()
        };
        let err = PreparedPost::prepare(&post, now()).unwrap_err();
        assert!(matches!(err, ComposeError::InvalidButtonUrl(_)));
    }

    #[test]
    fn test_blank_button_rows_are_ignored() {
        let post = PostContent {
            text: "hi".into(),
            buttons: vec![InlineButton::new(" ", ""), InlineButton::new("Go", " https://example.com ")],
            ..Default::default()
        };
        let prepared = PreparedPost::prepare(&post, now()).unwrap();
        assert_eq!(prepared.buttons, vec![InlineButton::new("Go", "https://example.com")]);

        let post = PostContent {
            text: "hi".into(),
            buttons: vec![InlineButton::new("", "https://example.com")],
            ..Default::default()
        };
        assert!(matches!(
            PreparedPost::prepare(&post, now()),
            Err(ComposeError::EmptyButtonText(_))
        ));
    }

    #[test]
    fn test_counts() {
        let post = PostContent {
            text: "hi".into(),
            images: (0..11).map(|i| format!("https://example.com/{i}.jpg")).collect(),
            ..Default::default()
        };
        assert!(matches!(PreparedPost::prepare(&post, now()), Err(ComposeError::TooManyImages(11))));

        let post = PostContent {
            text: "hi".into(),
            buttons: (0..6).map(|i| InlineButton::new("b", format!("https://e.com/{i}"))).collect(),
            ..Default::default()
        };
        assert!(matches!(PreparedPost::prepare(&post, now()), Err(ComposeError::TooManyButtons(6))));
    }

    #[test]
    fn test_message_length_boundary() {
        let ok = PostContent::text("a".repeat(4096));
        assert!(PreparedPost::prepare(&ok, now()).is_ok());

        let long = PostContent::text("a".repeat(4097));
        assert!(matches!(
            PreparedPost::prepare(&long, now()),
            Err(ComposeError::MessageTooLong { length: 4097, max: 4096 })
        ));
    }

    #[test]
    fn test_caption_length_boundary() {
        assert!(PreparedPost::prepare(&with_image("a".repeat(1024)), now()).is_ok());
        assert!(matches!(
            PreparedPost::prepare(&with_image("a".repeat(1025)), now()),
            Err(ComposeError::CaptionTooLong { length: 1025, max: 1024 })
        ));

        let mut bottom = with_image("a".repeat(4000));
        bottom.image_position = ImagePosition::Bottom;
        assert!(PreparedPost::prepare(&bottom, now()).is_ok());
    }

    #[test]
    fn test_tags_count_against_limit() {
        let mut post = PostContent::text("a".repeat(4090));
        post.tags = vec!["abcd".into()];
        // 4090 + 2 + "#abcd"
        assert!(matches!(
            PreparedPost::prepare(&post, now()),
            Err(ComposeError::MessageTooLong { length: 4097, .. })
        ));
    }

    #[test]
    fn test_markup_does_not_count() {
        let post = PostContent::text(format!("<p><b>{}</b></p>", "a".repeat(4096)));
        assert!(PreparedPost::prepare(&post, now()).is_ok());
    }

    #[test]
    fn test_tags_appended() {
        let post = PostContent {
            text: "<p>Hello <b>world</b></p>".into(),
            tags: vec!["news".into(), "#a&b".into()],
            ..Default::default()
        };
        let prepared = PreparedPost::prepare(&post, now()).unwrap();
        assert_eq!(prepared.text, "Hello <b>world</b>\n\n#news #a&amp;b");

        let tags_only = PostContent { tags: vec!["x".into()], ..Default::default() };
        assert_eq!(PreparedPost::prepare(&tags_only, now()).unwrap().text, "#x");
    }

    #[test]
    fn test_empty_post_rejected() {
        let post = PostContent::text("<p><br></p>");
        assert!(matches!(PreparedPost::prepare(&post, now()), Err(ComposeError::EmptyContent)));

        let images_only = with_image(String::new());
        assert!(PreparedPost::prepare(&images_only, now()).is_ok());
    }

    #[test]
    fn test_schedule_must_be_future() {
        let mut post = PostContent::text("hi");
        post.schedule = Some(now());
        assert!(matches!(PreparedPost::prepare(&post, now()), Err(ComposeError::PastSchedule(_))));

        post.schedule = Some(now() - Duration::minutes(1));
        assert!(matches!(PreparedPost::prepare(&post, now()), Err(ComposeError::PastSchedule(_))));

        post.schedule = Some(now() + Duration::minutes(1));
        assert!(PreparedPost::prepare(&post, now()).is_ok());
    }

    #[test]
    fn test_poll_validation() {
        let poll = PollContent::new("Lunch?", vec!["Pizza".into(), " Sushi ".into()]);
        let prepared = PreparedPoll::prepare(&poll, now()).unwrap();
        assert_eq!(prepared.options, vec!["Pizza", "Sushi"]);
        assert!(prepared.is_anonymous);

        let single = PollContent::new("Lunch?", vec!["Pizza".into()]);
        assert!(matches!(PreparedPoll::prepare(&single, now()), Err(ComposeError::InvalidPoll(_))));

        let eleven = PollContent::new("Lunch?", (0..11).map(|i| i.to_string()).collect());
        assert!(PreparedPoll::prepare(&eleven, now()).is_err());

        let blank = PollContent::new("Lunch?", vec!["Pizza".into(), " ".into()]);
        assert!(PreparedPoll::prepare(&blank, now()).is_err());

        let no_question = PollContent::new("  ", vec!["a".into(), "b".into()]);
        assert!(PreparedPoll::prepare(&no_question, now()).is_err());

        let mut past = PollContent::new("Lunch?", vec!["a".into(), "b".into()]);
        past.schedule = Some(now() - Duration::hours(1));
        assert!(matches!(PreparedPoll::prepare(&past, now()), Err(ComposeError::PastSchedule(_))));
    }
}
