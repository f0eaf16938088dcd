//! Picks the Bot API call(s) for a prepared post.
//!
//! | images | position | buttons | calls                                  |
//! |--------|----------|---------|----------------------------------------|
//! | 0      | -        | any     | sendMessage                            |
//! | 1..10  | bottom   | any     | sendMessage with large link preview    |
//! | 1      | top      | any     | sendPhoto, text as caption             |
//! | 2..10  | top      | none    | sendMediaGroup, caption on first item  |
//! | 2..10  | top      | some    | sendMediaGroup, then a reply carrying  |
//! |        |          |         | the keyboard                           |
//!
//! Media groups cannot carry an inline keyboard, hence the follow-up
//! message replying to the first photo of the album.

use tracing::warn;

use crate::content::ImagePosition;
use crate::telegram::types::{
    InlineKeyboardMarkup, InputMediaPhoto, InputPollOption, LinkPreviewOptions, SendMediaGroup,
    SendMessage, SendPhoto, SendPoll, PARSE_MODE_HTML,
};
use crate::validate::{Prepared, PreparedPoll, PreparedPost};

pub const LINKS_TEXT: &str = "🔗 Links:";

#[derive(Clone, Debug, PartialEq)]
pub enum DispatchPlan {
    Message(SendMessage),
    Photo(SendPhoto),
    MediaGroup {
        group: SendMediaGroup,
        /// Sent after the group, `reply_to_message_id` filled in from the
        /// group's first message.
        follow_up: Option<SendMessage>,
    },
    Poll(SendPoll),
}

impl DispatchPlan {
    /// Bot API methods in the order they will be called.
    pub fn methods(&self) -> Vec<&'static str> {
        match self {
            DispatchPlan::Message(_) => vec!["sendMessage"],
            DispatchPlan::Photo(_) => vec!["sendPhoto"],
            DispatchPlan::MediaGroup { follow_up: None, .. } => vec!["sendMediaGroup"],
            DispatchPlan::MediaGroup { follow_up: Some(_), .. } => {
                vec!["sendMediaGroup", "sendMessage"]
            }
            DispatchPlan::Poll(_) => vec!["sendPoll"],
        }
    }
}

pub fn plan(prepared: &Prepared, chat_id: &str) -> DispatchPlan {
    match prepared {
        Prepared::Post(post) => plan_post(post, chat_id),
        Prepared::Poll(poll) => plan_poll(poll, chat_id),
    }
}

pub fn plan_post(post: &PreparedPost, chat_id: &str) -> DispatchPlan {
    let chat_id = chat_id.to_string();
    let reply_markup = InlineKeyboardMarkup::from_buttons(&post.buttons);
    let caption = (!post.text.is_empty()).then(|| post.text.clone());

    // A link-preview message still needs text, so an image-only bottom
    // post goes out as media instead.
    let position = match post.image_position {
        ImagePosition::Bottom if post.text.is_empty() => ImagePosition::Top,
        position => position,
    };

    match (post.images.as_slice(), position) {
        ([], _) => DispatchPlan::Message(SendMessage {
            chat_id,
            text: post.text.clone(),
            parse_mode: PARSE_MODE_HTML,
            link_preview_options: None,
            reply_to_message_id: None,
            reply_markup,
        }),
        ([first, rest @ ..], ImagePosition::Bottom) => {
            if !rest.is_empty() {
                warn!(
                    "bottom image position shows only the first image, {} dropped",
                    rest.len()
                );
            }

            DispatchPlan::Message(SendMessage {
                chat_id,
                text: post.text.clone(),
                parse_mode: PARSE_MODE_HTML,
                link_preview_options: Some(LinkPreviewOptions {
                    is_disabled: false,
                    url: first.clone(),
                    prefer_large_media: true,
                    show_above_text: false,
                }),
                reply_to_message_id: None,
                reply_markup,
            })
        }
        ([photo], ImagePosition::Top) => DispatchPlan::Photo(SendPhoto {
            chat_id,
            photo: photo.clone(),
            caption,
            parse_mode: PARSE_MODE_HTML,
            reply_markup,
        }),
        (images, ImagePosition::Top) => {
            let media = images
                .iter()
                .enumerate()
                .map(|(i, url)| InputMediaPhoto {
                    r#type: "photo",
                    media: url.clone(),
                    caption: if i == 0 { caption.clone() } else { None },
                    parse_mode: (i == 0 && caption.is_some()).then_some(PARSE_MODE_HTML),
                })
                .collect();

            let follow_up = reply_markup.map(|markup| SendMessage {
                chat_id: chat_id.clone(),
                text: LINKS_TEXT.to_string(),
                parse_mode: PARSE_MODE_HTML,
                link_preview_options: None,
                reply_to_message_id: None,
                reply_markup: Some(markup),
            });

            DispatchPlan::MediaGroup { group: SendMediaGroup { chat_id, media }, follow_up }
        }
    }
}

pub fn plan_poll(poll: &PreparedPoll, chat_id: &str) -> DispatchPlan {
    DispatchPlan::Poll(SendPoll {
        chat_id: chat_id.to_string(),
        question: poll.question.clone(),
        options: poll.options.iter().map(|o| InputPollOption { text: o.clone() }).collect(),
        is_anonymous: poll.is_anonymous,
        allows_multiple_answers: poll.allows_multiple_answers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::InlineButton;

    fn post(images: usize, position: ImagePosition, buttons: usize) -> PreparedPost {
        PreparedPost {
            text: "Hello <b>world</b>".into(),
            images: (0..images).map(|i| format!("https://example.com/{i}.jpg")).collect(),
            image_position: position,
            buttons: (0..buttons)
                .map(|i| InlineButton::new(format!("b{i}"), format!("https://example.com/{i}")))
                .collect(),
            schedule: None,
        }
    }

    #[test]
    fn test_routing_table() {
        use ImagePosition::*;

        let cases: &[(usize, ImagePosition, usize, &[&str])] = &[
            (0, Top, 0, &["sendMessage"]),
            (0, Bottom, 2, &["sendMessage"]),
            (1, Bottom, 0, &["sendMessage"]),
            (1, Bottom, 1, &["sendMessage"]),
            (1, Top, 0, &["sendPhoto"]),
            (1, Top, 3, &["sendPhoto"]),
            (3, Bottom, 0, &["sendMessage"]),
            (2, Top, 0, &["sendMediaGroup"]),
            (10, Top, 0, &["sendMediaGroup"]),
            (2, Top, 1, &["sendMediaGroup", "sendMessage"]),
            (10, Top, 5, &["sendMediaGroup", "sendMessage"]),
        ];

        for (images, position, buttons, methods) in cases {
            let plan = plan_post(&post(*images, *position, *buttons), "@ch");
            assert_eq!(plan.methods(), *methods, "{images} images, {position:?}, {buttons} buttons");
        }
    }

    #[test]
    fn test_text_only_message() {
        let DispatchPlan::Message(msg) = plan_post(&post(0, ImagePosition::Top, 1), "@ch") else {
            panic!("expected sendMessage");
        };
        assert_eq!(msg.text, "Hello <b>world</b>");
        assert!(msg.link_preview_options.is_none());
        assert_eq!(msg.reply_markup.unwrap().inline_keyboard.len(), 1);
    }

    #[test]
    fn test_bottom_image_uses_link_preview() {
        let DispatchPlan::Message(msg) = plan_post(&post(2, ImagePosition::Bottom, 0), "@ch") else {
            panic!("expected sendMessage");
        };
        let preview = msg.link_preview_options.unwrap();
        assert_eq!(preview.url, "https://example.com/0.jpg");
        assert!(preview.prefer_large_media);
        assert!(!preview.is_disabled);
        assert!(!preview.show_above_text);
    }

    #[test]
    fn test_bottom_image_without_text_goes_as_photo() {
        let mut p = post(1, ImagePosition::Bottom, 0);
        p.text.clear();
        let DispatchPlan::Photo(photo) = plan_post(&p, "@ch") else {
            panic!("expected sendPhoto");
        };
        assert!(photo.caption.is_none());
    }

    #[test]
    fn test_single_top_image_caption() {
        let DispatchPlan::Photo(photo) = plan_post(&post(1, ImagePosition::Top, 1), "-100") else {
            panic!("expected sendPhoto");
        };
        assert_eq!(photo.chat_id, "-100");
        assert_eq!(photo.caption.as_deref(), Some("Hello <b>world</b>"));
        assert!(photo.reply_markup.is_some());
    }

    #[test]
    fn test_media_group_caption_on_first_only() {
        let DispatchPlan::MediaGroup { group, follow_up } =
            plan_post(&post(3, ImagePosition::Top, 2), "@ch")
        else {
            panic!("expected sendMediaGroup");
        };

        assert_eq!(group.media.len(), 3);
        assert_eq!(group.media[0].caption.as_deref(), Some("Hello <b>world</b>"));
        assert_eq!(group.media[0].parse_mode, Some("HTML"));
        assert!(group.media[1..].iter().all(|m| m.caption.is_none() && m.parse_mode.is_none()));
        assert_eq!(group.media[2].media, "https://example.com/2.jpg");

        let follow_up = follow_up.unwrap();
        assert_eq!(follow_up.text, LINKS_TEXT);
        assert_eq!(follow_up.reply_markup.unwrap().inline_keyboard.len(), 2);
    }

    #[test]
    fn test_poll_plan() {
        let poll = PreparedPoll {
            question: "Lunch?".into(),
            options: vec!["Pizza".into(), "Sushi".into()],
            is_anonymous: false,
            allows_multiple_answers: true,
            schedule: None,
        };
        let DispatchPlan::Poll(body) = plan_poll(&poll, "@ch") else {
            panic!("expected sendPoll");
        };
        assert_eq!(body.options[1].text, "Sushi");
        assert!(body.allows_multiple_answers);
    }
}
