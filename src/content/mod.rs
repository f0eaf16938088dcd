mod images;
mod poll;
mod post;

pub use images::*;
pub use poll::*;
pub use post::*;

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

/// Anything the composer can publish to a channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Publication {
    Post(PostContent),
    Poll(PollContent),
}

impl Publication {
    pub fn schedule(&self) -> Option<DateTime<Utc>> {
        match self {
            Publication::Post(p) => p.schedule,
            Publication::Poll(p) => p.schedule,
        }
    }
}

impl From<PostContent> for Publication {
    fn from(post: PostContent) -> Self {
        Publication::Post(post)
    }
}

impl From<PollContent> for Publication {
    fn from(poll: PollContent) -> Self {
        Publication::Poll(poll)
    }
}

/// `schedule` as a quoted RFC 3339 string or a bare TOML datetime.
fn deserialize_schedule<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum When {
        Rfc3339(DateTime<Utc>),
        Toml(toml::value::Datetime),
    }

    match Option::<When>::deserialize(deserializer)? {
        None => Ok(None),
        Some(When::Rfc3339(at)) => Ok(Some(at)),
        Some(When::Toml(at)) => DateTime::parse_from_rfc3339(&at.to_string())
            .map(|at| Some(at.with_timezone(&Utc)))
            .map_err(|e| de::Error::custom(format!("schedule needs a date, time and offset: {e}"))),
    }
}
