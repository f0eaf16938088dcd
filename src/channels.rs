use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ComposeError;

/// A Telegram channel the user has connected a bot to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub bot_token: String,
    /// Numeric id (`-100…`) or `@handle`. Preferred over `username`.
    #[serde(default)]
    pub chat_id: Option<String>,
}

/// What a Bot API call needs to address the channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedChannel {
    pub title: String,
    pub bot_token: String,
    pub chat_id: String,
}

/// External channel store.
#[async_trait]
pub trait ChannelStore: Send + Sync {
    async fn get(&self, channel_id: &str) -> Result<Option<Channel>, ComposeError>;
}

impl Channel {
    pub fn resolve(&self) -> Result<ResolvedChannel, ComposeError> {
        let bot_token = self.bot_token.trim();
        if bot_token.is_empty() {
            return Err(ComposeError::ChannelNotFound(self.id.clone()));
        }

        let chat_id = match self.chat_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                let handle = [self.username.trim(), self.title.trim()]
                    .into_iter()
                    .find(|s| !s.is_empty())
                    .ok_or_else(|| ComposeError::ChannelNotFound(self.id.clone()))?;
                format!("@{}", handle.trim_start_matches('@'))
            }
        };

        Ok(ResolvedChannel {
            title: self.title.clone(),
            bot_token: bot_token.to_string(),
            chat_id,
        })
    }
}

pub async fn resolve_channel(
    store: &dyn ChannelStore,
    channel_id: &str,
) -> Result<ResolvedChannel, ComposeError> {
    store
        .get(channel_id)
        .await?
        .ok_or_else(|| ComposeError::ChannelNotFound(channel_id.to_string()))?
        .resolve()
}

/// Channels listed in the config file.
#[derive(Default)]
pub struct ConfigChannelStore {
    channels: HashMap<String, Channel>,
}

impl ConfigChannelStore {
    pub fn new(channels: Vec<Channel>) -> Self {
        Self {
            channels: channels.into_iter().map(|c| (c.id.clone(), c)).collect(),
        }
    }
}

#[async_trait]
impl ChannelStore for ConfigChannelStore {
    async fn get(&self, channel_id: &str) -> Result<Option<Channel>, ComposeError> {
        Ok(self.channels.get(channel_id).cloned())
    }
}
