//! One publication, one channel: resolve, then either hand the publication
//! to the schedule store or plan and send it right away.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::channels::{resolve_channel, ChannelStore};
use crate::content::Publication;
use crate::error::ComposeError;
use crate::planner::plan;
use crate::schedule::{ScheduleStore, ScheduledPublication};
use crate::telegram::{execute, BotApi};
use crate::validate::Prepared;

pub const HUMAN_DATE_FORMAT: &str = "%d.%m.%Y %H:%M";

#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Published { message_ids: Vec<i64> },
    Scheduled { at: DateTime<Utc> },
}

/// Result of one channel, as the UI gets it. `message` is a token for
/// later localization: `publish_success:<title>`,
/// `scheduled_success:<title>:<date>`, an error key, or raw upstream text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DispatchResult {
    pub success: bool,
    pub message: String,
}

impl DispatchResult {
    pub fn failed(err: &ComposeError) -> Self {
        Self { success: false, message: err.message() }
    }
}

#[derive(Debug)]
pub struct ChannelOutcome {
    pub channel_id: String,
    /// Channel title, or the id when the channel could not be resolved.
    pub channel_title: String,
    pub result: Result<Outcome, ComposeError>,
}

impl ChannelOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn dispatch_result(&self) -> DispatchResult {
        match &self.result {
            Ok(Outcome::Published { .. }) => DispatchResult {
                success: true,
                message: format!("publish_success:{}", self.channel_title),
            },
            Ok(Outcome::Scheduled { at }) => DispatchResult {
                success: true,
                message: format!(
                    "scheduled_success:{}:{}",
                    self.channel_title,
                    at.format(HUMAN_DATE_FORMAT)
                ),
            },
            Err(e) => DispatchResult::failed(e),
        }
    }
}

#[derive(Clone)]
pub struct Publisher {
    api: Arc<dyn BotApi>,
    channels: Arc<dyn ChannelStore>,
    schedules: Arc<dyn ScheduleStore>,
}

impl Publisher {
    pub fn new(
        api: Arc<dyn BotApi>,
        channels: Arc<dyn ChannelStore>,
        schedules: Arc<dyn ScheduleStore>,
    ) -> Self {
        Self { api, channels, schedules }
    }

    /// Validate and dispatch to a single channel.
    pub async fn publish(&self, publication: &Publication, channel_id: &str) -> DispatchResult {
        match Prepared::prepare(publication, Utc::now()) {
            Ok(prepared) => self.dispatch(publication, &prepared, channel_id).await.dispatch_result(),
            Err(e) => {
                warn!(error = %e, "publication rejected");
                DispatchResult::failed(&e)
            }
        }
    }

    /// Dispatch an already validated publication. `publication` is what gets
    /// stored when the publication is scheduled.
    pub async fn dispatch(
        &self,
        publication: &Publication,
        prepared: &Prepared,
        channel_id: &str,
    ) -> ChannelOutcome {
        let channel = match resolve_channel(self.channels.as_ref(), channel_id).await {
            Ok(channel) => channel,
            Err(e) => {
                warn!(channel = channel_id, error = %e, "channel unresolved");
                return ChannelOutcome {
                    channel_id: channel_id.to_string(),
                    channel_title: channel_id.to_string(),
                    result: Err(e),
                };
            }
        };

        let result = match prepared.schedule() {
            Some(at) => self
                .schedules
                .persist(ScheduledPublication {
                    channel_id: channel_id.to_string(),
                    scheduled_at: at,
                    publication: publication.clone(),
                })
                .await
                .map(|()| Outcome::Scheduled { at }),
            None => {
                let plan = plan(prepared, &channel.chat_id);
                info!(channel = %channel.title, methods = ?plan.methods(), "sending");
                execute(self.api.as_ref(), &channel.bot_token, &plan)
                    .await
                    .map(|message_ids| Outcome::Published { message_ids })
            }
        };

        if let Err(e) = &result {
            warn!(channel = %channel.title, error = %e, "dispatch failed");
        }

        ChannelOutcome {
            channel_id: channel_id.to_string(),
            channel_title: channel.title,
            result,
        }
    }
}
