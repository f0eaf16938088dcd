//! Bot API transport.
//!
//! `BotApi` is the seam: `TelegramClient` talks to `api.telegram.org`,
//! tests plug in a recorder. No retries happen here; a failed call is
//! reported to the caller as is.

pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ComposeError;
use crate::planner::DispatchPlan;
use types::{RawResponse, SentMessage, TelegramResponse};

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

#[async_trait]
pub trait BotApi: Send + Sync {
    /// `POST <base>/bot<token>/<method>` with a JSON body.
    async fn call(
        &self,
        token: &str,
        method: &str,
        body: Value,
    ) -> Result<TelegramResponse<Value>, ComposeError>;
}

pub struct TelegramClient {
    client: reqwest::Client,
    api_base: String,
}

impl TelegramClient {
    pub fn new(api_base: impl Into<String>, timeout: Duration) -> Result<Self, ComposeError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl BotApi for TelegramClient {
    async fn call(
        &self,
        token: &str,
        method: &str,
        body: Value,
    ) -> Result<TelegramResponse<Value>, ComposeError> {
        let res = self
            .client
            .post(format!("{}/bot{}/{}", self.api_base, token, method))
            .json(&body)
            .send()
            .await?;

        let status = res.status().as_u16();
        let text = res.text().await?;

        match serde_json::from_str::<RawResponse<Value>>(&text) {
            Ok(raw) => Ok(raw.into_response(status)),
            Err(_) => {
                warn!(method, status, "bot api returned a non-json body");
                Ok(TelegramResponse::Error(status, "(postfox) Internal Error".into()))
            }
        }
    }
}

async fn send<B, T>(api: &dyn BotApi, token: &str, method: &str, body: &B) -> Result<T, ComposeError>
where
    B: Serialize,
    T: DeserializeOwned,
{
    debug!(method, "calling bot api");

    match api.call(token, method, serde_json::to_value(body)?).await? {
        TelegramResponse::Success(result) => Ok(serde_json::from_value(result)?),
        TelegramResponse::Error(code, description) => {
            warn!(method, code, %description, "bot api call failed");
            Err(ComposeError::telegram(code, description))
        }
    }
}

/// Run a plan against one chat. Returns the ids of every message created,
/// in order.
pub async fn execute(
    api: &dyn BotApi,
    token: &str,
    plan: &DispatchPlan,
) -> Result<Vec<i64>, ComposeError> {
    match plan {
        DispatchPlan::Message(body) => {
            let sent: SentMessage = send(api, token, "sendMessage", body).await?;
            Ok(vec![sent.message_id])
        }
        DispatchPlan::Photo(body) => {
            let sent: SentMessage = send(api, token, "sendPhoto", body).await?;
            Ok(vec![sent.message_id])
        }
        DispatchPlan::Poll(body) => {
            let sent: SentMessage = send(api, token, "sendPoll", body).await?;
            Ok(vec![sent.message_id])
        }
        DispatchPlan::MediaGroup { group, follow_up } => {
            let sent: Vec<SentMessage> = send(api, token, "sendMediaGroup", group).await?;
            let mut ids: Vec<i64> = sent.iter().map(|m| m.message_id).collect();

            if let Some(follow_up) = follow_up {
                let mut body = follow_up.clone();
                body.reply_to_message_id = ids.first().copied();
                let links: SentMessage = send(api, token, "sendMessage", &body).await?;
                ids.push(links.message_id);
            }

            Ok(ids)
        }
    }
}
