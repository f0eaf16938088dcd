//! Fan a publication out to several channels, one at a time.
//!
//! Channels are never processed concurrently. Between two channels the
//! `RateLimitPolicy` decides how long to wait. A failed channel is recorded
//! and the next one is tried; cancellation stops before the next channel
//! and keeps what is already done.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::content::Publication;
use crate::error::ComposeError;
use crate::publisher::{DispatchResult, Publisher};
use crate::validate::Prepared;

pub const DEFAULT_CHANNEL_DELAY: Duration = Duration::from_millis(1000);

/// Pacing between consecutive channels.
#[async_trait]
pub trait RateLimitPolicy: Send + Sync {
    /// Called before channel `index` (0-based). Returns `false` if the wait
    /// was cut short by cancellation.
    async fn wait(&self, index: usize, cancel: &CancellationToken) -> bool;
}

/// Fixed pause before every channel except the first.
#[derive(Clone, Copy, Debug)]
pub struct SequentialWithDelay(pub Duration);

impl Default for SequentialWithDelay {
    fn default() -> Self {
        Self(DEFAULT_CHANNEL_DELAY)
    }
}

#[async_trait]
impl RateLimitPolicy for SequentialWithDelay {
    async fn wait(&self, index: usize, cancel: &CancellationToken) -> bool {
        if index == 0 || self.0.is_zero() {
            return !cancel.is_cancelled();
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            _ = tokio::time::sleep(self.0) => true,
        }
    }
}

/// Reported after each channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Progress {
    /// 1-based.
    pub current: usize,
    pub total: usize,
    pub channel_title: String,
    pub outcome: DispatchResult,
}

/// Channel titles by outcome. Every attempted channel is in exactly one of
/// `success` or `failed`; `skipped` holds ids never attempted because of
/// cancellation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FanOutReport {
    pub success: Vec<String>,
    pub failed: Vec<String>,
    pub skipped: Vec<String>,
}

impl FanOutReport {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }
}

pub struct MultiChannelOrchestrator<P = SequentialWithDelay> {
    publisher: Publisher,
    policy: P,
}

impl MultiChannelOrchestrator<SequentialWithDelay> {
    pub fn new(publisher: Publisher) -> Self {
        Self::with_policy(publisher, SequentialWithDelay::default())
    }
}

impl<P: RateLimitPolicy> MultiChannelOrchestrator<P> {
    pub fn with_policy(publisher: Publisher, policy: P) -> Self {
        Self { publisher, policy }
    }

    /// Validate once, then dispatch to each channel in order. Validation
    /// failures are returned before any channel is touched.
    pub async fn dispatch<F>(
        &self,
        publication: &Publication,
        channel_ids: &[String],
        cancel: &CancellationToken,
        mut on_progress: F,
    ) -> Result<FanOutReport, ComposeError>
    where
        F: FnMut(Progress) + Send,
    {
        let prepared = Prepared::prepare(publication, Utc::now())?;
        let total = channel_ids.len();
        let mut report = FanOutReport::default();

        for (index, channel_id) in channel_ids.iter().enumerate() {
            if !self.policy.wait(index, cancel).await {
                info!(done = index, total, "fan-out cancelled");
                report.skipped.extend(channel_ids[index..].iter().cloned());
                break;
            }

            let outcome = self.publisher.dispatch(publication, &prepared, channel_id).await;
            let result = outcome.dispatch_result();

            info!(
                current = index + 1,
                total,
                channel = %outcome.channel_title,
                success = result.success,
                "channel processed"
            );

            if outcome.is_success() {
                report.success.push(outcome.channel_title.clone());
            } else {
                report.failed.push(outcome.channel_title.clone());
            }

            on_progress(Progress {
                current: index + 1,
                total,
                channel_title: outcome.channel_title,
                outcome: result,
            });
        }

        Ok(report)
    }
}
