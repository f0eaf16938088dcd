use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;

use crate::content::Publication;
use crate::error::ComposeError;

/// A deferred publication, handed over in full to whatever sends it later.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduledPublication {
    pub channel_id: String,
    pub scheduled_at: DateTime<Utc>,
    pub publication: Publication,
}

/// External scheduling store.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn persist(&self, item: ScheduledPublication) -> Result<(), ComposeError>;
}

/// Keeps scheduled items as a JSON array in one file.
pub struct JsonFileScheduleStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileScheduleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    pub async fn load(&self) -> Result<Vec<ScheduledPublication>, ComposeError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(vec![]),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(vec![]),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ScheduleStore for JsonFileScheduleStore {
    async fn persist(&self, item: ScheduledPublication) -> Result<(), ComposeError> {
        let _guard = self.lock.lock().await;

        let mut items = self.load().await?;
        info!(channel = %item.channel_id, at = %item.scheduled_at, "storing scheduled publication");
        items.push(item);

        tokio::fs::write(&self.path, serde_json::to_vec_pretty(&items)?).await?;
        Ok(())
    }
}
