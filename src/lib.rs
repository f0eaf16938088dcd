//! Post Fox: composes channel posts and polls and turns them into the
//! right sequence of Telegram Bot API calls.

pub mod channels;
pub mod config;
pub mod content;
pub mod error;
pub mod limits;
pub mod orchestrator;
pub mod planner;
pub mod publisher;
pub mod sanitize;
pub mod schedule;
pub mod telegram;
pub mod validate;

pub use channels::{Channel, ChannelStore, ConfigChannelStore, ResolvedChannel};
pub use content::{ImagePosition, InlineButton, PollContent, PostContent, Publication};
pub use error::{ComposeError, TelegramErrorKind};
pub use orchestrator::{FanOutReport, MultiChannelOrchestrator, Progress, SequentialWithDelay};
pub use publisher::{DispatchResult, Publisher};
pub use schedule::{JsonFileScheduleStore, ScheduleStore};
pub use telegram::{BotApi, TelegramClient};
