use std::{fs, process::exit, sync::Arc};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;

use postfox::{
    config::Config,
    content::{resolve_images, ImageSource},
    ConfigChannelStore, JsonFileScheduleStore, MultiChannelOrchestrator, PollContent, PostContent,
    Publication, Publisher, SequentialWithDelay, TelegramClient,
};

#[derive(Parser)]
#[clap(version, about)]
struct Args {
    /// Toml configuration with channels and telegram settings.
    #[clap(short, long, value_parser, default_value = "postfox.toml")]
    config: String,

    /// Scheduled publications file. Can be redefined in config.
    #[clap(short = 's', long, value_parser, default_value = "postfox.scheduled.json")]
    schedule_store: String,

    /// Ignores config schedule store file and use by command line arguments.
    #[clap(long, value_parser, default_value_t = false)]
    ignore_config_schedule_store: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Publish a post described by a toml file.
    Post {
        #[clap(short, long, value_parser)]
        file: String,
        /// Channel id from config. Repeat for several channels.
        #[clap(short = 'c', long = "channel", value_parser, required = true)]
        channels: Vec<String>,
    },
    /// Publish a poll described by a toml file.
    Poll {
        #[clap(short, long, value_parser)]
        file: String,
        #[clap(short = 'c', long = "channel", value_parser, required = true)]
        channels: Vec<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match run(Args::parse()).await {
        Ok(true) => {}
        Ok(false) => exit(2),
        Err(e) => {
            eprintln!("{e:#}");
            exit(1);
        }
    }
}

/// `Ok(false)` when at least one channel did not get the publication.
async fn run(args: Args) -> anyhow::Result<bool> {
    println!("Try reading config from {}...", args.config);

    let cfg = fs::read_to_string(&args.config)
        .with_context(|| format!("failed to open {} for reading", args.config))?;
    let cfg: Config = toml::from_str(&cfg).context("invalid config")?;

    let schedule_store = if args.ignore_config_schedule_store {
        args.schedule_store
    } else {
        cfg.schedule_store.clone().unwrap_or(args.schedule_store)
    };

    let (publication, channels) = match args.command {
        Command::Post { file, channels } => {
            let mut post: PostContent = read_toml(&file)?;
            let sources = post.images.iter().map(|i| ImageSource::from(i.as_str())).collect();
            post.images = resolve_images(None, sources).await?;
            (Publication::from(post), channels)
        }
        Command::Poll { file, channels } => {
            let poll: PollContent = read_toml(&file)?;
            (Publication::from(poll), channels)
        }
    };

    let api = TelegramClient::new(cfg.telegram.api_base.clone(), cfg.telegram.timeout())?;
    let publisher = Publisher::new(
        Arc::new(api),
        Arc::new(ConfigChannelStore::new(cfg.channels)),
        Arc::new(JsonFileScheduleStore::new(schedule_store)),
    );
    let orchestrator =
        MultiChannelOrchestrator::with_policy(publisher, SequentialWithDelay(cfg.telegram.delay()));

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupted, finishing current channel");
            on_signal.cancel();
        }
    });

    let report = match orchestrator
        .dispatch(&publication, &channels, &cancel, |p| {
            println!("[{}/{}] {}: {}", p.current, p.total, p.channel_title, p.outcome.message);
        })
        .await
    {
        Ok(report) => report,
        Err(e) if e.is_validation() => anyhow::bail!("publication rejected ({}): {e}", e.message()),
        Err(e) => return Err(e.into()),
    };

    println!(
        "Done. {} succeeded, {} failed, {} skipped.",
        report.success.len(),
        report.failed.len(),
        report.skipped.len()
    );
    for title in &report.failed {
        eprintln!("[FAILURE] {title}");
    }

    Ok(report.all_succeeded())
}

fn read_toml<T: serde::de::DeserializeOwned>(path: &str) -> anyhow::Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?;
    toml::from_str(&text).with_context(|| format!("invalid {path}"))
}
