use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use guildbot::config;
use guildbot::events::Dispatcher;
use guildbot::model::{ChannelId, UserId};
use guildbot::notify::{Notifier, NotifyError};
use guildbot::reminders::{ReminderPolicy, Reminders};
use guildbot::scheduler::Scheduler;
use guildbot::site::SiteClient;
use guildbot::starboard::StarCache;
use guildbot::sync::DirectorySync;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
}

/// Stand-in notification sink used until a gateway adapter is attached;
/// deliveries are logged instead of posted.
struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn deliver(
        &self,
        destination: ChannelId,
        content: &str,
        mention: Option<UserId>,
    ) -> Result<(), NotifyError> {
        info!(destination, ?mention, content, "reminder notification");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;

    let site = Arc::new(SiteClient::from_config(&cfg)?);

    let scheduler = Scheduler::new();
    let reminders = Reminders::new(
        site.as_ref().clone(),
        LogNotifier,
        scheduler.clone(),
        ReminderPolicy {
            max_per_user: cfg.reminders.max_per_user,
            whitelisted_channels: cfg.reminders.whitelisted_channels.clone(),
            staff_roles: cfg.guild.staff_roles.clone(),
        },
    );

    info!("recovering reminder schedule from site");
    reminders.recover().await?;
    info!(live = scheduler.len(), "reminder schedule recovered");

    let star_cache = StarCache::new(site.clone());
    if let Err(err) = star_cache.populate().await {
        warn!(?err, "failed to populate starboard cache");
    }

    // The gateway adapter feeds this dispatcher; directory sync handlers
    // are registered up front.
    let mut dispatcher = Dispatcher::new();
    let directory = Arc::new(DirectorySync::new(site.clone()));

    let sync = directory.clone();
    dispatcher.on_role_created(Box::new(move |role| {
        let sync = sync.clone();
        Box::pin(async move {
            sync.role_created(&role).await?;
            Ok(())
        })
    }));
    let sync = directory.clone();
    dispatcher.on_role_updated(Box::new(move |role| {
        let sync = sync.clone();
        Box::pin(async move {
            sync.role_updated(&role).await?;
            Ok(())
        })
    }));
    let sync = directory.clone();
    dispatcher.on_member_joined(Box::new(move |user| {
        let sync = sync.clone();
        Box::pin(async move {
            sync.member_joined(&user).await?;
            Ok(())
        })
    }));
    let sync = directory.clone();
    dispatcher.on_member_left(Box::new(move |user| {
        let sync = sync.clone();
        Box::pin(async move {
            sync.member_left(&user).await?;
            Ok(())
        })
    }));
    info!("guildbot running; press ctrl-c to stop");
    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    Ok(())
}
