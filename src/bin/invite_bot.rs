//! invite_bot: Telegram bot that invites a CSV list of users into a group.
//!
//! Reads config from env vars (a `.env` file is honoured):
//!   BOT_TOKEN        : Bot API token (required)
//!   GROUP_ID         : destination group id (required)
//!   ADMIN_IDS        : comma-separated admin user ids (required)
//!   CSV_FILE         : source list (default: username.csv)
//!   DELAY_SECONDS    : pause between adds (default: 5)
//!   TELEGRAM_API_URL : Bot API root (default: https://api.telegram.org)
//!   POLL_TIMEOUT_SECS: long-poll timeout (default: 30)

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use group_invite_bot::messages;
use group_invite_bot::telegram::{TelegramClient, Update, UpdatePoller};
use group_invite_bot::{
    BotConfig, ControllerSettings, Dispatcher, Gatekeeper, InvitationController, Notifier,
    TelegramMembership,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,group_invite_bot=debug".into()),
        )
        .init();

    let config = BotConfig::from_env().context("Invalid bot configuration")?;
    info!(?config, "Configuration loaded");

    let api = Arc::new(
        TelegramClient::new(&config.api_url, &config.bot_token, config.poll_timeout_secs)
            .context("Failed to create Telegram client")?,
    );

    match api.get_me().await {
        Ok(me) => info!(bot_id = me.id, username = ?me.username, "Authenticated with Bot API"),
        Err(e) => warn!(error = %e, "getMe failed, continuing"),
    }

    let notifier = Notifier::new(api.clone(), config.admin_ids.clone());
    let controller = Arc::new(InvitationController::new(
        Arc::new(TelegramMembership::new(api.clone())),
        notifier.clone(),
        ControllerSettings::new(config.group_id, config.delay),
    ));
    let dispatcher = Arc::new(Dispatcher::new(
        controller.clone(),
        Gatekeeper::new(config.admin_ids.iter().copied()),
        api.clone(),
        config.csv_file.clone(),
    ));

    notifier.broadcast(messages::STARTUP).await;

    let mut poller = UpdatePoller::new(api.clone(), config.poll_timeout_secs);
    poller.skip_pending().await;

    let (updates, worker) = dispatcher.clone().spawn_worker();
    let on_update = move |update: Update| {
        if updates.send(update).is_err() {
            warn!("Update worker is gone, dropping update");
        }
    };

    tokio::select! {
        _ = poller.run(on_update) => {}
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl-C")?;
            info!("Shutdown requested");
        }
    }

    // The poller future owned the only sender; the worker drains and exits.
    if let Err(e) = worker.await {
        warn!(error = %e, "Update worker failed");
    }

    if controller.stop() {
        info!("Waiting for the current invitation step to finish");
    }

    if let Some(outcome) = controller.wait().await {
        match serde_json::to_string(&outcome) {
            Ok(json) => info!(outcome = %json, "Invitation run ended"),
            Err(_) => info!(?outcome, "Invitation run ended"),
        }
    }

    Ok(())
}
