use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use grb_core::{
    audit::AuditLogger, config::Config, messaging::port::MessagingPort, pending::PendingStore,
    registry::Registry,
};

use crate::{handlers, TelegramMessenger};

/// Process-wide shared state, parameter-injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub registry: Arc<Registry>,
    pub pending: Arc<PendingStore>,
    pub messenger: Arc<dyn MessagingPort>,
    pub audit: Arc<AuditLogger>,
    /// Our own user id, for spotting the bot in membership updates.
    pub bot_id: i64,
}

pub async fn run_polling(cfg: Arc<Config>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    let me = bot.get_me().await?;
    tracing::info!(username = me.username(), "relay started");
    tracing::info!(
        admins = cfg.admin_ids.len(),
        allowed = cfg.allowed_groups.len(),
        blocked = cfg.blocked_groups.len(),
        "registry seeded from configuration"
    );

    let registry = Arc::new(Registry::new(
        &cfg.admin_ids,
        &cfg.allowed_groups,
        &cfg.blocked_groups,
    ));
    let pending = Arc::new(PendingStore::new(cfg.pending_ttl));
    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let audit = Arc::new(AuditLogger::new(
        cfg.audit_log_path.clone(),
        cfg.audit_log_json,
    ));

    let state = Arc::new(AppState {
        cfg,
        registry,
        pending,
        messenger,
        audit,
        bot_id: me.id.0 as i64,
    });

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
