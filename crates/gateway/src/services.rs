//! Wiring of stores, outbound targets and the reply poller.

use std::{sync::Arc, time::Duration};

use {
    buran_auto_reply::AutoReplies,
    buran_channels::{InboundPoll, OutboundDispatcher},
    buran_chat::ChatBridge,
    buran_config::BuranConfig,
    buran_leads::{LeadIntake, SheetsClient, SqliteLeadStore},
    buran_messages::{MessageStore, SqliteMessageStore},
    buran_settings::SettingsStore,
    buran_telegram::{
        InboundPoller, PollerState, ReplyCorrelator, TelegramRelay, build_bot, numeric_chat_id,
        shared_correlator,
    },
    sqlx::SqlitePool,
    teloxide::Bot,
    tokio::task::JoinHandle,
    tokio_util::sync::CancellationToken,
    tracing::info,
};

/// Everything the gateway and the CLI need, built from one config.
pub struct Services {
    pub chat: ChatBridge,
    pub leads: LeadIntake,
    /// `None` when no bot token is configured.
    pub bot: Option<Bot>,
    pub poller: Option<Arc<InboundPoller>>,
    /// Outbound worker; finishes after `cancel` fires and the queue drains.
    pub dispatcher_task: JoinHandle<()>,
}

impl Services {
    /// Must be called inside a tokio runtime; spawns the dispatcher worker.
    /// The pool must already be migrated.
    pub fn build(
        config: &BuranConfig,
        pool: SqlitePool,
        cancel: CancellationToken,
    ) -> anyhow::Result<Self> {
        let tg = &config.telegram;
        let messages: Arc<dyn MessageStore> = Arc::new(SqliteMessageStore::with_pool(pool.clone()));
        let replies = AutoReplies::new(SettingsStore::new(pool.clone()));

        let bot = build_bot(tg)?;
        let correlator = shared_correlator(ReplyCorrelator::new(
            Duration::from_secs(tg.correlation_ttl_secs),
            tg.correlation_capacity,
        ));
        let relay = Arc::new(TelegramRelay::new(bot.clone(), &tg.chat_id, correlator.clone()));
        let sheets = Arc::new(SheetsClient::new(config.sheets.url.clone())?);
        info!(
            telegram = bot.is_some(),
            sheets = sheets.is_configured(),
            "outbound targets configured"
        );

        let (dispatcher, dispatcher_task) =
            OutboundDispatcher::spawn(config.outbound.queue_capacity, relay, sheets, cancel);

        let poller = bot.clone().map(|bot| {
            Arc::new(InboundPoller::new(
                bot,
                numeric_chat_id(&tg.chat_id),
                tg.poll_limit,
                Arc::clone(&messages),
                PollerState::new(correlator),
            ))
        });

        let chat = ChatBridge::new(
            Arc::clone(&messages),
            replies,
            dispatcher.clone(),
            poller.clone().map(|p| p as Arc<dyn InboundPoll>),
        );
        let leads = LeadIntake::new(Arc::new(SqliteLeadStore::with_pool(pool)), dispatcher);

        Ok(Self {
            chat,
            leads,
            bot,
            poller,
            dispatcher_task,
        })
    }
}
