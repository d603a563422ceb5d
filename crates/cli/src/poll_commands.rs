use std::sync::Arc;

use {
    anyhow::Context,
    buran_config::BuranConfig,
    buran_messages::SqliteMessageStore,
    buran_telegram::{
        InboundPoller, PollerState, ReplyCorrelator, build_bot, numeric_chat_id, shared_correlator,
    },
};

/// One poll cycle with a fresh cursor and an empty correlator: only replies to
/// messages carrying a `Foydalanuvchi:` marker line can be attributed.
pub async fn poll(config: &BuranConfig) -> anyhow::Result<()> {
    let tg = &config.telegram;
    let bot = build_bot(tg)?.context("telegram is not configured (set TELEGRAM_BOT_TOKEN)")?;

    let pool = buran_gateway::db::connect(config).await?;
    buran_gateway::db::migrate(&pool).await?;

    let poller = InboundPoller::new(
        bot,
        numeric_chat_id(&tg.chat_id),
        tg.poll_limit,
        Arc::new(SqliteMessageStore::with_pool(pool.clone())),
        PollerState::new(shared_correlator(ReplyCorrelator::default())),
    );
    let report = poller.poll().await;
    pool.close().await;

    println!("{}", serde_json::to_string_pretty(&report?)?);
    Ok(())
}
