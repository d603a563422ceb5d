use std::{sync::Arc, time::Duration};

use {
    teloxide::prelude::*,
    tokio::{task::JoinHandle, time::MissedTickBehavior},
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

use crate::{Result, poller::InboundPoller};

/// Check the token and clear any webhook so getUpdates works.
///
/// Returns the bot's username.
pub async fn connect(bot: &Bot) -> Result<Option<String>> {
    let me = bot.get_me().await?;
    bot.delete_webhook().await?;
    info!(username = ?me.username, "telegram bot connected (webhook cleared)");
    Ok(me.username.clone())
}

/// Run scheduled poll cycles every `interval` until `cancel` fires.
///
/// A tick that finds a cycle still running (for example one started by a
/// website `get`) is skipped. Cancellation is only observed between cycles.
pub fn spawn_polling(
    poller: Arc<InboundPoller>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_ms = interval.as_millis() as u64, "starting telegram reply polling loop");
        let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(100)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    info!("telegram polling stopped");
                    break;
                }
                _ = ticker.tick() => match poller.poll_if_idle().await {
                    None => debug!("previous poll cycle still running, tick skipped"),
                    Some(Ok(report)) if report.processed > 0 => {
                        debug!(
                            processed = report.processed,
                            correlated = report.correlated,
                            cursor = report.cursor,
                            "poll cycle complete"
                        );
                    },
                    Some(Ok(_)) => {},
                    Some(Err(e)) => warn!(error = %e, "telegram getUpdates failed"),
                },
            }
        }
    })
}
