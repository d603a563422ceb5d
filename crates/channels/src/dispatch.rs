//! Bounded outbound queue drained by a single worker.

use std::sync::Arc;

use {
    serde::Serialize,
    tokio::{
        sync::{broadcast, mpsc},
        task::JoinHandle,
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

#[cfg(feature = "metrics")]
use buran_metrics::{counter, labels, outbound as outbound_metrics};

use crate::{
    Error, Result,
    outbound::{OperatorMessage, OperatorOutbound, SendOutcome, SheetRow, SpreadsheetSink},
};

const EVENT_BROADCAST_CAPACITY: usize = 256;

/// A side effect waiting to be performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundTask {
    Operator(OperatorMessage),
    Spreadsheet(SheetRow),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Operator,
    Spreadsheet,
}

impl TaskKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Operator => "operator",
            Self::Spreadsheet => "spreadsheet",
        }
    }
}

impl OutboundTask {
    #[must_use]
    pub fn kind(&self) -> TaskKind {
        match self {
            Self::Operator(_) => TaskKind::Operator,
            Self::Spreadsheet(_) => TaskKind::Spreadsheet,
        }
    }

    fn conversation(&self) -> Option<String> {
        match self {
            Self::Operator(m) => m.conversation.clone(),
            Self::Spreadsheet(_) => None,
        }
    }
}

/// Outcome notification broadcast to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OutboundEvent {
    /// The worker performed the task.
    Completed {
        kind: TaskKind,
        #[serde(skip_serializing_if = "Option::is_none")]
        conversation: Option<String>,
        outcome: SendOutcome,
    },
    /// The task never reached the worker.
    Dropped { kind: TaskKind, reason: String },
}

/// Cloneable handle for enqueuing outbound tasks.
#[derive(Clone)]
pub struct OutboundDispatcher {
    tx: mpsc::Sender<OutboundTask>,
    events: broadcast::Sender<OutboundEvent>,
    capacity: usize,
}

impl OutboundDispatcher {
    /// Start the worker. It runs until `cancel` fires (then drains what is
    /// already queued) or until every handle is dropped.
    pub fn spawn(
        capacity: usize,
        operator: Arc<dyn OperatorOutbound>,
        sheets: Arc<dyn SpreadsheetSink>,
        cancel: CancellationToken,
    ) -> (Self, JoinHandle<()>) {
        let capacity = capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        let (events, _) = broadcast::channel(EVENT_BROADCAST_CAPACITY);

        let worker = Worker {
            operator,
            sheets,
            events: events.clone(),
        };
        let handle = tokio::spawn(worker.run(rx, cancel));

        (
            Self {
                tx,
                events,
                capacity,
            },
            handle,
        )
    }

    /// Queue a task without waiting. Never blocks on the network.
    ///
    /// A full or closed queue is logged, counted and broadcast as
    /// [`OutboundEvent::Dropped`]; the caller decides whether to care.
    pub fn enqueue(&self, task: OutboundTask) -> Result<()> {
        let kind = task.kind();
        match self.tx.try_send(task) {
            Ok(()) => {
                #[cfg(feature = "metrics")]
                counter!(outbound_metrics::TASKS_ENQUEUED_TOTAL, labels::KIND => kind.as_str())
                    .increment(1);
                debug!(kind = kind.as_str(), "outbound task queued");
                Ok(())
            },
            Err(e) => {
                let err = match e {
                    mpsc::error::TrySendError::Full(_) => Error::QueueFull {
                        capacity: self.capacity,
                    },
                    mpsc::error::TrySendError::Closed(_) => Error::Closed,
                };
                warn!(kind = kind.as_str(), error = %err, "outbound task dropped");
                #[cfg(feature = "metrics")]
                counter!(
                    outbound_metrics::TASKS_DROPPED_TOTAL,
                    labels::KIND => kind.as_str(),
                    labels::ERROR_TYPE => err.label()
                )
                .increment(1);
                let _ = self.events.send(OutboundEvent::Dropped {
                    kind,
                    reason: err.to_string(),
                });
                Err(err)
            },
        }
    }

    /// Receive every outcome from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<OutboundEvent> {
        self.events.subscribe()
    }
}

struct Worker {
    operator: Arc<dyn OperatorOutbound>,
    sheets: Arc<dyn SpreadsheetSink>,
    events: broadcast::Sender<OutboundEvent>,
}

impl Worker {
    async fn run(self, mut rx: mpsc::Receiver<OutboundTask>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    rx.close();
                    let mut drained = 0usize;
                    while let Some(task) = rx.recv().await {
                        self.perform(task).await;
                        drained += 1;
                    }
                    info!(drained, "outbound dispatcher stopped");
                    return;
                }
                task = rx.recv() => match task {
                    Some(task) => self.perform(task).await,
                    None => {
                        debug!("all dispatcher handles dropped, worker exiting");
                        return;
                    }
                },
            }
        }
    }

    async fn perform(&self, task: OutboundTask) {
        let kind = task.kind();
        let conversation = task.conversation();
        let outcome = match &task {
            OutboundTask::Operator(message) => self.operator.send(message).await,
            OutboundTask::Spreadsheet(row) => self.sheets.append_row(row).await,
        };

        match &outcome {
            SendOutcome::Sent { message_id } => {
                debug!(kind = kind.as_str(), message_id, "outbound task delivered");
            },
            SendOutcome::NotConfigured => {
                debug!(kind = kind.as_str(), "outbound target not configured, skipped");
            },
            SendOutcome::Failed { reason } => {
                warn!(kind = kind.as_str(), conversation = ?conversation, reason, "outbound task failed");
            },
        }

        #[cfg(feature = "metrics")]
        counter!(
            outbound_metrics::TASKS_COMPLETED_TOTAL,
            labels::KIND => kind.as_str(),
            labels::OUTCOME => outcome.label()
        )
        .increment(1);

        // No subscribers is fine.
        let _ = self.events.send(OutboundEvent::Completed {
            kind,
            conversation,
            outcome,
        });
    }
}
