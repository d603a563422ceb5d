use std::sync::Arc;

use {
    buran_channels::{OperatorMessage, OutboundDispatcher, OutboundTask},
    chrono::{DateTime, Utc},
    tracing::{info, warn},
};

#[cfg(feature = "metrics")]
use buran_metrics::{counter, labels, leads as lead_metrics};

use crate::{
    Result,
    model::{Lead, NewLead},
    notify::{lead_notification, sheet_row},
    store::LeadStore,
};

/// Accepts application forms and fans them out.
#[derive(Clone)]
pub struct LeadIntake {
    store: Arc<dyn LeadStore>,
    dispatcher: OutboundDispatcher,
}

impl LeadIntake {
    pub fn new(store: Arc<dyn LeadStore>, dispatcher: OutboundDispatcher) -> Self {
        Self { store, dispatcher }
    }

    /// Store the lead, then queue the spreadsheet row and the operator
    /// notification. Returns as soon as the lead is stored.
    pub async fn submit(&self, lead: NewLead) -> Result<Lead> {
        let lead = self.store.create(lead).await?;
        #[cfg(feature = "metrics")]
        counter!(lead_metrics::SUBMITTED_TOTAL, labels::FORM_TYPE => lead.form_type.clone())
            .increment(1);

        let submitted_at = DateTime::from_timestamp_millis(lead.created_at).unwrap_or_else(Utc::now);
        let tasks = [
            OutboundTask::Spreadsheet(sheet_row(&lead, submitted_at)),
            OutboundTask::Operator(OperatorMessage::new(lead_notification(&lead))),
        ];
        for task in tasks {
            let kind = task.kind();
            if let Err(e) = self.dispatcher.enqueue(task) {
                warn!(lead_id = lead.id, kind = kind.as_str(), error = %e, "lead fan-out dropped");
            }
        }

        info!(lead_id = lead.id, form_type = %lead.form_type, "lead submitted");
        Ok(lead)
    }
}
