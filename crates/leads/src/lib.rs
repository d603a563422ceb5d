//! Website application form ("lead") intake.
//!
//! A submitted form is validated, stored, and then handed to the outbound
//! dispatcher twice: one row for the lead spreadsheet and one notification
//! for the operator chat. Neither delivery can fail the submission.

pub mod error;
pub mod intake;
pub mod model;
pub mod notify;
pub mod sheets;
pub mod store;

pub use {
    error::{Error, Result},
    intake::LeadIntake,
    model::{DEFAULT_FORM_TYPE, Lead, LeadStatus, NewLead},
    notify::{lead_notification, sheet_row},
    sheets::SheetsClient,
    store::{LeadStore, SqliteLeadStore},
};

/// Run database migrations for the leads crate.
///
/// Creates the `leads` table. Call at startup before constructing
/// [`SqliteLeadStore::with_pool`].
pub async fn run_migrations(pool: &sqlx::SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .set_ignore_missing(true)
        .run(pool)
        .await?;
    Ok(())
}
