//! Lead persistence.

use {
    async_trait::async_trait,
    buran_common::now_ms,
    sqlx::SqlitePool,
    tracing::debug,
};

use crate::{
    Result,
    model::{Lead, LeadStatus, NewLead},
};

#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Validate and insert a lead with status `new`.
    async fn create(&self, lead: NewLead) -> Result<Lead>;
    async fn get(&self, id: i64) -> Result<Option<Lead>>;
}

/// SQLite-backed [`LeadStore`].
pub struct SqliteLeadStore {
    pool: SqlitePool,
}

impl SqliteLeadStore {
    /// Use a shared pool. [`crate::run_migrations`] must have been called.
    pub fn with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeadStore for SqliteLeadStore {
    async fn create(&self, lead: NewLead) -> Result<Lead> {
        let lead = lead.normalized()?;
        let created_at = now_ms();
        let status = LeadStatus::New;

        let id = sqlx::query(
            "INSERT INTO leads (name, phone, country, form_type, status, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&lead.name)
        .bind(&lead.phone)
        .bind(&lead.country)
        .bind(&lead.form_type)
        .bind(status)
        .bind(created_at)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        debug!(id, form_type = %lead.form_type, "lead stored");
        Ok(Lead {
            id,
            name: lead.name,
            phone: lead.phone,
            country: lead.country,
            form_type: lead.form_type,
            status,
            created_at,
        })
    }

    async fn get(&self, id: i64) -> Result<Option<Lead>> {
        let lead = sqlx::query_as::<_, Lead>(
            "SELECT id, name, phone, country, form_type, status, created_at FROM leads WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(lead)
    }
}
