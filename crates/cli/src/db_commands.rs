use {buran_config::BuranConfig, clap::Subcommand};

#[derive(Subcommand)]
pub enum DbAction {
    /// Run all pending database migrations.
    Migrate,
    /// Delete all chat messages, settings and leads but keep the schema.
    Reset {
        /// Skip the confirmation guard.
        #[arg(long)]
        yes: bool,
    },
}

pub async fn handle_db(action: DbAction, config: &BuranConfig) -> anyhow::Result<()> {
    let pool = buran_gateway::db::connect(config).await?;
    let result = match action {
        DbAction::Migrate => {
            buran_gateway::db::migrate(&pool).await?;
            println!("All migrations complete.");
            Ok(())
        },
        DbAction::Reset { yes: false } => {
            eprintln!("This deletes every conversation, setting and lead. Re-run with --yes.");
            Ok(())
        },
        DbAction::Reset { yes: true } => {
            buran_gateway::db::migrate(&pool).await?;
            let deleted = buran_gateway::db::reset(&pool).await?;
            println!("Deleted {deleted} row(s).");
            Ok(())
        },
    };
    pool.close().await;
    result
}
