use ledger_buddy::{
    bot::{BotData, run_bot},
    config::{self, database},
    core::service::LedgerService,
    errors::{Error, Result},
};
use dotenvy::dotenv;
use std::env;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Load config.toml (participants, field options, proof storage)
    let ledger_config = config::load_default_config()
        .inspect_err(|e| error!("Failed to load ledger configuration: {}", e))?;
    info!(
        participants = ledger_config.participants.len(),
        "Loaded ledger configuration"
    );

    // 4. Open the database and make sure the tables exist
    let db = database::create_connection(&database::get_database_url())
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Assemble the ledger
    let service = LedgerService::from_config(&ledger_config, db.clone())?;
    let data = BotData::new(service, ledger_config.currency);

    // 6. Run the bot; the token is read here, directly before use
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {}", e))
        .map_err(Error::EnvVar)?;

    let outcome = run_bot(token, data).await;

    info!("Shutting down, closing database connection");
    db.close().await?;
    outcome
}
