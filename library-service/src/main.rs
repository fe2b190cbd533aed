use library_service::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    init_tracing(&config)?;

    match config.database.clone() {
        Some(database) => serve_database(config, database).await,
        None => {
            tracing::info!("No database configured, using the in-memory store");
            serve(config, InMemoryStore::new()).await
        }
    }
}

async fn serve<St: Storage>(config: Config, store: St) -> Result<()> {
    let state = AppState::new(config.clone(), &store);
    Server::new(config).serve(router(state)).await
}

#[cfg(feature = "sqlite")]
async fn serve_database(config: Config, database: DatabaseConfig) -> Result<()> {
    tracing::info!(url = %database.url, "Opening SQLite store");
    let store = SqliteStore::connect(&database).await?;
    serve(config, store).await
}

#[cfg(not(feature = "sqlite"))]
async fn serve_database(_config: Config, database: DatabaseConfig) -> Result<()> {
    Err(Error::InvalidConfig(format!(
        "database '{}' is configured but this build lacks the `sqlite` feature",
        database.url
    )))
}
