//! HTTP server for the storefront and admin API.
//!
//! Configured from the environment (or `.env`): `DATABASE_URL`, `ZATCH_BIND`, `ZATCH_ENV`, ...

use tokio::net::TcpListener;
use zatch_backend::{app, ensure_database_exists, ensure_tables, init_tracing, AppState, Settings};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;
    init_tracing();

    ensure_database_exists(&settings.database_url).await?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .connect(&settings.database_url)
        .await?;
    ensure_tables(&pool).await?;

    let listener = TcpListener::bind(&settings.bind).await?;
    let addr = listener.local_addr()?;
    tracing::info!(env = ?settings.env, "zatch server listening on http://{}", addr);

    let state = AppState::new(pool, settings);
    axum::serve(listener, app(state)).await?;
    Ok(())
}
