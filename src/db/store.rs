//! Per-request access to Postgres.
//! One private connection per invocation, no pooling at this layer.

use sqlx::migrate::Migrator;
use sqlx::{Connection, PgConnection};
use tracing::{info, warn};

use crate::error::{AppError, Result};

/// Schema migrations embedded from `./migrations`.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// A single open connection. Callers must hand it back through [`Store::close`]
/// once the handler returns, whatever the handler's outcome.
pub struct Store {
    conn: PgConnection,
}

impl Store {
    pub async fn connect(database_url: Option<&str>) -> Result<Self> {
        let url = database_url.ok_or(AppError::MissingDatabaseUrl)?;
        let conn = PgConnection::connect(url).await?;
        Ok(Self { conn })
    }

    pub fn conn(&mut self) -> &mut PgConnection {
        &mut self.conn
    }

    /// Graceful shutdown of the connection. A failed close only loses the
    /// goodbye message; the socket is dropped either way.
    pub async fn close(self) {
        if let Err(e) = self.conn.close().await {
            warn!("DB connection close error: {e}");
        }
    }
}

/// Applies pending migrations over a short-lived connection.
pub async fn migrate(database_url: &str) -> Result<()> {
    let mut store = Store::connect(Some(database_url)).await?;
    let outcome = MIGRATOR.run(store.conn()).await;
    store.close().await;
    outcome?;
    info!("Database schema up to date");
    Ok(())
}
