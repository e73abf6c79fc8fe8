// Database module - question store and session state on libSQL

use std::{sync::Arc, time::Duration};

use color_eyre::{
    eyre::{ensure, OptionExt},
    Result,
};

mod helpers;
mod models;
mod question;
mod schema;
mod session;
mod topic;

/// How long a local connection waits on another connection's write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// Main database handle
#[derive(Clone)]
pub struct Db {
    db: Arc<libsql::Database>,
    local: bool,
}

impl Db {
    /// Opens `file:<path>` locally, anything else as a remote libSQL server.
    pub async fn new(url: String, auth_token: Option<String>) -> Result<Self> {
        let local = url.starts_with("file:");
        let db = if let Some(path) = url.strip_prefix("file:") {
            libsql::Builder::new_local(path).build().await?
        } else {
            libsql::Builder::new_remote(url, auth_token.unwrap_or_default())
                .build()
                .await?
        };
        let db = Self {
            db: Arc::new(db),
            local,
        };

        let conn = db.connect()?;

        // Verify connection
        let one = conn
            .query("SELECT 1", ())
            .await?
            .next()
            .await?
            .ok_or_eyre("connection check failed")?
            .get::<i32>(0)?;
        ensure!(one == 1, "connection check returned {one}");

        if local {
            // Readers keep going while a session write is in flight.
            conn.query("PRAGMA journal_mode = WAL", ()).await?;
        }

        schema::create_schema(&conn).await?;

        tracing::info!("database connection has been verified");

        Ok(db)
    }

    fn connect(&self) -> Result<libsql::Connection> {
        let conn = self.db.connect()?;
        if self.local {
            conn.busy_timeout(BUSY_TIMEOUT)?;
        }
        Ok(conn)
    }
}
