use std::collections::HashMap;
use std::time::Duration;

use color_eyre::{eyre::WrapErr, Result};
use libsql::{params, TransactionBehavior};

use super::helpers::query_all;
use super::models::SessionEntryRow;
use super::Db;
use crate::services::session::{SessionConflict, SessionDiff, SessionSnapshot};

const NOW: &str = "CAST(strftime('%s', 'now') AS INTEGER)";

impl Db {
    pub async fn session_snapshot(&self, session_id: &str) -> Result<SessionSnapshot> {
        let conn = self.connect()?;
        let rows: Vec<SessionEntryRow> = query_all(
            &conn,
            "SELECT key, value FROM session_entries WHERE session_id = ?",
            params![session_id],
        )
        .await?;

        let entries: HashMap<String, String> =
            rows.into_iter().map(|row| (row.key, row.value)).collect();
        Ok(SessionSnapshot::new(entries))
    }

    /// Applies every write and removal of `diff`, or none of them.
    ///
    /// Fails with [`SessionConflict`] when a key guarded by the diff no longer
    /// holds the value it was read with.
    pub async fn apply_session_diff(&self, session_id: &str, diff: &SessionDiff) -> Result<()> {
        if diff.is_empty() {
            return Ok(());
        }

        let conn = self.connect()?;
        // Take the write lock up front so the guard check and the writes see
        // the same state.
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .await?;

        for (key, expected) in diff.guards() {
            let mut rows = tx
                .query(
                    "SELECT value FROM session_entries WHERE session_id = ? AND key = ?",
                    params![session_id, key],
                )
                .await?;
            let current = match rows.next().await? {
                Some(row) => Some(row.get::<String>(0)?),
                None => None,
            };
            drop(rows);

            if current.as_deref() != expected {
                tx.rollback().await?;
                tracing::debug!("session={session_id}: `{key}` changed underneath a write");
                return Err(SessionConflict(key.to_owned()).into());
            }
        }

        for key in diff.removes() {
            tx.execute(
                "DELETE FROM session_entries WHERE session_id = ? AND key = ?",
                params![session_id, key],
            )
            .await?;
        }

        for (key, value) in diff.writes() {
            tx.execute(
                &format!(
                    r#"
                    INSERT INTO session_entries (session_id, key, value, updated_at)
                    VALUES (?, ?, ?, {NOW})
                    ON CONFLICT(session_id, key) DO UPDATE
                    SET value = excluded.value, updated_at = excluded.updated_at
                    "#
                ),
                params![session_id, key, value],
            )
            .await?;
        }

        tx.commit().await?;

        tracing::debug!("session={session_id} updated");
        Ok(())
    }

    /// Deletes every session not written to within `max_age`. Returns the
    /// number of entries removed.
    pub async fn purge_stale_sessions(&self, max_age: Duration) -> Result<u64> {
        let max_age = i64::try_from(max_age.as_secs()).wrap_err("session max age too large")?;

        let conn = self.connect()?;
        let purged = conn
            .execute(
                &format!(
                    r#"
                    DELETE FROM session_entries
                    WHERE session_id IN (
                        SELECT session_id FROM session_entries
                        GROUP BY session_id
                        HAVING MAX(updated_at) <= {NOW} - ?
                    )
                    "#
                ),
                params![max_age],
            )
            .await?;

        if purged > 0 {
            tracing::info!("purged {purged} stale session entries");
        }
        Ok(purged)
    }
}
