use color_eyre::{eyre::OptionExt, Result};
use libsql::params;

use super::helpers::{self, query_all};
use super::Db;
use crate::models::Topic;

impl Db {
    pub async fn find_topics(&self) -> Result<Vec<Topic>> {
        let conn = self.connect()?;
        query_all(&conn, "SELECT id, name FROM topics ORDER BY id", ()).await
    }

    pub async fn create_topic(&self, name: &str) -> Result<i64> {
        let conn = self.connect()?;
        let topic_id = insert_topic(&conn, name).await?;

        tracing::info!("new topic created: id={topic_id}, name={name}");
        Ok(topic_id)
    }

    /// Removes a topic and its question links. Tagged questions are kept.
    pub async fn delete_topic(&self, topic_id: i64) -> Result<()> {
        let conn = self.connect()?;
        let tx = conn.transaction().await?;

        tx.execute(
            "DELETE FROM question_topics WHERE topic_id = ?",
            params![topic_id],
        )
        .await?;
        tx.execute("DELETE FROM topics WHERE id = ?", params![topic_id])
            .await?;

        tx.commit().await?;

        tracing::info!("deleted topic {topic_id}");
        Ok(())
    }

    pub async fn topic_names_for_question(&self, question_id: i64) -> Result<Vec<String>> {
        let conn = self.connect()?;
        let mut rows = conn
            .query(
                r#"
                SELECT t.name FROM topics t
                JOIN question_topics qt ON qt.topic_id = t.id
                WHERE qt.question_id = ?
                ORDER BY t.name
                "#,
                params![question_id],
            )
            .await?;

        let mut names = Vec::new();
        while let Some(row) = rows.next().await? {
            names.push(row.get::<String>(0)?);
        }
        Ok(names)
    }
}

async fn insert_topic(conn: &libsql::Connection, name: &str) -> Result<i64> {
    conn.query(
        "INSERT INTO topics (name) VALUES (?) RETURNING id",
        params![name],
    )
    .await?
    .next()
    .await?
    .ok_or_eyre("could not get topic id")?
    .get::<i64>(0)
    .map_err(Into::into)
}

/// The lowest id carrying `name`, creating the topic if none does.
pub(super) async fn find_or_create_topic(conn: &libsql::Connection, name: &str) -> Result<i64> {
    let existing = helpers::query_id_optional(
        conn,
        "SELECT id FROM topics WHERE name = ? ORDER BY id LIMIT 1",
        params![name],
    )
    .await?;

    match existing {
        Some(id) => Ok(id),
        None => insert_topic(conn, name).await,
    }
}
