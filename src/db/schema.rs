// Database schema initialization

use color_eyre::Result;

pub async fn create_schema(conn: &libsql::Connection) -> Result<()> {
    // Topic names are not unique; lookups by name match every copy.
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS topics (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        )
        "#,
        (),
    )
    .await?;

    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS questions (
            id INTEGER PRIMARY KEY,
            text TEXT NOT NULL,
            qtype TEXT NOT NULL
        )
        "#,
        (),
    )
    .await?;

    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS multiple_choice (
            id INTEGER PRIMARY KEY,
            correct TEXT NOT NULL,
            incorrect TEXT NOT NULL,
            FOREIGN KEY(id) REFERENCES questions(id)
        )
        "#,
        (),
    )
    .await?;

    // No cascades into either side: questions and topics outlive each other.
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS question_topics (
            question_id INTEGER NOT NULL,
            topic_id INTEGER NOT NULL,
            PRIMARY KEY(question_id, topic_id),
            FOREIGN KEY(question_id) REFERENCES questions(id),
            FOREIGN KEY(topic_id) REFERENCES topics(id)
        )
        "#,
        (),
    )
    .await?;

    conn.execute(
        r#"
        CREATE INDEX IF NOT EXISTS idx_question_topics_topic
        ON question_topics(topic_id)
        "#,
        (),
    )
    .await?;

    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS session_entries (
            session_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY(session_id, key)
        )
        "#,
        (),
    )
    .await?;

    add_session_timestamps(conn).await?;

    Ok(())
}

/// Brings a `session_entries` table created without `updated_at` up to date.
/// Existing rows get timestamp 0 and are purged on the next sweep.
async fn add_session_timestamps(conn: &libsql::Connection) -> Result<()> {
    let has_column = conn
        .query(
            "SELECT 1 FROM pragma_table_info('session_entries') WHERE name = 'updated_at'",
            (),
        )
        .await?
        .next()
        .await?
        .is_some();

    if !has_column {
        conn.execute(
            "ALTER TABLE session_entries ADD COLUMN updated_at INTEGER NOT NULL DEFAULT 0",
            (),
        )
        .await?;
        tracing::info!("added updated_at to session_entries");
    }

    conn.execute(
        r#"
        CREATE INDEX IF NOT EXISTS idx_session_entries_updated
        ON session_entries(updated_at)
        "#,
        (),
    )
    .await?;

    Ok(())
}
