use std::collections::BTreeSet;

use color_eyre::{eyre::OptionExt, Result};
use libsql::params;

use super::helpers::{placeholders, positional, query_all, query_ids};
use super::models::QuestionRow;
use super::topic::find_or_create_topic;
use super::Db;
use crate::models::{join_choices, MultipleChoice, Question, QuestionBank, QuestionKind};

impl Db {
    /// Ids of every question tagged with at least one of `topic_names`,
    /// each id once, ascending.
    pub async fn find_question_ids_by_topics(
        &self,
        topic_names: &BTreeSet<String>,
    ) -> Result<Vec<i64>> {
        if topic_names.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.connect()?;
        let sql = format!(
            r#"
            SELECT DISTINCT qt.question_id
            FROM question_topics qt
            JOIN topics t ON t.id = qt.topic_id
            WHERE t.name IN ({})
            ORDER BY qt.question_id
            "#,
            placeholders(topic_names.len())
        );

        query_ids(&conn, &sql, positional(topic_names.iter().cloned())).await
    }

    /// Questions with the given ids, resolved to their variants. Unknown ids
    /// are skipped; the result is ordered by id.
    pub async fn find_questions_by_ids(&self, ids: &[i64]) -> Result<Vec<Question>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.connect()?;
        let sql = format!(
            r#"
            SELECT q.id, q.text, q.qtype, mc.correct, mc.incorrect
            FROM questions q
            LEFT JOIN multiple_choice mc ON mc.id = q.id
            WHERE q.id IN ({})
            ORDER BY q.id
            "#,
            placeholders(ids.len())
        );

        let rows: Vec<QuestionRow> =
            query_all(&conn, &sql, positional(ids.iter().copied())).await?;

        let questions = rows
            .into_iter()
            .map(Question::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(questions)
    }

    pub async fn create_multiple_choice(
        &self,
        text: &str,
        correct: &[String],
        incorrect: &[String],
        topics: &[String],
    ) -> Result<i64> {
        let conn = self.connect()?;
        let tx = conn.transaction().await?;

        let question_id = insert_multiple_choice(&tx, text, correct, incorrect, topics).await?;

        tx.commit().await?;

        tracing::info!("new multiple choice question created: id={question_id}");
        Ok(question_id)
    }

    /// Imports a whole question bank in one transaction. Returns the number of
    /// questions added.
    pub async fn import_question_bank(&self, bank: QuestionBank) -> Result<usize> {
        let conn = self.connect()?;
        let tx = conn.transaction().await?;

        for question in &bank {
            insert_multiple_choice(
                &tx,
                &question.text,
                &question.correct,
                &question.incorrect,
                &question.topics,
            )
            .await?;
        }

        tx.commit().await?;

        tracing::info!("imported {} questions", bank.len());
        Ok(bank.len())
    }

    /// Removes a question and its topic links. Its topics are kept.
    pub async fn delete_question(&self, question_id: i64) -> Result<()> {
        let conn = self.connect()?;
        let tx = conn.transaction().await?;

        tx.execute(
            "DELETE FROM question_topics WHERE question_id = ?",
            params![question_id],
        )
        .await?;
        tx.execute(
            "DELETE FROM multiple_choice WHERE id = ?",
            params![question_id],
        )
        .await?;
        tx.execute("DELETE FROM questions WHERE id = ?", params![question_id])
            .await?;

        tx.commit().await?;

        tracing::info!("deleted question {question_id}");
        Ok(())
    }

    pub async fn questions_count(&self) -> Result<i64> {
        let conn = self.connect()?;
        let count = conn
            .query("SELECT COUNT(*) FROM questions", ())
            .await?
            .next()
            .await?
            .ok_or_eyre("could not count questions")?
            .get::<i64>(0)?;
        Ok(count)
    }
}

async fn insert_multiple_choice(
    conn: &libsql::Connection,
    text: &str,
    correct: &[String],
    incorrect: &[String],
    topics: &[String],
) -> Result<i64> {
    // Validate before touching the store.
    MultipleChoice::new(0, text.to_owned(), correct.to_vec(), incorrect.to_vec())?;

    let question_id = conn
        .query(
            "INSERT INTO questions (text, qtype) VALUES (?, ?) RETURNING id",
            params![text, QuestionKind::MultipleChoice.as_str()],
        )
        .await?
        .next()
        .await?
        .ok_or_eyre("could not get question id")?
        .get::<i64>(0)?;

    conn.execute(
        "INSERT INTO multiple_choice (id, correct, incorrect) VALUES (?, ?, ?)",
        params![question_id, join_choices(correct), join_choices(incorrect)],
    )
    .await?;

    for name in topics {
        let topic_id = find_or_create_topic(conn, name).await?;
        conn.execute(
            "INSERT OR IGNORE INTO question_topics (question_id, topic_id) VALUES (?, ?)",
            params![question_id, topic_id],
        )
        .await?;
    }

    Ok(question_id)
}
