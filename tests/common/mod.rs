#![allow(dead_code)]

use topic_quiz::db::Db;

pub async fn create_test_db() -> Db {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    let id = COUNTER.fetch_add(1, Ordering::SeqCst);
    let path =
        std::env::temp_dir().join(format!("topic_quiz_test_{}_{}.db", std::process::id(), id));
    // Clean up leftover file from previous runs
    let _ = std::fs::remove_file(&path);
    let url = format!("file:{}", path.display());
    Db::new(url, None)
        .await
        .expect("failed to create test database")
}

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Ids of the two fixture questions.
pub struct Fixture {
    pub a: i64,
    pub b: i64,
}

/// Three topics and two questions: A tagged Topic1, B tagged Topic1 and
/// Topic2. Topic3 has no questions.
pub async fn seed_questions(db: &Db) -> Fixture {
    db.create_topic("Topic1").await.unwrap();
    db.create_topic("Topic2").await.unwrap();
    db.create_topic("Topic3").await.unwrap();

    let a = db
        .create_multiple_choice(
            "test text A",
            &strings(&["correct1"]),
            &strings(&["choice1", "choice2", "choice3"]),
            &strings(&["Topic1"]),
        )
        .await
        .unwrap();
    let b = db
        .create_multiple_choice(
            "test text B",
            &strings(&["correct2"]),
            &strings(&["choice1", "choice2", "choice3"]),
            &strings(&["Topic1", "Topic2"]),
        )
        .await
        .unwrap();

    Fixture { a, b }
}
