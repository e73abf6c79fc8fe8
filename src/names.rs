use std::time::Duration;

pub const HOME_URL: &str = "/";
pub const QUIZ_SETUP_URL: &str = "/quiz-setup";
pub const QUIZ_ROUND_URL: &str = "/quiz-round";
pub const QUIZ_SUBMIT_URL: &str = "/quiz-submit";
pub const QUIZ_RESET_URL: &str = "/quiz-reset";
pub const QUIZ_QUESTIONS_URL: &str = "/quiz-questions";

pub const QUIZ_SESSION_COOKIE_NAME: &str = "quiz_session";
/// Lifetime of the session cookie; stored session state idle for longer is purged.
pub const SESSION_MAX_AGE: Duration = Duration::from_secs(60 * 60 * 24);
/// How often stale session state is swept.
pub const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

// Session state keys
pub const SESSION_QUESTION_IDS: &str = "question_ids";
pub const SESSION_BLOCK_SIZE: &str = "block_size";
pub const SESSION_ACTIVE_QUESTIONS: &str = "active_questions";
pub const SESSION_ANSWER_KEY: &str = "answer_key";

// Quiz defaults
pub const DEFAULT_BLOCK_SIZE: usize = 5;

/// Form field carrying the choice for the round-local question `idx`.
pub fn answer_field(idx: usize) -> String {
    format!("q{idx}")
}
