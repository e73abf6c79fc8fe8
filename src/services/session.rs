use std::collections::{BTreeMap, BTreeSet, HashMap};

use color_eyre::{eyre::WrapErr, Result};
use serde::{de::DeserializeOwned, Serialize};

use super::round::{AnswerKeyEntry, Dequeued};
use crate::names;

/// Every session key the quiz owns.
pub const QUIZ_KEYS: [&str; 4] = [
    names::SESSION_QUESTION_IDS,
    names::SESSION_BLOCK_SIZE,
    names::SESSION_ACTIVE_QUESTIONS,
    names::SESSION_ANSWER_KEY,
];

/// Read-only view of a browser session's stored values, as JSON text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    entries: HashMap<String, String>,
}

impl SessionSnapshot {
    pub fn new(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.entries
            .get(key)
            .map(|raw| {
                serde_json::from_str(raw).wrap_err_with(|| format!("corrupt session value `{key}`"))
            })
            .transpose()
    }

    /// Checks the diff's guarded keys still hold the values they were read with.
    pub fn check(&self, diff: &SessionDiff) -> Result<(), SessionConflict> {
        for (key, expected) in diff.guards() {
            if self.entries.get(key).map(String::as_str) != expected {
                return Err(SessionConflict(key.to_owned()));
            }
        }
        Ok(())
    }

    /// The snapshot this one becomes once `diff` is applied.
    pub fn apply(mut self, diff: &SessionDiff) -> Self {
        for key in &diff.removes {
            self.entries.remove(key);
        }
        for (key, value) in &diff.writes {
            self.entries.insert(key.clone(), value.clone());
        }
        self
    }
}

/// A guarded key changed between reading a session and writing it back.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("session key `{0}` was modified concurrently")]
pub struct SessionConflict(pub String);

/// Writes and removals to apply to a session atomically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionDiff {
    writes: BTreeMap<String, String>,
    removes: BTreeSet<String>,
    /// Raw values keys must still hold for the diff to apply; `None` means absent.
    guards: BTreeMap<String, Option<String>>,
}

impl SessionDiff {
    pub fn set<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.removes.remove(key);
        self.writes.insert(key.to_owned(), raw);
        Ok(())
    }

    pub fn remove(&mut self, key: &str) {
        self.writes.remove(key);
        self.removes.insert(key.to_owned());
    }

    /// Makes the diff conditional on `key` being unchanged since `snapshot`.
    pub fn guard_unchanged(&mut self, key: &str, snapshot: &SessionSnapshot) {
        self.guards
            .insert(key.to_owned(), snapshot.entries.get(key).cloned());
    }

    /// True when applying the diff would change nothing. Guards alone do not count.
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty() && self.removes.is_empty()
    }

    pub fn guards(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.guards
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    pub fn writes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.writes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn removes(&self) -> impl Iterator<Item = &str> {
        self.removes.iter().map(String::as_str)
    }
}

/// The quiz state carried between the setup, round and submit requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSession {
    pub question_ids: Vec<i64>,
    pub block_size: usize,
    pub active_questions: Vec<i64>,
    pub answer_key: Vec<AnswerKeyEntry>,
}

impl QuizSession {
    /// Returns `None` when no quiz has been set up for this session.
    pub fn from_snapshot(snapshot: &SessionSnapshot, default_block_size: usize) -> Result<Option<Self>> {
        let Some(question_ids) = snapshot.get::<Vec<i64>>(names::SESSION_QUESTION_IDS)? else {
            return Ok(None);
        };
        let block_size = snapshot
            .get::<usize>(names::SESSION_BLOCK_SIZE)?
            .unwrap_or(default_block_size)
            .max(1);

        Ok(Some(Self {
            question_ids,
            block_size,
            active_questions: snapshot
                .get(names::SESSION_ACTIVE_QUESTIONS)?
                .unwrap_or_default(),
            answer_key: snapshot.get(names::SESSION_ANSWER_KEY)?.unwrap_or_default(),
        }))
    }

    /// Starts a quiz over `question_ids`, discarding any earlier round.
    pub fn setup(question_ids: &[i64], block_size: usize) -> Result<SessionDiff> {
        let mut diff = SessionDiff::default();
        diff.set(names::SESSION_QUESTION_IDS, question_ids)?;
        diff.set(names::SESSION_BLOCK_SIZE, &block_size)?;
        diff.remove(names::SESSION_ACTIVE_QUESTIONS);
        diff.remove(names::SESSION_ANSWER_KEY);
        Ok(diff)
    }

    /// Records a fetched round: the shrunken id list and its fresh answer key.
    pub fn round_fetched(dequeued: &Dequeued, answer_key: &[AnswerKeyEntry]) -> Result<SessionDiff> {
        let mut diff = SessionDiff::default();
        diff.set(names::SESSION_QUESTION_IDS, &dequeued.remainder)?;
        diff.set(names::SESSION_ACTIVE_QUESTIONS, &dequeued.block)?;
        diff.set(names::SESSION_ANSWER_KEY, answer_key)?;
        Ok(diff)
    }

    /// Empties the id list once every queued question has been dropped from
    /// the store, discarding the previous round.
    pub fn exhausted() -> Result<SessionDiff> {
        let mut diff = SessionDiff::default();
        diff.set(names::SESSION_QUESTION_IDS, &Vec::<i64>::new())?;
        diff.remove(names::SESSION_ACTIVE_QUESTIONS);
        diff.remove(names::SESSION_ANSWER_KEY);
        Ok(diff)
    }

    pub fn clear() -> SessionDiff {
        let mut diff = SessionDiff::default();
        for key in QUIZ_KEYS {
            diff.remove(key);
        }
        diff
    }

    pub fn is_exhausted(&self) -> bool {
        self.question_ids.is_empty()
    }
}
