use std::collections::{BTreeMap, BTreeSet};

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::models::{MultipleChoice, Topic};

// ---------------------------------------------------------------------------
// Round selection
// ---------------------------------------------------------------------------

/// Keeps only the requested names that belong to a known topic.
///
/// Unknown names are dropped without being reported.
pub fn match_topics(requested: &BTreeSet<String>, known: &[Topic]) -> BTreeSet<String> {
    known
        .iter()
        .filter(|topic| requested.contains(&topic.name))
        .map(|topic| topic.name.clone())
        .collect()
}

/// Permutes the id list in place for a randomized quiz.
pub fn shuffle_ids<R: Rng + ?Sized>(ids: &mut [i64], rng: &mut R) {
    ids.shuffle(rng);
}

// ---------------------------------------------------------------------------
// Round dequeue
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dequeued {
    pub block: Vec<i64>,
    pub remainder: Vec<i64>,
}

impl Dequeued {
    /// Nothing is left for another round after this one.
    pub fn is_final(&self) -> bool {
        self.remainder.is_empty()
    }
}

/// Takes the trailing `block_size` ids as the next round.
///
/// Popping from the tail of a shuffled list samples without replacement. When
/// fewer than `block_size` ids remain the whole list is returned as the block.
pub fn dequeue_block(remaining: &[i64], block_size: usize) -> Dequeued {
    let split = remaining.len().saturating_sub(block_size);
    Dequeued {
        block: remaining[split..].to_vec(),
        remainder: remaining[..split].to_vec(),
    }
}

// ---------------------------------------------------------------------------
// Answer key
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerKeyEntry {
    pub question_id: i64,
    pub question_text: String,
    pub presented_choices: Vec<String>,
    pub correct_presented_index: usize,
}

impl AnswerKeyEntry {
    pub fn correct_choice(&self) -> Option<&str> {
        self.presented_choices
            .get(self.correct_presented_index)
            .map(String::as_str)
    }
}

/// Shuffles the choices of every question and records where the first
/// correct answer ended up.
pub fn build_answer_key<R: Rng + ?Sized>(
    questions: &[MultipleChoice],
    rng: &mut R,
) -> Vec<AnswerKeyEntry> {
    questions
        .iter()
        .map(|question| answer_key_entry(question, rng))
        .collect()
}

fn answer_key_entry<R: Rng + ?Sized>(question: &MultipleChoice, rng: &mut R) -> AnswerKeyEntry {
    let candidates: Vec<&String> = question
        .correct()
        .iter()
        .chain(question.incorrect())
        .collect();

    let mut permutation: Vec<usize> = (0..candidates.len()).collect();
    permutation.shuffle(rng);

    let presented_choices = permutation
        .iter()
        .map(|&source| candidates[source].clone())
        .collect();

    // Candidate 0 is always the first correct answer.
    let correct_presented_index = permutation
        .iter()
        .position(|&source| source == 0)
        .unwrap_or_default();

    AnswerKeyEntry {
        question_id: question.id(),
        question_text: question.text().to_owned(),
        presented_choices,
        correct_presented_index,
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Correct,
    Incorrect,
}

impl Verdict {
    pub const fn as_str(self) -> &'static str {
        match self {
            Verdict::Correct => "correct",
            Verdict::Incorrect => "incorrect",
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ScoreError {
    #[error("answer for question {index} but the round only has {len} questions")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Scores submitted choices against the stored answer key.
///
/// Values that are not a non-negative integer score as incorrect. Questions
/// without a submitted value get no verdict. A round-local index beyond the
/// answer key rejects the whole submission.
pub fn score(
    submitted: &BTreeMap<usize, String>,
    answer_key: &[AnswerKeyEntry],
) -> Result<BTreeMap<usize, Verdict>, ScoreError> {
    submitted
        .iter()
        .map(|(&index, value)| {
            let entry = answer_key.get(index).ok_or(ScoreError::IndexOutOfRange {
                index,
                len: answer_key.len(),
            })?;
            let verdict = match value.trim().parse::<usize>() {
                Ok(chosen) if chosen == entry.correct_presented_index => Verdict::Correct,
                _ => Verdict::Incorrect,
            };
            Ok((index, verdict))
        })
        .collect()
}

/// Picks the `q<digits>` answer fields out of a submitted form.
///
/// Every other field is rejected, including anti-forgery tokens and near
/// misses such as `q`, `q1a` or `1q`.
pub fn extract_answers<'a, I>(fields: I) -> BTreeMap<usize, String>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    fields
        .into_iter()
        .filter_map(|(name, value)| Some((answer_field_index(name)?, value.to_owned())))
        .collect()
}

fn answer_field_index(name: &str) -> Option<usize> {
    let digits = name.strip_prefix('q')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Too many digits for usize: saturate so scoring still sees it out of range.
    Some(digits.parse().unwrap_or(usize::MAX))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
