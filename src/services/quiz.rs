use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::future::Future;

use color_eyre::Result;
use rand::Rng;

use super::round::{self, AnswerKeyEntry, ScoreError, Verdict};
use super::session::{QuizSession, SessionConflict, SessionDiff, SessionSnapshot};
use crate::db::Db;
use crate::models::{MultipleChoice, Question, Topic};
use crate::names;

/// Attempts at a round fetch racing other requests for the same session.
const ROUND_FETCH_ATTEMPTS: usize = 5;

// ---------------------------------------------------------------------------
// QuizRepository trait (question store + session state)
// ---------------------------------------------------------------------------

#[cfg_attr(test, mockall::automock)]
pub trait QuizRepository: Send + Sync {
    fn find_topics(&self) -> impl Future<Output = Result<Vec<Topic>>> + Send;

    fn find_question_ids_by_topics(
        &self,
        topic_names: &BTreeSet<String>,
    ) -> impl Future<Output = Result<Vec<i64>>> + Send;

    fn find_questions_by_ids(
        &self,
        ids: &[i64],
    ) -> impl Future<Output = Result<Vec<Question>>> + Send;

    fn session_snapshot(
        &self,
        session_id: &str,
    ) -> impl Future<Output = Result<SessionSnapshot>> + Send;

    fn apply_session_diff(
        &self,
        session_id: &str,
        diff: &SessionDiff,
    ) -> impl Future<Output = Result<()>> + Send;
}

impl QuizRepository for Db {
    fn find_topics(&self) -> impl Future<Output = Result<Vec<Topic>>> + Send {
        Db::find_topics(self)
    }

    fn find_question_ids_by_topics(
        &self,
        topic_names: &BTreeSet<String>,
    ) -> impl Future<Output = Result<Vec<i64>>> + Send {
        Db::find_question_ids_by_topics(self, topic_names)
    }

    fn find_questions_by_ids(
        &self,
        ids: &[i64],
    ) -> impl Future<Output = Result<Vec<Question>>> + Send {
        Db::find_questions_by_ids(self, ids)
    }

    fn session_snapshot(
        &self,
        session_id: &str,
    ) -> impl Future<Output = Result<SessionSnapshot>> + Send {
        Db::session_snapshot(self, session_id)
    }

    fn apply_session_diff(
        &self,
        session_id: &str,
        diff: &SessionDiff,
    ) -> impl Future<Output = Result<()>> + Send {
        Db::apply_session_diff(self, session_id, diff)
    }
}

// ---------------------------------------------------------------------------
// Outcome enums
// ---------------------------------------------------------------------------

pub enum Selection {
    /// None of the requested names is a known topic.
    NoMatchingTopics,
    /// Ids of every question tagged with at least one matched topic.
    Questions(Vec<i64>),
}

pub enum Listing {
    NoMatchingTopics,
    /// Questions in the store's ascending id order.
    Questions(Vec<Question>),
}

pub enum SetupOutcome {
    /// Session written. Carries the number of queued questions.
    Started(usize),
    NoMatchingTopics,
}

pub struct Round {
    pub answer_key: Vec<AnswerKeyEntry>,
    /// Questions still queued after this round.
    pub remaining: usize,
}

impl Round {
    pub fn is_final(&self) -> bool {
        self.remaining == 0
    }
}

pub enum RoundOutcome {
    Round(Round),
    /// The id list is used up.
    Complete,
    /// No quiz has been set up for this session.
    NoQuiz,
}

pub struct RoundResults {
    pub answer_key: Vec<AnswerKeyEntry>,
    pub verdicts: BTreeMap<usize, Verdict>,
    pub remaining: usize,
}

impl RoundResults {
    pub fn correct_count(&self) -> usize {
        self.verdicts
            .values()
            .filter(|v| **v == Verdict::Correct)
            .count()
    }

    pub fn is_final(&self) -> bool {
        self.remaining == 0
    }
}

pub enum SubmitOutcome {
    Scored(RoundResults),
    /// No round has been fetched for this session.
    NoActiveRound,
    OutOfRange(ScoreError),
}

// ---------------------------------------------------------------------------
// QuizService
// ---------------------------------------------------------------------------

pub struct QuizService<R: QuizRepository = Db> {
    repo: R,
    block_size: usize,
}

impl<R: QuizRepository + Clone> Clone for QuizService<R> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            block_size: self.block_size,
        }
    }
}

impl<R: QuizRepository> QuizService<R> {
    pub fn new(repo: R, block_size: usize) -> Self {
        Self {
            repo,
            block_size: block_size.max(1),
        }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub async fn topics(&self) -> Result<Vec<Topic>> {
        self.repo.find_topics().await
    }

    /// Resolves requested topic names to question ids, in the store's
    /// ascending order.
    pub async fn select_questions(&self, requested: &BTreeSet<String>) -> Result<Selection> {
        let known = self.repo.find_topics().await?;
        let matched = round::match_topics(requested, &known);
        if matched.is_empty() {
            return Ok(Selection::NoMatchingTopics);
        }

        let ids = self.repo.find_question_ids_by_topics(&matched).await?;
        Ok(Selection::Questions(ids))
    }

    /// Every question of the requested topics for display, unshuffled. Does not
    /// touch any session.
    pub async fn list_questions(&self, requested: &BTreeSet<String>) -> Result<Listing> {
        let ids = match self.select_questions(requested).await? {
            Selection::Questions(ids) => ids,
            Selection::NoMatchingTopics => return Ok(Listing::NoMatchingTopics),
        };
        let questions = self.repo.find_questions_by_ids(&ids).await?;
        Ok(Listing::Questions(questions))
    }

    pub async fn setup<G: Rng + Send>(
        &self,
        session_id: &str,
        requested: &BTreeSet<String>,
        rng: &mut G,
    ) -> Result<SetupOutcome> {
        let mut ids = match self.select_questions(requested).await? {
            Selection::Questions(ids) => ids,
            Selection::NoMatchingTopics => return Ok(SetupOutcome::NoMatchingTopics),
        };
        round::shuffle_ids(&mut ids, rng);

        let diff = QuizSession::setup(&ids, self.block_size)?;
        self.repo.apply_session_diff(session_id, &diff).await?;

        tracing::info!(
            "quiz set up for session={session_id}: questions={}, block_size={}",
            ids.len(),
            self.block_size
        );
        Ok(SetupOutcome::Started(ids.len()))
    }

    /// Pops the next block off the session's id list and builds its answer key.
    ///
    /// The write back is guarded on the id list that was read; when another
    /// request for the same session got there first, the fetch starts over from
    /// the new list.
    pub async fn fetch_round<G: Rng + Send>(
        &self,
        session_id: &str,
        rng: &mut G,
    ) -> Result<RoundOutcome> {
        let mut attempt = 1;
        loop {
            match self.try_fetch_round(session_id, rng).await {
                Err(e)
                    if attempt < ROUND_FETCH_ATTEMPTS
                        && e.downcast_ref::<SessionConflict>().is_some() =>
                {
                    tracing::debug!("session={session_id}: concurrent round fetch, retry {attempt}");
                    attempt += 1;
                }
                outcome => return outcome,
            }
        }
    }

    async fn try_fetch_round<G: Rng + Send>(
        &self,
        session_id: &str,
        rng: &mut G,
    ) -> Result<RoundOutcome> {
        let snapshot = self.repo.session_snapshot(session_id).await?;
        let Some(session) = QuizSession::from_snapshot(&snapshot, self.block_size)? else {
            return Ok(RoundOutcome::NoQuiz);
        };
        if session.is_exhausted() {
            return Ok(RoundOutcome::Complete);
        }

        // Blocks whose questions were all deleted are skipped.
        let mut queued = session.question_ids;
        let (dequeued, block) = loop {
            let dequeued = round::dequeue_block(&queued, session.block_size);
            let questions = self.repo.find_questions_by_ids(&dequeued.block).await?;
            let block = in_block_order(&dequeued.block, questions);
            if block.len() < dequeued.block.len() {
                tracing::warn!(
                    "session={session_id}: {} queued questions no longer exist",
                    dequeued.block.len() - block.len()
                );
            }
            if !block.is_empty() || dequeued.is_final() {
                break (dequeued, block);
            }
            queued = dequeued.remainder;
        };

        if block.is_empty() {
            let mut diff = QuizSession::exhausted()?;
            diff.guard_unchanged(names::SESSION_QUESTION_IDS, &snapshot);
            self.repo.apply_session_diff(session_id, &diff).await?;
            tracing::info!("session={session_id}: no queued question left in the store");
            return Ok(RoundOutcome::Complete);
        }

        let answer_key = round::build_answer_key(&block, rng);
        let mut diff = QuizSession::round_fetched(&dequeued, &answer_key)?;
        diff.guard_unchanged(names::SESSION_QUESTION_IDS, &snapshot);
        self.repo.apply_session_diff(session_id, &diff).await?;

        tracing::info!(
            "round fetched for session={session_id}: questions={}, remaining={}",
            answer_key.len(),
            dequeued.remainder.len()
        );
        Ok(RoundOutcome::Round(Round {
            answer_key,
            remaining: dequeued.remainder.len(),
        }))
    }

    /// Scores a submitted form against the last fetched round. Never writes
    /// to the session.
    pub async fn submit<'a, I>(&self, session_id: &str, fields: I) -> Result<SubmitOutcome>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let answers = round::extract_answers(fields);

        let snapshot = self.repo.session_snapshot(session_id).await?;
        let session = match QuizSession::from_snapshot(&snapshot, self.block_size)? {
            Some(session) if !session.answer_key.is_empty() => session,
            _ => return Ok(SubmitOutcome::NoActiveRound),
        };

        let verdicts = match round::score(&answers, &session.answer_key) {
            Ok(verdicts) => verdicts,
            Err(e) => {
                tracing::warn!("session={session_id}: rejected submission: {e}");
                return Ok(SubmitOutcome::OutOfRange(e));
            }
        };

        let results = RoundResults {
            answer_key: session.answer_key,
            verdicts,
            remaining: session.question_ids.len(),
        };
        tracing::info!(
            "round scored for session={session_id}: correct={}/{}",
            results.correct_count(),
            results.answer_key.len()
        );
        Ok(SubmitOutcome::Scored(results))
    }

    pub async fn reset(&self, session_id: &str) -> Result<()> {
        self.repo
            .apply_session_diff(session_id, &QuizSession::clear())
            .await
    }
}

/// Orders fetched questions like the dequeued block, dropping ids the store
/// no longer has.
fn in_block_order(block: &[i64], questions: Vec<Question>) -> Vec<MultipleChoice> {
    let mut by_id: HashMap<i64, MultipleChoice> = questions
        .into_iter()
        .filter_map(|q| match q {
            Question::MultipleChoice(mc) => Some((mc.id(), mc)),
        })
        .collect();
    block.iter().filter_map(|id| by_id.remove(id)).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
