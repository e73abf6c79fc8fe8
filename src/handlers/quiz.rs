use std::collections::BTreeSet;

use axum::{
    extract::{
        rejection::{FormRejection, QueryRejection},
        Form, Query, State,
    },
    http::header::SET_COOKIE,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use maud::Markup;
use rand::{rngs::StdRng, SeedableRng};

use crate::{
    extractors::{IsHtmx, QuizSessionId},
    names,
    rejections::{AppError, ResultExt},
    services::quiz::{Listing, RoundOutcome, SetupOutcome, SubmitOutcome},
    utils, views,
    views::quiz as quiz_views,
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/quiz-setup", post(quiz_setup))
        .route("/quiz-round", get(quiz_round))
        .route("/quiz-submit", post(quiz_submit))
        .route("/quiz-reset", post(quiz_reset))
        .route("/quiz-questions", get(quiz_questions))
}

/// Form fields arrive as ordered name/value pairs so any field name is accepted.
type FormFields = Vec<(String, String)>;

async fn quiz_setup(
    State(state): State<AppState>,
    QuizSessionId(session_id): QuizSessionId,
    form: Result<Form<FormFields>, FormRejection>,
) -> Result<Response, AppError> {
    let Form(fields) = form.reject_input("INVALID_FORM")?;
    let requested = requested_topics(fields);
    let session_id = session_id.unwrap_or_else(|| ulid::Ulid::new().to_string());

    let mut rng = StdRng::from_entropy();
    let outcome = state
        .quiz
        .setup(&session_id, &requested, &mut rng)
        .await
        .reject("could not set up quiz")?;

    let question_count = match outcome {
        SetupOutcome::Started(count) => count,
        SetupOutcome::NoMatchingTopics => {
            tracing::warn!("quiz setup without a known topic: {requested:?}");
            return Err(AppError::Input("NO_TOPIC_SELECTED"));
        }
    };

    let cookie = utils::cookie(
        names::QUIZ_SESSION_COOKIE_NAME,
        &session_id,
        state.secure_cookies,
    )
    .reject("could not build session cookie")?;

    Ok((
        [(SET_COOKIE, cookie)],
        views::titled(
            "Quiz ready",
            quiz_views::quiz_started(question_count, state.quiz.block_size()),
        ),
    )
        .into_response())
}

/// Topic choices are the field names; values are ignored.
fn requested_topics(fields: FormFields) -> BTreeSet<String> {
    fields.into_iter().map(|(name, _)| name).collect()
}

async fn quiz_questions(
    State(state): State<AppState>,
    IsHtmx(is_htmx): IsHtmx,
    query: Result<Query<FormFields>, QueryRejection>,
) -> Result<Markup, AppError> {
    let Query(fields) = query.reject_input("INVALID_QUERY")?;

    let listing = state
        .quiz
        .list_questions(&requested_topics(fields))
        .await
        .reject("could not list questions")?;

    match listing {
        Listing::NoMatchingTopics => Err(AppError::Input("NO_TOPIC_SELECTED")),
        Listing::Questions(questions) => Ok(views::render(
            is_htmx,
            "Questions",
            quiz_views::question_list(&questions),
        )),
    }
}

async fn quiz_round(
    State(state): State<AppState>,
    IsHtmx(is_htmx): IsHtmx,
    QuizSessionId(session_id): QuizSessionId,
) -> Result<Markup, AppError> {
    let session_id = session_id.ok_or(AppError::Input("NO_ACTIVE_QUIZ"))?;

    let mut rng = StdRng::from_entropy();
    let outcome = state
        .quiz
        .fetch_round(&session_id, &mut rng)
        .await
        .reject("could not fetch round")?;

    match outcome {
        RoundOutcome::NoQuiz => Err(AppError::Input("NO_ACTIVE_QUIZ")),
        RoundOutcome::Complete => Ok(views::render(
            is_htmx,
            "Quiz complete",
            quiz_views::quiz_complete(),
        )),
        RoundOutcome::Round(round) => Ok(views::render(
            is_htmx,
            "Round",
            quiz_views::round(quiz_views::RoundData {
                answer_key: &round.answer_key,
                remaining: round.remaining,
            }),
        )),
    }
}

async fn quiz_submit(
    State(state): State<AppState>,
    QuizSessionId(session_id): QuizSessionId,
    form: Result<Form<FormFields>, FormRejection>,
) -> Result<Markup, AppError> {
    let Form(fields) = form.reject_input("INVALID_FORM")?;
    let session_id = session_id.ok_or(AppError::Input("NO_ACTIVE_ROUND"))?;

    let outcome = state
        .quiz
        .submit(
            &session_id,
            fields.iter().map(|(name, value)| (name.as_str(), value.as_str())),
        )
        .await
        .reject("could not score answers")?;

    match outcome {
        SubmitOutcome::NoActiveRound => Err(AppError::Input("NO_ACTIVE_ROUND")),
        SubmitOutcome::OutOfRange(_) => Err(AppError::Input("ANSWER_OUT_OF_RANGE")),
        SubmitOutcome::Scored(results) => Ok(views::titled(
            "Results",
            quiz_views::results(quiz_views::ResultsData {
                answer_key: &results.answer_key,
                verdicts: &results.verdicts,
                correct_count: results.correct_count(),
                remaining: results.remaining,
            }),
        )),
    }
}

async fn quiz_reset(
    State(state): State<AppState>,
    QuizSessionId(session_id): QuizSessionId,
) -> Result<Response, AppError> {
    if let Some(session_id) = session_id {
        state
            .quiz
            .reset(&session_id)
            .await
            .reject("could not reset quiz")?;
        tracing::info!("quiz reset for session={session_id}");
    }

    let cookie = utils::expired_cookie(names::QUIZ_SESSION_COOKIE_NAME)
        .reject("could not build session cookie")?;
    let page = super::homepage::topic_picker(&state, true).await?;
    Ok(([(SET_COOKIE, cookie)], page).into_response())
}
