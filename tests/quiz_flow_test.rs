mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use common::{create_test_db, seed_questions, Fixture};
use topic_quiz::db::Db;
use topic_quiz::services::session::QuizSession;
use topic_quiz::{router, AppState};

const FORM: &str = "application/x-www-form-urlencoded";

struct Reply {
    status: StatusCode,
    set_cookie: Option<String>,
    body: String,
}

async fn setup_app(block_size: usize) -> (Router, Db, Fixture) {
    let db = create_test_db().await;
    let fixture = seed_questions(&db).await;
    let app = router(AppState::new(db.clone(), block_size, false));
    (app, db, fixture)
}

async fn send(app: &Router, request: Request<Body>) -> Reply {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    Reply {
        status,
        set_cookie,
        body: String::from_utf8_lossy(&bytes).into_owned(),
    }
}

fn post(uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::post(uri)
        .header("HX-Request", "true")
        .header(header::CONTENT_TYPE, FORM);
    if let Some(session_id) = cookie {
        builder = builder.header(header::COOKIE, format!("quiz_session={session_id}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri).header("HX-Request", "true");
    if let Some(session_id) = cookie {
        builder = builder.header(header::COOKIE, format!("quiz_session={session_id}"));
    }
    builder.body(Body::empty()).unwrap()
}

/// Pulls the session id out of a `quiz_session=...; HttpOnly; ...` header.
fn session_id(set_cookie: &str) -> String {
    let pair = set_cookie.split(';').next().unwrap();
    let (name, value) = pair.split_once('=').unwrap();
    assert_eq!(name, "quiz_session");
    value.to_string()
}

async fn stored_session(db: &Db, session_id: &str) -> Option<QuizSession> {
    let snapshot = db.session_snapshot(session_id).await.unwrap();
    QuizSession::from_snapshot(&snapshot, 1).unwrap()
}

/// Runs setup and returns the new session id.
async fn start_quiz(app: &Router, topics: &str) -> String {
    let reply = send(app, post("/quiz-setup", None, topics)).await;
    assert_eq!(reply.status, StatusCode::OK);
    session_id(&reply.set_cookie.expect("setup should set the session cookie"))
}

/// Form body answering every question of the stored round correctly.
fn correct_answers(session: &QuizSession) -> String {
    session
        .answer_key
        .iter()
        .enumerate()
        .map(|(idx, entry)| format!("q{idx}={}", entry.correct_presented_index))
        .collect::<Vec<_>>()
        .join("&")
}

#[tokio::test]
async fn test_homepage_lists_topics() {
    let (app, _db, _) = setup_app(2).await;

    let reply = send(&app, get("/", None)).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("Topic1"));
    assert!(reply.body.contains("Topic2"));
    assert!(reply.body.contains("Topic3"));
}

#[tokio::test]
async fn test_setup_stores_deduplicated_ids() {
    let (app, db, fixture) = setup_app(2).await;

    let session_id = start_quiz(&app, "Topic1=on&Topic2=on").await;

    let session = stored_session(&db, &session_id).await.unwrap();
    let mut ids = session.question_ids.clone();
    ids.sort_unstable();
    assert_eq!(ids, vec![fixture.a, fixture.b]);
    assert_eq!(session.block_size, 2);
    assert!(session.answer_key.is_empty());
}

#[tokio::test]
async fn test_setup_ignores_unknown_topics() {
    let (app, db, fixture) = setup_app(2).await;

    let session_id = start_quiz(&app, "Topic2=on&Topic4=on").await;

    let session = stored_session(&db, &session_id).await.unwrap();
    assert_eq!(session.question_ids, vec![fixture.b]);
}

#[tokio::test]
async fn test_setup_with_orphan_topic_starts_empty_quiz() {
    let (app, db, _) = setup_app(2).await;

    let session_id = start_quiz(&app, "Topic3=on").await;

    let session = stored_session(&db, &session_id).await.unwrap();
    assert!(session.question_ids.is_empty());

    let reply = send(&app, get("/quiz-round", Some(&session_id))).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("Quiz complete"));
}

#[tokio::test]
async fn test_setup_without_known_topic_is_rejected() {
    let (app, _db, _) = setup_app(2).await;

    let reply = send(&app, post("/quiz-setup", None, "Topic4=on")).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(reply.set_cookie.is_none());

    let reply = send(&app, post("/quiz-setup", None, "")).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(reply.set_cookie.is_none());
}

#[tokio::test]
async fn test_rejected_setup_keeps_existing_quiz() {
    let (app, db, fixture) = setup_app(2).await;
    let session_id = start_quiz(&app, "Topic2=on").await;

    let reply = send(&app, post("/quiz-setup", Some(&session_id), "Topic4=on")).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let session = stored_session(&db, &session_id).await.unwrap();
    assert_eq!(session.question_ids, vec![fixture.b]);
}

#[tokio::test]
async fn test_post_without_htmx_header_is_forbidden() {
    let (app, _db, _) = setup_app(2).await;

    let request = Request::post("/quiz-setup")
        .header(header::CONTENT_TYPE, FORM)
        .body(Body::from("Topic1=on"))
        .unwrap();
    let reply = send(&app, request).await;

    assert_eq!(reply.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_round_without_quiz_is_rejected() {
    let (app, _db, _) = setup_app(2).await;

    let reply = send(&app, get("/quiz-round", None)).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let unknown = ulid::Ulid::new().to_string();
    let reply = send(&app, get("/quiz-round", Some(&unknown))).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_full_round_scores_correct_answers() {
    let (app, db, fixture) = setup_app(2).await;
    let session_id = start_quiz(&app, "Topic1=on&Topic2=on").await;

    let reply = send(&app, get("/quiz-round", Some(&session_id))).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("test text A"));
    assert!(reply.body.contains("test text B"));
    assert!(reply.body.contains("final round"));

    let session = stored_session(&db, &session_id).await.unwrap();
    assert!(session.question_ids.is_empty());
    let mut active = session.active_questions.clone();
    active.sort_unstable();
    assert_eq!(active, vec![fixture.a, fixture.b]);
    assert_eq!(session.answer_key.len(), 2);
    for entry in &session.answer_key {
        assert_eq!(entry.presented_choices.len(), 4);
        let correct = entry.correct_choice().unwrap();
        assert!(correct == "correct1" || correct == "correct2");
    }

    let reply = send(
        &app,
        post("/quiz-submit", Some(&session_id), &correct_answers(&session)),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("2 of 2 correct."));

    // Scoring does not touch the session.
    assert_eq!(stored_session(&db, &session_id).await.unwrap(), session);

    let reply = send(&app, get("/quiz-round", Some(&session_id))).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("Quiz complete"));
}

#[tokio::test]
async fn test_rounds_follow_block_size() {
    let (app, db, fixture) = setup_app(1).await;
    let session_id = start_quiz(&app, "Topic1=on").await;
    let queued = stored_session(&db, &session_id).await.unwrap().question_ids;

    let reply = send(&app, get("/quiz-round", Some(&session_id))).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("1 questions left"));

    let session = stored_session(&db, &session_id).await.unwrap();
    assert_eq!(session.active_questions, vec![queued[1]]);
    assert_eq!(session.question_ids, vec![queued[0]]);

    send(&app, get("/quiz-round", Some(&session_id))).await;
    let session = stored_session(&db, &session_id).await.unwrap();
    assert_eq!(session.active_questions, vec![queued[0]]);
    assert!(session.question_ids.is_empty());

    let mut seen = queued.clone();
    seen.sort_unstable();
    assert_eq!(seen, vec![fixture.a, fixture.b]);
}

#[tokio::test]
async fn test_wrong_and_missing_answers() {
    let (app, db, _) = setup_app(2).await;
    let session_id = start_quiz(&app, "Topic1=on").await;
    send(&app, get("/quiz-round", Some(&session_id))).await;
    let session = stored_session(&db, &session_id).await.unwrap();

    let wrong = (session.answer_key[0].correct_presented_index + 1) % 4;
    let reply = send(
        &app,
        post("/quiz-submit", Some(&session_id), &format!("q0={wrong}")),
    )
    .await;

    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("0 of 2 correct."));
    assert!(reply.body.contains("unanswered"));
}

#[tokio::test]
async fn test_submit_out_of_range_index_is_rejected() {
    let (app, db, _) = setup_app(2).await;
    let session_id = start_quiz(&app, "Topic1=on").await;
    send(&app, get("/quiz-round", Some(&session_id))).await;
    let before = stored_session(&db, &session_id).await.unwrap();

    let reply = send(&app, post("/quiz-submit", Some(&session_id), "q7=0")).await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(stored_session(&db, &session_id).await.unwrap(), before);
}

#[tokio::test]
async fn test_submit_without_round_is_rejected() {
    let (app, _db, _) = setup_app(2).await;

    let reply = send(&app, post("/quiz-submit", None, "q0=0")).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let session_id = start_quiz(&app, "Topic1=on").await;
    let reply = send(&app, post("/quiz-submit", Some(&session_id), "q0=0")).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_answer_key_survives_question_deletion() {
    let (app, db, fixture) = setup_app(2).await;
    let session_id = start_quiz(&app, "Topic2=on").await;
    send(&app, get("/quiz-round", Some(&session_id))).await;
    let session = stored_session(&db, &session_id).await.unwrap();

    db.delete_question(fixture.b).await.unwrap();

    let reply = send(
        &app,
        post("/quiz-submit", Some(&session_id), &correct_answers(&session)),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("1 of 1 correct."));
    assert!(reply.body.contains("test text B"));
}

#[tokio::test]
async fn test_reset_clears_quiz() {
    let (app, db, _) = setup_app(2).await;
    let session_id = start_quiz(&app, "Topic1=on").await;

    let reply = send(&app, post("/quiz-reset", Some(&session_id), "")).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("Topic1"));
    assert!(reply.set_cookie.unwrap().contains("Max-Age=0"));
    assert!(db.session_snapshot(&session_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_static_stylesheet_is_served() {
    let (app, _db, _) = setup_app(2).await;

    let reply = send(&app, get("/static/index.css", None)).await;
    assert_eq!(reply.status, StatusCode::OK);

    let reply = send(&app, get("/static/missing.css", None)).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_setup_without_form_body_is_rejected() {
    let (app, _db, _) = setup_app(2).await;

    let request = Request::post("/quiz-setup")
        .header("HX-Request", "true")
        .body(Body::empty())
        .unwrap();
    let reply = send(&app, request).await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(reply.body.contains("INVALID_FORM"));
}

#[tokio::test]
async fn test_question_listing_is_in_store_order() {
    let (app, _db, _) = setup_app(2).await;

    let reply = send(&app, get("/quiz-questions?Topic2=on&Topic1=on", None)).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.set_cookie.is_none());
    let a = reply.body.find("test text A").unwrap();
    let b = reply.body.find("test text B").unwrap();
    assert!(a < b);

    let reply = send(&app, get("/quiz-questions?Topic4=on", None)).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_round_skips_deleted_questions() {
    let (app, db, fixture) = setup_app(1).await;
    let session_id = start_quiz(&app, "Topic1=on").await;

    db.delete_question(fixture.a).await.unwrap();
    db.delete_question(fixture.b).await.unwrap();

    let reply = send(&app, get("/quiz-round", Some(&session_id))).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("Quiz complete"));
    assert!(stored_session(&db, &session_id)
        .await
        .unwrap()
        .is_exhausted());
}

#[tokio::test]
async fn test_submit_overflowing_index_is_rejected() {
    let (app, _db, _) = setup_app(2).await;
    let session_id = start_quiz(&app, "Topic1=on").await;
    send(&app, get("/quiz-round", Some(&session_id))).await;

    let reply = send(
        &app,
        post("/quiz-submit", Some(&session_id), "q99999999999999999999999=0"),
    )
    .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(reply.body.contains("ANSWER_OUT_OF_RANGE"));
}
