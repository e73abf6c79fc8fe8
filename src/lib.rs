pub mod db;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod names;
pub mod rejections;
pub mod services;
pub mod statics;
pub mod utils;
pub mod views;

use axum::{
    extract::Request,
    http::Method,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::services::quiz::QuizService;

#[derive(Clone)]
pub struct AppState {
    pub quiz: QuizService,
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(db: db::Db, block_size: usize, secure_cookies: bool) -> Self {
        Self {
            quiz: QuizService::new(db, block_size),
            secure_cookies,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(handlers::homepage::routes())
        .merge(handlers::quiz::routes())
        .layer(middleware::from_fn(csrf_check))
        .nest("/static", statics::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Rejects state-changing requests that lack `HX-Request: true`.
async fn csrf_check(req: Request, next: Next) -> Response {
    if req.method() != Method::GET
        && req.method() != Method::HEAD
        && !extractors::is_htmx_request(req.headers())
    {
        tracing::warn!("rejected {} {} without HX-Request", req.method(), req.uri());
        return rejections::AppError::Forbidden.into_response();
    }
    next.run(req).await
}
