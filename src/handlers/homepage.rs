use axum::{extract::State, routing::get, Router};
use maud::Markup;

use crate::{
    extractors::IsHtmx,
    rejections::{AppError, ResultExt},
    views,
    views::homepage as homepage_views,
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(homepage))
}

async fn homepage(
    State(state): State<AppState>,
    IsHtmx(is_htmx): IsHtmx,
) -> Result<Markup, AppError> {
    topic_picker(&state, is_htmx).await
}

pub(crate) async fn topic_picker(state: &AppState, is_htmx: bool) -> Result<Markup, AppError> {
    let topics = state.quiz.topics().await.reject("could not get topics")?;

    Ok(views::render(
        is_htmx,
        "Topics",
        homepage_views::topic_picker(&topics),
    ))
}
