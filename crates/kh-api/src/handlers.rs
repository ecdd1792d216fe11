//! # kh-api Handlers
//!
//! This module coordinates the flow between HTTP requests and the board
//! controller.

use std::sync::Arc;

use axum::extract::{Form, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Json;
use kh_core::controller::BoardController;
use kh_core::error::AppError;
use kh_core::models::{Mood, PostId};
use kh_ui::{HtmlPresenter, Notice, NoticeKind};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

/// State shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub board: Arc<BoardController>,
    /// Must be the presenter the controller renders into
    pub presenter: Arc<HtmlPresenter>,
}

impl AppState {
    pub fn new(board: Arc<BoardController>, presenter: Arc<HtmlPresenter>) -> Self {
        Self { board, presenter }
    }
}

#[derive(Debug, Deserialize)]
pub struct IndexQuery {
    pub notice: Option<String>,
}

/// Composer form. An unchecked checkbox is simply absent.
#[derive(Debug, Deserialize)]
pub struct CreatePostForm {
    pub content: String,
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub anonymous: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub content: String,
    #[serde(default)]
    pub mood: Mood,
    #[serde(default)]
    pub anonymous: bool,
}

/// JSON error body with a status derived from the error kind.
pub struct ApiError(pub AppError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(..) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// Load-and-render: the timeline page.
pub async fn index(State(state): State<AppState>, Query(query): Query<IndexQuery>) -> Response {
    state.board.load_and_render().await;

    let notice = query.notice.as_deref().and_then(|code| match code {
        "posted" => Some(Notice::posted()),
        "welcome" => Some(Notice::welcome()),
        _ => None,
    });
    render_page(&state, notice.as_ref(), "", StatusCode::OK)
}

/// Create-post from the composer form.
pub async fn create_post(
    State(state): State<AppState>,
    Form(form): Form<CreatePostForm>,
) -> Response {
    let mood = form.mood.as_deref().map(Mood::from).unwrap_or_default();
    let anonymous = form.anonymous.is_some();

    match state.board.create_post(&form.content, mood, anonymous).await {
        Ok(_) => Redirect::to("/?notice=posted").into_response(),
        Err(AppError::ValidationError(message)) => {
            let notice = Notice::new(NoticeKind::Warning, message);
            render_page(
                &state,
                Some(&notice),
                &form.content,
                StatusCode::UNPROCESSABLE_ENTITY,
            )
        }
        Err(err) => {
            error!(error = %err, "publishing failed");
            render_page(
                &state,
                Some(&Notice::publish_failed()),
                &form.content,
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        }
    }
}

/// Toggle-like; answers with the post's updated like button.
pub async fn toggle_like(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let post_id = PostId::new(id);
    if state.board.toggle_like(&post_id).await.is_none() {
        return StatusCode::NOT_FOUND.into_response();
    }
    match state.presenter.like_html(&post_id) {
        Some(html) => Html(html).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

pub async fn api_list(State(state): State<AppState>) -> Response {
    Json(state.board.load_and_render().await).into_response()
}

pub async fn api_create(
    State(state): State<AppState>,
    Json(request): Json<CreatePostRequest>,
) -> Result<Response, ApiError> {
    let post = state
        .board
        .create_post(&request.content, request.mood, request.anonymous)
        .await
        .map_err(ApiError)?;
    Ok((StatusCode::CREATED, Json(post)).into_response())
}

pub async fn api_toggle_like(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let post_id = PostId::new(id);
    let like = state
        .board
        .toggle_like(&post_id)
        .await
        .ok_or_else(|| ApiError(AppError::NotFound("post".to_string(), post_id.to_string())))?;
    Ok(Json(like).into_response())
}

pub async fn healthz() -> &'static str {
    "ok"
}

fn render_page(
    state: &AppState,
    notice: Option<&Notice>,
    draft: &str,
    status: StatusCode,
) -> Response {
    match state.presenter.render_page(notice, draft) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(err) => {
            error!(error = %err, "page rendering failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
