use std::fmt;

use axum::{
    Form, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Redirect, Response},
    routing,
};
use maud::Markup;
use rearch::Container;
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::{
    pages,
    paste_service::{
        CreatePasteError, GetPasteError, ListPastesError, PasteView, SearchError,
        paste_service_capsule,
    },
};

pub const PASTE_NOT_FOUND: &str = "Paste not found";
pub const MISSING_CONTENT: &str = "Missing required form field: content";

#[derive(Debug, Deserialize)]
pub struct CreatePastePayload {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

/// Builds the full HTTP surface on top of an initialized [`Container`].
pub fn router(container: Container) -> Router {
    Router::new()
        .route("/", routing::get(list_pastes).post(create_paste))
        .route("/search", routing::get(search_pastes))
        .route("/{id}", routing::get(view_paste))
        .route("/{id}/raw", routing::get(view_raw_paste))
        .layer(TraceLayer::new_for_http())
        .with_state(container)
}

#[instrument(skip(container))]
async fn list_pastes(State(container): State<Container>) -> Result<Markup, Response> {
    container
        .read(paste_service_capsule)
        .recent_pastes()
        .await
        .map(|pastes| pages::index_page(&pastes))
        .map_err(|error: ListPastesError| match error {
            ListPastesError::Internal(_) => internal_error(&error),
        })
}

#[instrument(skip(container, payload))]
async fn create_paste(
    State(container): State<Container>,
    Form(payload): Form<CreatePastePayload>,
) -> Result<Redirect, Response> {
    let Some(content) = payload.content else {
        info!("User submitted a paste without content");
        return Err((StatusCode::BAD_REQUEST, MISSING_CONTENT).into_response());
    };

    container
        .read(paste_service_capsule)
        .create_paste(content)
        .await
        .map(|id| Redirect::to(&format!("/{id}")))
        .map_err(|error: CreatePasteError| match error {
            CreatePasteError::IdCollision(_) | CreatePasteError::Internal(_) => {
                internal_error(&error)
            }
        })
}

#[instrument(skip(container))]
async fn view_paste(
    State(container): State<Container>,
    Path(id): Path<String>,
) -> Result<Markup, Response> {
    find_paste(&container, &id)
        .await
        .map(|paste| pages::view_page(&paste))
}

#[instrument(skip(container))]
async fn view_raw_paste(
    State(container): State<Container>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, Response> {
    find_paste(&container, &id).await.map(|paste| {
        (
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            paste.content,
        )
    })
}

#[instrument(skip(container))]
async fn search_pastes(
    State(container): State<Container>,
    Query(SearchParams { q }): Query<SearchParams>,
) -> Result<Markup, Response> {
    container
        .read(paste_service_capsule)
        .search(&q)
        .await
        .map(|hits| pages::search_page(&q, &hits))
        .map_err(|error: SearchError| match error {
            SearchError::InvalidQuery(_) => {
                info!(?error, "User submitted an unusable search query");
                (StatusCode::BAD_REQUEST, error.to_string()).into_response()
            }
            SearchError::Internal(_) => internal_error(&error),
        })
}

async fn find_paste(container: &Container, id: &str) -> Result<PasteView, Response> {
    container
        .read(paste_service_capsule)
        .get_paste(id)
        .await
        .map_err(|error: GetPasteError| match error {
            GetPasteError::NotFound => (StatusCode::NOT_FOUND, PASTE_NOT_FOUND).into_response(),
            GetPasteError::Internal(_) => internal_error(&error),
        })
}

fn internal_error(error: &impl fmt::Debug) -> Response {
    let err_uuid = Uuid::new_v4();
    error!(?err_uuid, ?error, "Encountered an error during a request");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Internal server error (error id: {err_uuid})"),
    )
        .into_response()
}
