use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::error::BookingError;
use crate::middleware::{AuthUser, JsonBody, StaffUser};
use crate::models::show::CreateShow;
use crate::models::{AstronomyShow, DbId, Theme};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/astronomy_shows", get(list_shows).post(create_show))
        .route("/astronomy_shows/{id}", get(get_show))
}

#[derive(Debug, Deserialize)]
struct ShowsQuery {
    title: Option<String>,
}

// GET /api/astronomy_shows
async fn list_shows(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Query(params): Query<ShowsQuery>,
) -> Result<impl IntoResponse, BookingError> {
    let title = params.title.as_deref().filter(|title| !title.is_empty());
    let shows = state.cache.get_shows(title).await?;
    Ok(Json(shows))
}

// POST /api/astronomy_shows
async fn create_show(
    State(state): State<Arc<AppState>>,
    _staff: StaffUser,
    JsonBody(req): JsonBody<CreateShow>,
) -> Result<impl IntoResponse, BookingError> {
    req.validate()?;

    let mut tx = state.db.pool.begin().await?;
    let themes = Theme::find_by_names(&mut *tx, &req.show_themes).await?;
    if let Some(unknown) = req
        .show_themes
        .iter()
        .find(|name| !themes.iter().any(|theme| &theme.name == *name))
    {
        return Err(BookingError::Validation(format!(
            "Show theme {unknown} does not exist"
        )));
    }

    let theme_ids: Vec<DbId> = themes.iter().map(|theme| theme.id).collect();
    let show = AstronomyShow::create(&mut tx, &req, &theme_ids)
        .await
        .map_err(|err| {
            BookingError::on_unique(err, AstronomyShow::TITLE_CONSTRAINT, || {
                format!("Astronomy show {} already exists", req.title)
            })
        })?;
    tx.commit().await?;

    state.cache.invalidate_shows().await;
    tracing::info!(show_id = show.id, themes = theme_ids.len(), "astronomy show created");

    let show = AstronomyShow::find_with_themes(&state.db.pool, show.id)
        .await?
        .ok_or(BookingError::NotFound {
            entity: "Astronomy show",
            id: show.id,
        })?;
    Ok((StatusCode::CREATED, Json(show)))
}

// GET /api/astronomy_shows/{id}
async fn get_show(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> Result<impl IntoResponse, BookingError> {
    let show = AstronomyShow::find_with_themes(&state.db.pool, id)
        .await?
        .ok_or(BookingError::NotFound {
            entity: "Astronomy show",
            id,
        })?;
    Ok(Json(show))
}
