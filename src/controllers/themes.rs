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
use crate::models::theme::CreateTheme;
use crate::models::{DbId, Theme};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/show_themes", get(list_themes).post(create_theme))
        .route("/show_themes/{id}", get(get_theme))
}

#[derive(Debug, Deserialize)]
struct ThemesQuery {
    name: Option<String>,
}

// GET /api/show_themes
async fn list_themes(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Query(params): Query<ThemesQuery>,
) -> Result<impl IntoResponse, BookingError> {
    let themes = Theme::list(&state.db.pool, params.name.as_deref()).await?;
    Ok(Json(themes))
}

// POST /api/show_themes
async fn create_theme(
    State(state): State<Arc<AppState>>,
    _staff: StaffUser,
    JsonBody(req): JsonBody<CreateTheme>,
) -> Result<impl IntoResponse, BookingError> {
    req.validate()?;
    let theme = Theme::create(&state.db.pool, &req).await.map_err(|err| {
        BookingError::on_unique(err, Theme::NAME_CONSTRAINT, || {
            format!("Show theme {} already exists", req.name)
        })
    })?;

    state.cache.invalidate_shows().await;
    Ok((StatusCode::CREATED, Json(theme)))
}

// GET /api/show_themes/{id}
async fn get_theme(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> Result<impl IntoResponse, BookingError> {
    let theme = Theme::find_by_id(&state.db.pool, id)
        .await?
        .ok_or(BookingError::NotFound {
            entity: "Show theme",
            id,
        })?;
    Ok(Json(theme))
}
