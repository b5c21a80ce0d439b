use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use validator::Validate;

use crate::error::BookingError;
use crate::middleware::{AuthUser, JsonBody, StaffUser};
use crate::models::speaker::{CreateSpeaker, SpeakerFilter, SpeakerSummary};
use crate::models::{DbId, Speaker};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/show_speakers", get(list_speakers).post(create_speaker))
        .route("/show_speakers/{id}", get(get_speaker))
}

// GET /api/show_speakers
async fn list_speakers(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Query(filter): Query<SpeakerFilter>,
) -> Result<impl IntoResponse, BookingError> {
    let speakers: Vec<SpeakerSummary> = Speaker::list(&state.db.pool, &filter)
        .await?
        .iter()
        .map(Speaker::summary)
        .collect();
    Ok(Json(speakers))
}

// POST /api/show_speakers
async fn create_speaker(
    State(state): State<Arc<AppState>>,
    _staff: StaffUser,
    JsonBody(req): JsonBody<CreateSpeaker>,
) -> Result<impl IntoResponse, BookingError> {
    req.validate()?;
    let speaker = Speaker::create(&state.db.pool, &req).await?;
    Ok((StatusCode::CREATED, Json(speaker)))
}

// GET /api/show_speakers/{id}
async fn get_speaker(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> Result<impl IntoResponse, BookingError> {
    let speaker = Speaker::find_by_id(&state.db.pool, id)
        .await?
        .ok_or(BookingError::NotFound {
            entity: "Speaker",
            id,
        })?;
    Ok(Json(speaker))
}
