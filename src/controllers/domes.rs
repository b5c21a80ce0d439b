use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use validator::Validate;

use crate::error::BookingError;
use crate::middleware::{AuthUser, JsonBody, StaffUser};
use crate::models::dome::{CreateDome, DomeView};
use crate::models::{DbId, Dome};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/planetarium_domes", get(list_domes).post(create_dome))
        .route("/planetarium_domes/{id}", get(get_dome))
}

// GET /api/planetarium_domes
async fn list_domes(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
) -> Result<impl IntoResponse, BookingError> {
    let domes: Vec<DomeView> = Dome::list(&state.db.pool)
        .await?
        .into_iter()
        .map(DomeView::from)
        .collect();
    Ok(Json(domes))
}

// POST /api/planetarium_domes
async fn create_dome(
    State(state): State<Arc<AppState>>,
    _staff: StaffUser,
    JsonBody(req): JsonBody<CreateDome>,
) -> Result<impl IntoResponse, BookingError> {
    req.validate()?;
    let dome = Dome::create(&state.db.pool, &req).await?;
    tracing::info!(dome_id = dome.id, capacity = dome.capacity(), "planetarium dome created");
    Ok((StatusCode::CREATED, Json(DomeView::from(dome))))
}

// GET /api/planetarium_domes/{id}
async fn get_dome(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> Result<impl IntoResponse, BookingError> {
    let dome = Dome::find_by_id(&state.db.pool, id)
        .await?
        .ok_or(BookingError::NotFound {
            entity: "Planetarium dome",
            id,
        })?;
    Ok(Json(DomeView::from(dome)))
}
