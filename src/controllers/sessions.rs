use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::error::BookingError;
use crate::middleware::{AuthUser, JsonBody, StaffUser};
use crate::models::session::SessionFilter;
use crate::models::DbId;
use crate::pagination::PageParams;
use crate::services::availability;
use crate::services::sessions::{self, SessionInput};
use crate::AppState;

const PAGE_SIZE: u32 = 5;
const MAX_PAGE_SIZE: u32 = 30;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/show_sessions", get(list_sessions).post(create_session))
        .route("/show_sessions/{id}", get(get_session).put(update_session))
        .route("/show_sessions/{id}/availability", get(get_availability))
}

// GET /api/show_sessions?date=&show_title=&page=&page_size=
async fn list_sessions(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Query(filter): Query<SessionFilter>,
    Query(page): Query<PageParams>,
) -> Result<impl IntoResponse, BookingError> {
    let page = page.resolve(PAGE_SIZE, MAX_PAGE_SIZE);
    let sessions = sessions::list(&state.db.pool, &filter, page).await?;
    Ok(Json(sessions))
}

// POST /api/show_sessions
async fn create_session(
    State(state): State<Arc<AppState>>,
    _staff: StaffUser,
    JsonBody(req): JsonBody<SessionInput>,
) -> Result<impl IntoResponse, BookingError> {
    let session = state.scheduler.create(&state.db.pool, &req).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

// GET /api/show_sessions/{id}
async fn get_session(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> Result<impl IntoResponse, BookingError> {
    Ok(Json(sessions::detail(&state.db.pool, id).await?))
}

// PUT /api/show_sessions/{id}
async fn update_session(
    State(state): State<Arc<AppState>>,
    _staff: StaffUser,
    Path(id): Path<DbId>,
    JsonBody(req): JsonBody<SessionInput>,
) -> Result<impl IntoResponse, BookingError> {
    Ok(Json(state.scheduler.update(&state.db.pool, id, &req).await?))
}

// GET /api/show_sessions/{id}/availability
async fn get_availability(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> Result<impl IntoResponse, BookingError> {
    Ok(Json(availability::for_session(&state.db.pool, id).await?))
}
