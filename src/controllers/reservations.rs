use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::BookingError;
use crate::middleware::{AuthUser, JsonBody};
use crate::models::DbId;
use crate::pagination::PageParams;
use crate::services::reservations::{self, ReservationRequest};
use crate::AppState;

const PAGE_SIZE: u32 = 10;
const MAX_PAGE_SIZE: u32 = 30;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/reservations", get(list_reservations).post(create_reservation))
        .route("/reservations/{id}", get(get_reservation))
}

#[derive(Debug, Deserialize)]
struct ReservationsQuery {
    show_title: Option<String>,
}

// POST /api/reservations
async fn create_reservation(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    JsonBody(req): JsonBody<ReservationRequest>,
) -> Result<impl IntoResponse, BookingError> {
    let receipt = reservations::create(&state.db.pool, Some(user.user_id), &req.tickets).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

// GET /api/reservations?show_title=&page=&page_size=
async fn list_reservations(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(params): Query<ReservationsQuery>,
    Query(page): Query<PageParams>,
) -> Result<impl IntoResponse, BookingError> {
    let page = page.resolve(PAGE_SIZE, MAX_PAGE_SIZE);
    let reservations = reservations::list_for_user(
        &state.db.pool,
        user.user_id,
        params.show_title.as_deref(),
        page,
    )
    .await?;
    Ok(Json(reservations))
}

// GET /api/reservations/{id}
async fn get_reservation(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> Result<impl IntoResponse, BookingError> {
    let reservation = reservations::detail_for_user(&state.db.pool, id, user.user_id).await?;
    Ok(Json(reservation))
}
