use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use validator::Validate;

use crate::error::BookingError;
use crate::middleware::{AuthUser, JsonBody};
use crate::models::user::RegisterUser;
use crate::models::User;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/user/register", post(register))
        .route("/user/me", get(me))
}

// POST /api/user/register
async fn register(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<RegisterUser>,
) -> Result<impl IntoResponse, BookingError> {
    req.validate()?;

    let password = req.password.clone();
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| BookingError::Internal(format!("password hashing task failed: {e}")))?
        .map_err(|e| BookingError::Internal(format!("password hashing failed: {e}")))?;

    let user = User::create(&state.db.pool, &req.email, req.username.as_deref(), &hash, false)
        .await
        .map_err(|err| {
            BookingError::on_unique(err, User::EMAIL_CONSTRAINT, || {
                format!("User with email {} already exists", req.email)
            })
        })?;

    tracing::info!(user_id = user.id, "user registered");
    Ok((StatusCode::CREATED, Json(user)))
}

// GET /api/user/me
async fn me(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, BookingError> {
    let user = User::find_active_by_email(&state.db.pool, &user.email)
        .await?
        .ok_or(BookingError::NotFound {
            entity: "User",
            id: user.user_id,
        })?;
    Ok(Json(user))
}
