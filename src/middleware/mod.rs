use axum::{
    extract::{FromRequest, FromRequestParts, Request},
    http::{header, request::Parts, StatusCode},
    Json,
};
use base64::{engine::general_purpose, Engine as _};
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::error::BookingError;
use crate::models::{DbId, User};

/// An authenticated, active user.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: DbId,
    pub email: String,
    pub is_staff: bool,
}

/// An authenticated staff member; required for catalog writes.
#[derive(Debug, Clone)]
pub struct StaffUser(pub AuthUser);

/// Splits an `Authorization: Basic ...` header value into email and password.
fn basic_credentials(header_value: &str) -> Option<(String, String)> {
    let encoded = header_value.strip_prefix("Basic ")?;
    let decoded = general_purpose::STANDARD.decode(encoded).ok()?;
    let credentials = String::from_utf8(decoded).ok()?;
    let (email, password) = credentials.split_once(':')?;
    Some((email.to_string(), password.to_string()))
}

// Basic Auth extractor
impl FromRequestParts<Arc<crate::AppState>> for AuthUser {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<crate::AppState>,
    ) -> Result<Self, Self::Rejection> {
        let (email, password) = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(basic_credentials)
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let user = User::find_active_by_email(&state.db.pool, &email)
            .await
            .map_err(|e| {
                tracing::error!("auth lookup failed: {:?}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?
            .ok_or(StatusCode::UNAUTHORIZED)?;

        // bcrypt::verify is CPU-bound.
        let hash = user.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .unwrap_or(false);
        if !verified {
            return Err(StatusCode::UNAUTHORIZED);
        }

        if let Err(e) = User::touch_last_login(&state.db.pool, user.id).await {
            tracing::warn!("failed to update last_login for {}: {:?}", user.id, e);
        }

        Ok(AuthUser {
            user_id: user.id,
            email: user.email,
            is_staff: user.is_staff,
        })
    }
}

impl FromRequestParts<Arc<crate::AppState>> for StaffUser {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<crate::AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_staff {
            return Err(StatusCode::FORBIDDEN);
        }
        Ok(StaffUser(user))
    }
}

/// `Json<T>` whose rejections are reported as [`BookingError::Validation`].
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = BookingError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(BookingError::Validation(rejection.body_text())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::response::IntoResponse;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Seat {
        row: i32,
    }

    fn json_request(body: &'static str) -> Request {
        Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn malformed_bodies_become_validation_errors() {
        for body in [r#"{"seat": 1}"#, r#"{"row": "ten"}"#, "not json"] {
            let err = JsonBody::<Seat>::from_request(json_request(body), &())
                .await
                .unwrap_err();
            assert!(matches!(err, BookingError::Validation(_)));

            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(
                response.headers()[header::CONTENT_TYPE],
                "application/json"
            );
        }
    }

    #[tokio::test]
    async fn well_formed_body_is_extracted() {
        let JsonBody(seat) = JsonBody::<Seat>::from_request(json_request(r#"{"row": 3}"#), &())
            .await
            .unwrap();
        assert_eq!(seat.row, 3);
    }

    #[test]
    fn decodes_basic_credentials() {
        let header = format!(
            "Basic {}",
            general_purpose::STANDARD.encode("test@test.com:secret:with:colons")
        );
        assert_eq!(
            basic_credentials(&header),
            Some(("test@test.com".to_string(), "secret:with:colons".to_string()))
        );
    }

    #[test]
    fn rejects_other_schemes() {
        assert_eq!(basic_credentials("Bearer abc"), None);
        assert_eq!(basic_credentials("Basic not-base64!"), None);
    }
}
