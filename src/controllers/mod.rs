pub mod domes;
pub mod reservations;
pub mod sessions;
pub mod shows;
pub mod speakers;
pub mod themes;
pub mod users;

use axum::Router;
use std::sync::Arc;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(users::routes())
        .merge(domes::routes())
        .merge(themes::routes())
        .merge(speakers::routes())
        .merge(shows::routes())
        .merge(sessions::routes())
        .merge(reservations::routes())
}
