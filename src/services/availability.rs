//! Remaining seats of a session, derived on every read and never stored.

use serde::Serialize;
use sqlx::PgPool;
use tracing::error;

use crate::error::{BookingError, BookingResult};
use crate::models::{reservation::Ticket, DbId, Dome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Availability {
    pub session_id: DbId,
    pub capacity: i64,
    pub tickets_issued: i64,
    pub tickets_available: i64,
}

/// `capacity - issued`. A negative value means a seat check was bypassed; it is
/// reported as is so callers and tests can see the breach.
pub fn tickets_available(session_id: DbId, capacity: i64, issued: i64) -> i64 {
    let available = capacity - issued;
    if available < 0 {
        error!(session_id, capacity, issued, "more tickets issued than seats in the dome");
    }
    available
}

pub async fn for_session(pool: &PgPool, session_id: DbId) -> BookingResult<Availability> {
    let dome = Dome::for_session(pool, session_id)
        .await?
        .ok_or(BookingError::NotFound {
            entity: "Show session",
            id: session_id,
        })?;
    let capacity = dome.capacity();
    let tickets_issued = Ticket::count_for_session(pool, session_id).await?;

    Ok(Availability {
        session_id,
        capacity,
        tickets_issued,
        tickets_available: tickets_available(session_id, capacity, tickets_issued),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtracts_issued_tickets_from_capacity() {
        assert_eq!(tickets_available(1, 100, 0), 100);
        assert_eq!(tickets_available(1, 100, 1), 99);
        assert_eq!(tickets_available(1, 100, 100), 0);
    }

    #[test]
    fn overbooking_surfaces_as_negative() {
        assert_eq!(tickets_available(1, 4, 5), -1);
    }
}
