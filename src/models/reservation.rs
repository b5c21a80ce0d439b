use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgExecutor};

use super::DbId;
use crate::pagination::Page;

const TICKET_COLUMNS: &str = r#"id, "row", seat, show_session_id, reservation_id"#;

/// Issued tickets of a session and the furthest row and seat they occupy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow)]
pub struct TicketExtent {
    pub issued: i64,
    pub max_row: Option<i32>,
    pub max_seat: Option<i32>,
}

/// Session facts of a reservation, taken from its first ticket.
const HEADLINE_JOIN: &str = "
    LEFT JOIN LATERAL (
        SELECT t.show_session_id
        FROM tickets t
        WHERE t.reservation_id = r.id
        ORDER BY t.id
        LIMIT 1
    ) first_ticket ON TRUE
    LEFT JOIN show_sessions s ON s.id = first_ticket.show_session_id
    LEFT JOIN astronomy_shows a ON a.id = s.astronomy_show_id";

const OWNER_FILTER: &str = "
    WHERE r.user_id = $1
      AND ($2::text IS NULL OR EXISTS (
          SELECT 1
          FROM tickets ft
          JOIN show_sessions fs ON fs.id = ft.show_session_id
          JOIN astronomy_shows fa ON fa.id = fs.astronomy_show_id
          WHERE ft.reservation_id = r.id AND fa.title ILIKE '%' || $2 || '%'
      ))";

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Reservation {
    pub id: DbId,
    pub created_at: DateTime<Utc>,
    pub user_id: Option<DbId>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Ticket {
    pub id: DbId,
    pub row: i32,
    pub seat: i32,
    pub show_session_id: DbId,
    pub reservation_id: DbId,
}

/// A reservation with the show and session of its first ticket.
#[derive(Debug, Clone, FromRow)]
pub struct ReservationHeadline {
    pub id: DbId,
    pub created_at: DateTime<Utc>,
    pub show_session_id: Option<DbId>,
    pub astronomy_show_title: Option<String>,
    pub show_day: Option<NaiveDate>,
    pub time_start: Option<NaiveTime>,
}

impl Reservation {
    pub async fn insert<'e>(
        executor: impl PgExecutor<'e>,
        user_id: Option<DbId>,
    ) -> Result<Reservation, sqlx::Error> {
        sqlx::query_as::<_, Reservation>(
            "INSERT INTO reservations (user_id) VALUES ($1)
             RETURNING id, created_at, user_id",
        )
        .bind(user_id)
        .fetch_one(executor)
        .await
    }

    pub async fn count<'e>(executor: impl PgExecutor<'e>) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reservations")
            .fetch_one(executor)
            .await
    }

    /// A reservation owned by `user_id`; `None` for missing or foreign ones.
    pub async fn find_headline<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<ReservationHeadline>, sqlx::Error> {
        let query = format!(
            "SELECT r.id, r.created_at, s.id AS show_session_id,
                    a.title AS astronomy_show_title, s.show_day, s.time_start
             FROM reservations r
             {HEADLINE_JOIN}
             WHERE r.id = $1 AND r.user_id = $2"
        );
        sqlx::query_as::<_, ReservationHeadline>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(executor)
            .await
    }

    /// One page of a user's reservations, newest first, with the total count.
    pub async fn list_for_user(
        conn: &mut PgConnection,
        user_id: DbId,
        show_title: Option<&str>,
        page: Page,
    ) -> Result<(Vec<ReservationHeadline>, i64), sqlx::Error> {
        let query = format!(
            "SELECT r.id, r.created_at, s.id AS show_session_id,
                    a.title AS astronomy_show_title, s.show_day, s.time_start
             FROM reservations r
             {HEADLINE_JOIN}
             {OWNER_FILTER}
             ORDER BY r.created_at DESC, r.id DESC
             LIMIT $3 OFFSET $4"
        );
        let rows = sqlx::query_as::<_, ReservationHeadline>(&query)
            .bind(user_id)
            .bind(show_title)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&mut *conn)
            .await?;

        let count_query = format!("SELECT COUNT(*) FROM reservations r {OWNER_FILTER}");
        let count = sqlx::query_scalar::<_, i64>(&count_query)
            .bind(user_id)
            .bind(show_title)
            .fetch_one(&mut *conn)
            .await?;

        Ok((rows, count))
    }
}

impl Ticket {
    pub const SEAT_CONSTRAINT: &'static str = "uq_tickets_session_row_seat";

    pub async fn insert<'e>(
        executor: impl PgExecutor<'e>,
        reservation_id: DbId,
        show_session_id: DbId,
        row: i32,
        seat: i32,
    ) -> Result<Ticket, sqlx::Error> {
        let query = format!(
            r#"INSERT INTO tickets ("row", seat, show_session_id, reservation_id)
             VALUES ($1, $2, $3, $4)
             RETURNING {TICKET_COLUMNS}"#
        );
        sqlx::query_as::<_, Ticket>(&query)
            .bind(row)
            .bind(seat)
            .bind(show_session_id)
            .bind(reservation_id)
            .fetch_one(executor)
            .await
    }

    pub async fn count<'e>(executor: impl PgExecutor<'e>) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tickets")
            .fetch_one(executor)
            .await
    }

    pub async fn count_for_session<'e>(
        executor: impl PgExecutor<'e>,
        session_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tickets WHERE show_session_id = $1")
            .bind(session_id)
            .fetch_one(executor)
            .await
    }

    pub async fn extent_for_session<'e>(
        executor: impl PgExecutor<'e>,
        session_id: DbId,
    ) -> Result<TicketExtent, sqlx::Error> {
        sqlx::query_as::<_, TicketExtent>(
            r#"SELECT COUNT(*) AS issued, MAX("row") AS max_row, MAX(seat) AS max_seat
             FROM tickets
             WHERE show_session_id = $1"#,
        )
        .bind(session_id)
        .fetch_one(executor)
        .await
    }

    /// Tickets of the given reservations, ordered by row then seat.
    pub async fn for_reservations<'e>(
        executor: impl PgExecutor<'e>,
        reservation_ids: &[DbId],
    ) -> Result<Vec<Ticket>, sqlx::Error> {
        let query = format!(
            r#"SELECT {TICKET_COLUMNS} FROM tickets
             WHERE reservation_id = ANY($1)
             ORDER BY reservation_id, "row", seat"#
        );
        sqlx::query_as::<_, Ticket>(&query)
            .bind(reservation_ids)
            .fetch_all(executor)
            .await
    }
}
