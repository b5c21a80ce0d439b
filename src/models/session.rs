use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgExecutor};

use super::DbId;
use crate::pagination::Page;

const COLUMNS: &str = "id, astronomy_show_id, planetarium_dome_id, show_day, time_start, time_end";

/// Session joined with its show, dome and issued ticket count.
const LISTING_QUERY: &str = r#"
    SELECT s.id, s.show_day, s.time_start, s.time_end,
           a.id AS astronomy_show_id, a.title AS astronomy_show,
           d.id AS planetarium_dome_id, d.name AS planetarium_dome,
           d."rows"::bigint * d.seats_in_row AS capacity,
           (SELECT COUNT(*) FROM tickets t WHERE t.show_session_id = s.id) AS tickets_issued
    FROM show_sessions s
    JOIN astronomy_shows a ON a.id = s.astronomy_show_id
    JOIN planetarium_domes d ON d.id = s.planetarium_dome_id"#;

const LISTING_FILTER: &str = "
    WHERE ($1::date IS NULL OR s.show_day = $1)
      AND ($2::text IS NULL OR a.title ILIKE '%' || $2 || '%')";

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Session {
    pub id: DbId,
    pub astronomy_show_id: DbId,
    pub planetarium_dome_id: DbId,
    pub show_day: NaiveDate,
    pub time_start: NaiveTime,
    pub time_end: NaiveTime,
}

/// Column values of a session to insert or overwrite.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub astronomy_show_id: DbId,
    pub planetarium_dome_id: DbId,
    pub show_day: NaiveDate,
    pub time_start: NaiveTime,
    pub time_end: NaiveTime,
}

/// A session row as read for list/detail views.
#[derive(Debug, Clone, FromRow)]
pub struct SessionListing {
    pub id: DbId,
    pub show_day: NaiveDate,
    pub time_start: NaiveTime,
    pub time_end: NaiveTime,
    pub astronomy_show_id: DbId,
    pub astronomy_show: String,
    pub planetarium_dome_id: DbId,
    pub planetarium_dome: String,
    pub capacity: i64,
    pub tickets_issued: i64,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct SessionFilter {
    pub date: Option<NaiveDate>,
    pub show_title: Option<String>,
}

/// An existing session of a speaker on some day.
#[derive(Debug, Clone, FromRow)]
pub struct SpeakerBooking {
    pub speaker_id: DbId,
    pub session_id: DbId,
    pub time_start: NaiveTime,
    pub time_end: NaiveTime,
}

impl Session {
    pub async fn insert<'e>(
        executor: impl PgExecutor<'e>,
        record: &SessionRecord,
    ) -> Result<Session, sqlx::Error> {
        let query = format!(
            "INSERT INTO show_sessions
                (astronomy_show_id, planetarium_dome_id, show_day, time_start, time_end)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(record.astronomy_show_id)
            .bind(record.planetarium_dome_id)
            .bind(record.show_day)
            .bind(record.time_start)
            .bind(record.time_end)
            .fetch_one(executor)
            .await
    }

    /// Overwrites a session; `None` when it does not exist.
    pub async fn update<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
        record: &SessionRecord,
    ) -> Result<Option<Session>, sqlx::Error> {
        let query = format!(
            "UPDATE show_sessions
             SET astronomy_show_id = $2, planetarium_dome_id = $3,
                 show_day = $4, time_start = $5, time_end = $6
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(id)
            .bind(record.astronomy_show_id)
            .bind(record.planetarium_dome_id)
            .bind(record.show_day)
            .bind(record.time_start)
            .bind(record.time_end)
            .fetch_optional(executor)
            .await
    }

    /// Locks a session row for the rest of the transaction.
    pub async fn lock(conn: &mut PgConnection, id: DbId) -> Result<Option<Session>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM show_sessions WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Session>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Replaces the speaker set of a session.
    pub async fn set_speakers(
        conn: &mut PgConnection,
        session_id: DbId,
        speaker_ids: &[DbId],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM show_session_speakers WHERE session_id = $1")
            .bind(session_id)
            .execute(&mut *conn)
            .await?;

        sqlx::query(
            "INSERT INTO show_session_speakers (session_id, speaker_id)
             SELECT $1, UNNEST($2::bigint[])",
        )
        .bind(session_id)
        .bind(speaker_ids)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Sessions of the given speakers on `day`, skipping `exclude`.
    pub async fn speaker_bookings<'e>(
        executor: impl PgExecutor<'e>,
        speaker_ids: &[DbId],
        day: NaiveDate,
        exclude: Option<DbId>,
    ) -> Result<Vec<SpeakerBooking>, sqlx::Error> {
        sqlx::query_as::<_, SpeakerBooking>(
            "SELECT ss.speaker_id, s.id AS session_id, s.time_start, s.time_end
             FROM show_session_speakers ss
             JOIN show_sessions s ON s.id = ss.session_id
             WHERE ss.speaker_id = ANY($1)
               AND s.show_day = $2
               AND ($3::bigint IS NULL OR s.id <> $3)
             ORDER BY ss.speaker_id, s.time_start, s.id",
        )
        .bind(speaker_ids)
        .bind(day)
        .bind(exclude)
        .fetch_all(executor)
        .await
    }

    pub async fn find_listing<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<SessionListing>, sqlx::Error> {
        let query = format!("{LISTING_QUERY} WHERE s.id = $1");
        sqlx::query_as::<_, SessionListing>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// One page of sessions, newest day first, and the total match count.
    pub async fn list(
        conn: &mut PgConnection,
        filter: &SessionFilter,
        page: Page,
    ) -> Result<(Vec<SessionListing>, i64), sqlx::Error> {
        let query = format!(
            "{LISTING_QUERY}
             {LISTING_FILTER}
             ORDER BY s.show_day DESC, s.time_start DESC, s.time_end DESC, s.id DESC
             LIMIT $3 OFFSET $4"
        );
        let rows = sqlx::query_as::<_, SessionListing>(&query)
            .bind(filter.date)
            .bind(filter.show_title.as_deref())
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&mut *conn)
            .await?;

        let count_query = format!(
            "SELECT COUNT(*)
             FROM show_sessions s
             JOIN astronomy_shows a ON a.id = s.astronomy_show_id
             {LISTING_FILTER}"
        );
        let count = sqlx::query_scalar::<_, i64>(&count_query)
            .bind(filter.date)
            .bind(filter.show_title.as_deref())
            .fetch_one(&mut *conn)
            .await?;

        Ok((rows, count))
    }
}
