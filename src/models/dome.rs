use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgExecutor};
use validator::Validate;

use super::DbId;

const COLUMNS: &str = r#"id, name, "rows", seats_in_row"#;

/// A dome and its fixed seat grid.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Dome {
    pub id: DbId,
    pub name: String,
    pub rows: i32,
    pub seats_in_row: i32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateDome {
    #[validate(length(min = 1, max = 30))]
    pub name: String,
    #[validate(range(min = 1))]
    pub rows: i32,
    #[validate(range(min = 1))]
    pub seats_in_row: i32,
}

/// Dome as rendered to clients, capacity included.
#[derive(Debug, Serialize)]
pub struct DomeView {
    #[serde(flatten)]
    pub dome: Dome,
    pub capacity: i64,
}

impl Dome {
    pub fn capacity(&self) -> i64 {
        i64::from(self.rows) * i64::from(self.seats_in_row)
    }

    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        input: &CreateDome,
    ) -> Result<Dome, sqlx::Error> {
        let query = format!(
            r#"INSERT INTO planetarium_domes (name, "rows", seats_in_row)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"#
        );
        sqlx::query_as::<_, Dome>(&query)
            .bind(&input.name)
            .bind(input.rows)
            .bind(input.seats_in_row)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<Dome>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM planetarium_domes WHERE id = $1");
        sqlx::query_as::<_, Dome>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Dome hosting a session; `None` when the session does not exist.
    pub async fn for_session<'e>(
        executor: impl PgExecutor<'e>,
        session_id: DbId,
    ) -> Result<Option<Dome>, sqlx::Error> {
        sqlx::query_as::<_, Dome>(
            r#"SELECT d.id, d.name, d."rows", d.seats_in_row
             FROM show_sessions s
             JOIN planetarium_domes d ON d.id = s.planetarium_dome_id
             WHERE s.id = $1"#,
        )
        .bind(session_id)
        .fetch_optional(executor)
        .await
    }

    /// Like [`Dome::for_session`], but holds a share lock on the session row
    /// until the transaction ends, so the session cannot move to another dome
    /// in the meantime.
    pub async fn lock_for_session(
        conn: &mut PgConnection,
        session_id: DbId,
    ) -> Result<Option<Dome>, sqlx::Error> {
        sqlx::query_as::<_, Dome>(
            r#"SELECT d.id, d.name, d."rows", d.seats_in_row
             FROM show_sessions s
             JOIN planetarium_domes d ON d.id = s.planetarium_dome_id
             WHERE s.id = $1
             FOR SHARE OF s"#,
        )
        .bind(session_id)
        .fetch_optional(conn)
        .await
    }

    pub async fn list<'e>(executor: impl PgExecutor<'e>) -> Result<Vec<Dome>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM planetarium_domes ORDER BY id");
        sqlx::query_as::<_, Dome>(&query).fetch_all(executor).await
    }
}

impl From<Dome> for DomeView {
    fn from(dome: Dome) -> Self {
        let capacity = dome.capacity();
        Self { dome, capacity }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_is_rows_times_seats() {
        let dome = Dome {
            id: 1,
            name: "Main".into(),
            rows: 10,
            seats_in_row: 12,
        };
        assert_eq!(dome.capacity(), 120);
    }

    #[test]
    fn rejects_empty_grid() {
        let input = CreateDome {
            name: "Tiny".into(),
            rows: 0,
            seats_in_row: 5,
        };
        assert!(input.validate().is_err());
    }
}
