use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgExecutor};
use validator::Validate;

use super::DbId;

const COLUMNS: &str = "id, first_name, last_name, profession";

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Speaker {
    pub id: DbId,
    pub first_name: String,
    pub last_name: String,
    pub profession: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSpeaker {
    #[validate(length(min = 1, max = 30))]
    pub first_name: String,
    #[validate(length(min = 1, max = 30))]
    pub last_name: String,
    #[validate(length(min = 1, max = 30))]
    pub profession: String,
}

/// Case-insensitive substring filters for the speaker list.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SpeakerFilter {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profession: Option<String>,
}

/// Compact speaker entry used in list views.
#[derive(Debug, Clone, Serialize)]
pub struct SpeakerSummary {
    pub full_name: String,
    pub profession: String,
}

impl Speaker {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn summary(&self) -> SpeakerSummary {
        SpeakerSummary {
            full_name: self.full_name(),
            profession: self.profession.clone(),
        }
    }

    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        input: &CreateSpeaker,
    ) -> Result<Speaker, sqlx::Error> {
        let query = format!(
            "INSERT INTO show_speakers (first_name, last_name, profession)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Speaker>(&query)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.profession)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<Speaker>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM show_speakers WHERE id = $1");
        sqlx::query_as::<_, Speaker>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn list<'e>(
        executor: impl PgExecutor<'e>,
        filter: &SpeakerFilter,
    ) -> Result<Vec<Speaker>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM show_speakers
             WHERE ($1::text IS NULL OR first_name ILIKE '%' || $1 || '%')
               AND ($2::text IS NULL OR last_name ILIKE '%' || $2 || '%')
               AND ($3::text IS NULL OR profession ILIKE '%' || $3 || '%')
             ORDER BY id"
        );
        sqlx::query_as::<_, Speaker>(&query)
            .bind(filter.first_name.as_deref())
            .bind(filter.last_name.as_deref())
            .bind(filter.profession.as_deref())
            .fetch_all(executor)
            .await
    }

    /// Locks the given speakers for the rest of the transaction, in id order.
    ///
    /// Missing ids are simply absent from the result.
    pub async fn lock_many(
        conn: &mut PgConnection,
        ids: &[DbId],
    ) -> Result<Vec<Speaker>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM show_speakers
             WHERE id = ANY($1)
             ORDER BY id
             FOR UPDATE"
        );
        sqlx::query_as::<_, Speaker>(&query)
            .bind(ids)
            .fetch_all(conn)
            .await
    }

    /// Speakers of each listed session, as `(session_id, speaker)` pairs.
    pub async fn for_sessions<'e>(
        executor: impl PgExecutor<'e>,
        session_ids: &[DbId],
    ) -> Result<Vec<(DbId, Speaker)>, sqlx::Error> {
        let rows = sqlx::query_as::<_, SessionSpeakerRow>(
            "SELECT ss.session_id, sp.id, sp.first_name, sp.last_name, sp.profession
             FROM show_session_speakers ss
             JOIN show_speakers sp ON sp.id = ss.speaker_id
             WHERE ss.session_id = ANY($1)
             ORDER BY ss.session_id, sp.id",
        )
        .bind(session_ids)
        .fetch_all(executor)
        .await?;

        Ok(rows.into_iter().map(SessionSpeakerRow::split).collect())
    }
}

#[derive(FromRow)]
struct SessionSpeakerRow {
    session_id: DbId,
    #[sqlx(flatten)]
    speaker: Speaker,
}

impl SessionSpeakerRow {
    fn split(self) -> (DbId, Speaker) {
        (self.session_id, self.speaker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_name_joins_first_and_last() {
        let speaker = Speaker {
            id: 1,
            first_name: "Bob".into(),
            last_name: "Obo".into(),
            profession: "Astronomer".into(),
        };
        assert_eq!(speaker.full_name(), "Bob Obo");
        assert_eq!(speaker.summary().profession, "Astronomer");
    }
}
