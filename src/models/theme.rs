use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use validator::Validate;

use super::DbId;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Theme {
    pub id: DbId,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTheme {
    #[validate(length(min = 1, max = 30))]
    pub name: String,
}

impl Theme {
    pub const NAME_CONSTRAINT: &'static str = "uq_show_themes_name";

    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        input: &CreateTheme,
    ) -> Result<Theme, sqlx::Error> {
        sqlx::query_as::<_, Theme>(
            "INSERT INTO show_themes (name) VALUES ($1) RETURNING id, name",
        )
        .bind(&input.name)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<Theme>, sqlx::Error> {
        sqlx::query_as::<_, Theme>("SELECT id, name FROM show_themes WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Themes whose name contains `name` (case-insensitive), all themes when `None`.
    pub async fn list<'e>(
        executor: impl PgExecutor<'e>,
        name: Option<&str>,
    ) -> Result<Vec<Theme>, sqlx::Error> {
        sqlx::query_as::<_, Theme>(
            "SELECT id, name FROM show_themes
             WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%')
             ORDER BY name",
        )
        .bind(name)
        .fetch_all(executor)
        .await
    }

    pub async fn find_by_names<'e>(
        executor: impl PgExecutor<'e>,
        names: &[String],
    ) -> Result<Vec<Theme>, sqlx::Error> {
        sqlx::query_as::<_, Theme>(
            "SELECT id, name FROM show_themes WHERE name = ANY($1) ORDER BY name",
        )
        .bind(names)
        .fetch_all(executor)
        .await
    }
}
