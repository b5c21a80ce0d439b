use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgExecutor};
use uuid::Uuid;
use validator::Validate;

use super::DbId;

const POSTER_DIR: &str = "uploads/astronomy_shows";

const CATALOG_QUERY: &str = "
    SELECT s.id, s.title, s.description, s.poster,
           COALESCE(
               array_agg(t.name ORDER BY t.name) FILTER (WHERE t.id IS NOT NULL),
               '{}'
           ) AS themes
    FROM astronomy_shows s
    LEFT JOIN astronomy_show_themes st ON st.show_id = s.id
    LEFT JOIN show_themes t ON t.id = st.theme_id";

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AstronomyShow {
    pub id: DbId,
    pub title: String,
    pub description: String,
    pub poster: Option<String>,
}

/// A show with the names of its themes.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ShowWithThemes {
    pub id: DbId,
    pub title: String,
    pub description: String,
    pub poster: Option<String>,
    pub themes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateShow {
    #[validate(length(min = 1, max = 30))]
    pub title: String,
    pub description: String,
    /// Original file name of the poster; stored under a unique generated path.
    pub poster: Option<String>,
    #[serde(default)]
    pub show_themes: Vec<String>,
}

impl AstronomyShow {
    pub const TITLE_CONSTRAINT: &'static str = "uq_astronomy_shows_title";

    /// Inserts the show and links it to already existing themes.
    pub async fn create(
        conn: &mut PgConnection,
        input: &CreateShow,
        theme_ids: &[DbId],
    ) -> Result<AstronomyShow, sqlx::Error> {
        let poster = input
            .poster
            .as_deref()
            .map(|file_name| poster_path(&input.title, file_name));

        let show = sqlx::query_as::<_, AstronomyShow>(
            "INSERT INTO astronomy_shows (title, description, poster)
             VALUES ($1, $2, $3)
             RETURNING id, title, description, poster",
        )
        .bind(&input.title)
        .bind(&input.description)
        .bind(poster)
        .fetch_one(&mut *conn)
        .await?;

        sqlx::query(
            "INSERT INTO astronomy_show_themes (show_id, theme_id)
             SELECT $1, UNNEST($2::bigint[])",
        )
        .bind(show.id)
        .bind(theme_ids)
        .execute(&mut *conn)
        .await?;

        Ok(show)
    }

    pub async fn exists<'e>(executor: impl PgExecutor<'e>, id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM astronomy_shows WHERE id = $1)")
            .bind(id)
            .fetch_one(executor)
            .await
    }

    pub async fn find_with_themes<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<ShowWithThemes>, sqlx::Error> {
        let query = format!("{CATALOG_QUERY} WHERE s.id = $1 GROUP BY s.id");
        sqlx::query_as::<_, ShowWithThemes>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Catalog ordered by title, optionally filtered by a title substring.
    pub async fn catalog<'e>(
        executor: impl PgExecutor<'e>,
        title: Option<&str>,
    ) -> Result<Vec<ShowWithThemes>, sqlx::Error> {
        let query = format!(
            "{CATALOG_QUERY}
             WHERE ($1::text IS NULL OR s.title ILIKE '%' || $1 || '%')
             GROUP BY s.id
             ORDER BY s.title"
        );
        sqlx::query_as::<_, ShowWithThemes>(&query)
            .bind(title)
            .fetch_all(executor)
            .await
    }
}

/// `uploads/astronomy_shows/<slug>-<uuid><ext>` for an uploaded poster.
pub fn poster_path(title: &str, file_name: &str) -> String {
    let extension = std::path::Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();
    format!("{POSTER_DIR}/{}-{}{extension}", slugify(title), Uuid::new_v4())
}

fn slugify(value: &str) -> String {
    value
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_lowercases_and_joins_words() {
        assert_eq!(slugify("The Milky  Way!"), "the-milky-way");
        assert_eq!(slugify("--"), "");
    }

    #[test]
    fn poster_path_keeps_extension() {
        let path = poster_path("Black Holes", "poster.JPG");
        assert!(path.starts_with("uploads/astronomy_shows/black-holes-"));
        assert!(path.ends_with(".JPG"));
        assert_ne!(path, poster_path("Black Holes", "poster.JPG"));
    }
}
