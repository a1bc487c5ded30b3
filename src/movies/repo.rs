use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection};

use crate::movies::dto::MovieFields;

/// Movie record; also the JSON shape every movie endpoint returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub year: i64,
    pub genre: String,
    pub rating: f64,
    pub image_url: Option<String>,
}

const COLUMNS: &str = "id, title, description, year, genre, rating, image_url";

impl Movie {
    pub async fn list_all(conn: &mut SqliteConnection) -> Result<Vec<Movie>, sqlx::Error> {
        sqlx::query_as::<_, Movie>(&format!("SELECT {COLUMNS} FROM movies ORDER BY id"))
            .fetch_all(conn)
            .await
    }

    pub async fn find_by_id(
        conn: &mut SqliteConnection,
        id: i64,
    ) -> Result<Option<Movie>, sqlx::Error> {
        sqlx::query_as::<_, Movie>(&format!("SELECT {COLUMNS} FROM movies WHERE id = ?"))
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Exact match. Titles are unique, so at most one row comes back.
    pub async fn find_by_title(
        conn: &mut SqliteConnection,
        title: &str,
    ) -> Result<Vec<Movie>, sqlx::Error> {
        sqlx::query_as::<_, Movie>(&format!(
            "SELECT {COLUMNS} FROM movies WHERE title = ? ORDER BY id"
        ))
        .bind(title)
        .fetch_all(conn)
        .await
    }

    pub async fn find_by_genre(
        conn: &mut SqliteConnection,
        genre: &str,
    ) -> Result<Vec<Movie>, sqlx::Error> {
        sqlx::query_as::<_, Movie>(&format!(
            "SELECT {COLUMNS} FROM movies WHERE genre = ? ORDER BY id"
        ))
        .bind(genre)
        .fetch_all(conn)
        .await
    }

    pub async fn create(
        conn: &mut SqliteConnection,
        fields: &MovieFields,
        image_url: &str,
    ) -> Result<Movie, sqlx::Error> {
        sqlx::query_as::<_, Movie>(&format!(
            r#"
            INSERT INTO movies (title, description, year, genre, rating, image_url)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(fields.year)
        .bind(&fields.genre)
        .bind(fields.rating)
        .bind(image_url)
        .fetch_one(conn)
        .await
    }

    /// Overwrites every scalar column. `image_url: None` keeps the current poster.
    pub async fn update(
        conn: &mut SqliteConnection,
        id: i64,
        fields: &MovieFields,
        image_url: Option<&str>,
    ) -> Result<Option<Movie>, sqlx::Error> {
        sqlx::query_as::<_, Movie>(&format!(
            r#"
            UPDATE movies
               SET title = ?, description = ?, year = ?, genre = ?, rating = ?,
                   image_url = COALESCE(?, image_url)
             WHERE id = ?
            RETURNING {COLUMNS}
            "#
        ))
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(fields.year)
        .bind(&fields.genre)
        .bind(fields.rating)
        .bind(image_url)
        .bind(id)
        .fetch_optional(conn)
        .await
    }

    pub async fn set_image_url(
        conn: &mut SqliteConnection,
        id: i64,
        image_url: &str,
    ) -> Result<Option<Movie>, sqlx::Error> {
        sqlx::query_as::<_, Movie>(&format!(
            "UPDATE movies SET image_url = ? WHERE id = ? RETURNING {COLUMNS}"
        ))
        .bind(image_url)
        .bind(id)
        .fetch_optional(conn)
        .await
    }

    /// Reviews pointing at the movie are left alone.
    pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<bool, sqlx::Error> {
        let res = sqlx::query("DELETE FROM movies WHERE id = ?")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
