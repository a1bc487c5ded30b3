use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection};

/// Review record. `movie_id` may point at a movie that has since been deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: i64,
    pub content: String,
    pub rating: f64,
    pub movie_id: i64,
}

impl Review {
    /// Attaches a review to the movie with this exact title. `None` when no
    /// such movie exists. Lookup and insert are one statement, so the write
    /// lock is the first lock the transaction takes.
    pub async fn create(
        conn: &mut SqliteConnection,
        movie_title: &str,
        content: &str,
        rating: f64,
    ) -> Result<Option<Review>, sqlx::Error> {
        sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (content, rating, movie_id)
            SELECT ?, ?, id FROM movies WHERE title = ?
            RETURNING id, content, rating, movie_id
            "#,
        )
        .bind(content)
        .bind(rating)
        .bind(movie_title)
        .fetch_optional(conn)
        .await
    }

    pub async fn list_all(conn: &mut SqliteConnection) -> Result<Vec<Review>, sqlx::Error> {
        sqlx::query_as::<_, Review>(
            "SELECT id, content, rating, movie_id FROM reviews ORDER BY id",
        )
        .fetch_all(conn)
        .await
    }

    pub async fn list_by_movie(
        conn: &mut SqliteConnection,
        movie_id: i64,
    ) -> Result<Vec<Review>, sqlx::Error> {
        sqlx::query_as::<_, Review>(
            r#"
            SELECT id, content, rating, movie_id
              FROM reviews
             WHERE movie_id = ?
             ORDER BY id
            "#,
        )
        .bind(movie_id)
        .fetch_all(conn)
        .await
    }

    /// Content and rating only; a review never changes movie.
    pub async fn update(
        conn: &mut SqliteConnection,
        id: i64,
        content: &str,
        rating: f64,
    ) -> Result<Option<Review>, sqlx::Error> {
        sqlx::query_as::<_, Review>(
            r#"
            UPDATE reviews
               SET content = ?, rating = ?
             WHERE id = ?
            RETURNING id, content, rating, movie_id
            "#,
        )
        .bind(content)
        .bind(rating)
        .bind(id)
        .fetch_optional(conn)
        .await
    }

    pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<bool, sqlx::Error> {
        let res = sqlx::query("DELETE FROM reviews WHERE id = ?")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
