use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection};

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

impl User {
    pub async fn find_by_email(
        conn: &mut SqliteConnection,
        email: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(conn)
        .await
    }

    pub async fn create(
        conn: &mut SqliteConnection,
        email: &str,
        password_hash: &str,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES (?, ?)
            RETURNING id, email, password_hash
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(conn)
        .await
    }

    pub async fn list_all(conn: &mut SqliteConnection) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT id, email, password_hash FROM users ORDER BY id")
            .fetch_all(conn)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;

    #[tokio::test]
    async fn create_find_and_list() {
        let db = memory_pool().await;
        let mut conn = db.acquire().await.unwrap();

        let created = User::create(&mut conn, "ana@cine.club", "$argon2id$fake")
            .await
            .unwrap();
        assert!(created.id > 0);

        let found = User::find_by_email(&mut conn, "ana@cine.club")
            .await
            .unwrap()
            .expect("user exists");
        assert_eq!(found.id, created.id);
        assert!(User::find_by_email(&mut conn, "bob@cine.club")
            .await
            .unwrap()
            .is_none());

        let all = User::list_all(&mut conn).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_email_is_a_unique_violation() {
        let db = memory_pool().await;
        let mut conn = db.acquire().await.unwrap();
        User::create(&mut conn, "ana@cine.club", "h").await.unwrap();

        let err = User::create(&mut conn, "ana@cine.club", "h").await.unwrap_err();
        match err {
            sqlx::Error::Database(db_err) => assert!(db_err.is_unique_violation()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let user = User {
            id: 1,
            email: "ana@cine.club".into(),
            password_hash: "secret-hash".into(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(!json.contains("password"));
    }
}
