use std::{str::FromStr, time::Duration};

use anyhow::Context;
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Sqlite, SqliteConnection, SqlitePool, Transaction,
};

use crate::{error::AppError, state::AppState};

/// Open the pool. Foreign keys stay off: `reviews.movie_id` documents the
/// relation but must not block deleting a movie.
pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("parse database url {database_url}"))?
        .create_if_missing(true)
        .foreign_keys(false);

    // An in-memory database lives only as long as its connection.
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .idle_timeout(None::<Duration>)
        .max_lifetime(None::<Duration>)
        .connect_with(options)
        .await
        .context("connect to database")?;
    Ok(pool)
}

pub async fn migrate(db: &SqlitePool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("run migrations")?;
    Ok(())
}

/// A request-scoped transaction. Handlers call [`UnitOfWork::commit`] once the
/// work succeeded; on any other exit the transaction is dropped, rolled back,
/// and its connection handed back to the pool.
///
/// `BEGIN` is deferred. A unit that writes must issue its first write before
/// any read: upgrading a read snapshot to a write lock fails with `SQLITE_BUSY`
/// under contention instead of waiting out `busy_timeout`.
pub struct UnitOfWork(Transaction<'static, Sqlite>);

impl UnitOfWork {
    pub async fn begin(db: &SqlitePool) -> Result<Self, sqlx::Error> {
        Ok(Self(db.begin().await?))
    }

    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut *self.0
    }

    pub async fn commit(self) -> Result<(), sqlx::Error> {
        self.0.commit().await
    }
}

#[async_trait]
impl FromRequestParts<AppState> for UnitOfWork {
    type Rejection = AppError;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self::begin(&state.db).await?)
    }
}

#[cfg(test)]
pub(crate) async fn memory_pool() -> SqlitePool {
    let db = connect("sqlite::memory:", 1).await.expect("memory pool");
    migrate(&db).await.expect("migrations");
    db
}
