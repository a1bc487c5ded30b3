use axum::{
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    db::UnitOfWork,
    error::{AppError, AppResult},
    extract::AppJson,
    state::AppState,
    users::{
        dto::{AuthStatus, Credentials, PublicUser},
        password::{hash_password, verify_password},
        repo::User,
    },
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/user/", post(register))
        .route("/login/", post(login))
        .route("/users/", get(list_users))
}

#[instrument(skip(uow, payload))]
pub async fn register(
    mut uow: UnitOfWork,
    AppJson(payload): AppJson<Credentials>,
) -> AppResult<Json<AuthStatus>> {
    let creds = payload.normalized()?;

    let hash = hash_password(creds.password)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    // the insert is the first statement; a taken email is its unique violation
    let user = match User::create(uow.conn(), &creds.email, &hash).await {
        Ok(user) => user,
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            warn!(email = %creds.email, "email already registered");
            return Err(AppError::Conflict("Email already registered".into()));
        }
        Err(e) => return Err(e.into()),
    };
    uow.commit().await?;

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok(Json(AuthStatus::logged_in(
        user.id,
        "User registered successfully",
    )))
}

/// A failed login is still a 200; the body says `isLogged: false`.
#[instrument(skip(uow, payload))]
pub async fn login(
    mut uow: UnitOfWork,
    AppJson(payload): AppJson<Credentials>,
) -> AppResult<Json<AuthStatus>> {
    let email = payload.email.trim().to_lowercase();

    let Some(user) = User::find_by_email(uow.conn(), &email).await? else {
        warn!(email = %email, "login unknown email");
        return Ok(Json(AuthStatus::rejected(INVALID_CREDENTIALS)));
    };
    // read-only; release the connection before the slow part
    drop(uow);

    let ok = verify_password(payload.password, user.password_hash)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    if !ok {
        warn!(email = %email, user_id = user.id, "login invalid password");
        return Ok(Json(AuthStatus::rejected(INVALID_CREDENTIALS)));
    }

    info!(user_id = user.id, email = %user.email, "user logged in");
    Ok(Json(AuthStatus::logged_in(user.id, "Login successful")))
}

#[instrument(skip(uow))]
pub async fn list_users(mut uow: UnitOfWork) -> AppResult<Json<Vec<PublicUser>>> {
    let users = User::list_all(uow.conn()).await?;
    let items = users
        .into_iter()
        .map(|u| PublicUser {
            id: u.id,
            email: u.email,
        })
        .collect();
    Ok(Json(items))
}
