use anyhow::Context;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tokio::task;
use tracing::error;

/// Argon2 is CPU-bound, so both entry points run on the blocking pool.
pub async fn hash_password(plain: String) -> anyhow::Result<String> {
    task::spawn_blocking(move || hash_blocking(&plain))
        .await
        .context("password hashing task")?
}

/// `Ok(false)` on mismatch; `Err` only when the stored hash is unreadable.
pub async fn verify_password(plain: String, stored_hash: String) -> anyhow::Result<bool> {
    task::spawn_blocking(move || verify_blocking(&plain, &stored_hash))
        .await
        .context("password verification task")?
}

fn hash_blocking(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

fn verify_blocking(plain: &str, stored_hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_and_verify_roundtrip() {
        let hash = hash_password("popcorn-and-soda".into())
            .await
            .expect("hashing should succeed");
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("popcorn-and-soda".into(), hash)
            .await
            .expect("verify should succeed"));
    }

    #[tokio::test]
    async fn verify_rejects_wrong_password() {
        let hash = hash_password("popcorn-and-soda".into()).await.unwrap();
        assert!(!verify_password("nachos".into(), hash)
            .await
            .expect("verify should not error"));
    }

    #[tokio::test]
    async fn plaintext_in_the_hash_column_is_an_error() {
        assert!(verify_password("secret".into(), "secret".into()).await.is_err());
    }
}
