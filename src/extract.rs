use axum::extract::{FromRequest, FromRequestParts, Multipart};

use crate::error::AppError;

/// `axum::Json`, but rejections come back as `AppError` so malformed bodies get
/// the same `{"detail": ...}` shape as every other error.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// `axum::extract::Path` with `AppError` rejections; an id that does not parse
/// is a 422.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

/// Multipart stream whose missing or bad boundary is reported as `AppError`.
#[derive(FromRequest)]
#[from_request(rejection(AppError))]
pub struct AppMultipart(pub Multipart);
