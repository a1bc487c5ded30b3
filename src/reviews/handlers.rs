use axum::{
    routing::{get, put},
    Json, Router,
};
use sqlx::SqliteConnection;
use tracing::{info, instrument, warn};

use crate::{
    db::UnitOfWork,
    error::{AppError, AppResult},
    extract::{AppJson, AppPath},
    movies::repo::Movie,
    response::Detail,
    reviews::{
        dto::{MovieKey, ReviewRequest},
        repo::Review,
    },
    state::AppState,
};

/// Movie segments that are also static route prefixes (`/movies/title/..`,
/// `/movies/genre/..`). The router prefers those static routes and does not
/// backtrack, so reviews of movies with these titles get their own routes.
const RESERVED_SEGMENTS: [&str; 2] = ["title", "genre"];

pub fn review_routes() -> Router<AppState> {
    let router = Router::new()
        .route(
            "/movies/:id/reviews/",
            get(list_reviews_by_movie).post(create_review),
        )
        .route("/reviews/", get(list_reviews))
        .route("/reviews/:id", put(update_review).delete(delete_review));

    RESERVED_SEGMENTS.into_iter().fold(router, |router, segment| {
        router.route(
            &format!("/movies/{segment}/reviews/"),
            get(move |uow: UnitOfWork| reviews_of(uow, segment.to_string())).post(
                move |uow: UnitOfWork, AppJson(payload): AppJson<ReviewRequest>| {
                    add_review(uow, segment.to_string(), payload)
                },
            ),
        )
    })
}

/// POST /movies/:title/reviews/. The path segment is always a title here.
#[instrument(skip(uow, payload))]
pub async fn create_review(
    uow: UnitOfWork,
    AppPath(title): AppPath<String>,
    AppJson(payload): AppJson<ReviewRequest>,
) -> AppResult<Json<Review>> {
    add_review(uow, title, payload).await
}

/// GET /movies/:id_or_title/reviews/
#[instrument(skip(uow))]
pub async fn list_reviews_by_movie(
    uow: UnitOfWork,
    AppPath(key): AppPath<String>,
) -> AppResult<Json<Vec<Review>>> {
    reviews_of(uow, key).await
}

async fn add_review(
    mut uow: UnitOfWork,
    title: String,
    payload: ReviewRequest,
) -> AppResult<Json<Review>> {
    payload.validate()?;

    let Some(review) = Review::create(uow.conn(), &title, &payload.content, payload.rating).await?
    else {
        warn!(title = %title, "review for unknown movie");
        return Err(AppError::not_found(format!(
            "Movie with title '{title}' not found"
        )));
    };
    uow.commit().await?;

    info!(review_id = review.id, movie_id = review.movie_id, "review created");
    Ok(Json(review))
}

async fn reviews_of(mut uow: UnitOfWork, key: String) -> AppResult<Json<Vec<Review>>> {
    let movie = resolve_movie(uow.conn(), MovieKey::parse(&key))
        .await?
        .ok_or_else(|| AppError::not_found(format!("Movie '{key}' not found")))?;

    Ok(Json(Review::list_by_movie(uow.conn(), movie.id).await?))
}

#[instrument(skip(uow))]
pub async fn list_reviews(mut uow: UnitOfWork) -> AppResult<Json<Vec<Review>>> {
    Ok(Json(Review::list_all(uow.conn()).await?))
}

#[instrument(skip(uow, payload))]
pub async fn update_review(
    mut uow: UnitOfWork,
    AppPath(id): AppPath<i64>,
    AppJson(payload): AppJson<ReviewRequest>,
) -> AppResult<Json<Review>> {
    payload.validate()?;

    let review = Review::update(uow.conn(), id, &payload.content, payload.rating)
        .await?
        .ok_or_else(|| review_not_found(id))?;
    uow.commit().await?;

    info!(review_id = review.id, "review updated");
    Ok(Json(review))
}

#[instrument(skip(uow))]
pub async fn delete_review(mut uow: UnitOfWork, AppPath(id): AppPath<i64>) -> AppResult<Json<Detail>> {
    if !Review::delete(uow.conn(), id).await? {
        return Err(review_not_found(id));
    }
    uow.commit().await?;

    info!(review_id = id, "review deleted");
    Ok(Json(Detail::new("Review deleted")))
}

async fn resolve_movie(
    conn: &mut SqliteConnection,
    key: MovieKey,
) -> Result<Option<Movie>, sqlx::Error> {
    let title = match key {
        MovieKey::Id(id, raw) => match Movie::find_by_id(conn, id).await? {
            Some(movie) => return Ok(Some(movie)),
            None => raw,
        },
        MovieKey::Title(title) => title,
    };
    Ok(Movie::find_by_title(conn, &title).await?.into_iter().next())
}

fn review_not_found(id: i64) -> AppError {
    AppError::not_found(format!("Review with id {id} not found"))
}
