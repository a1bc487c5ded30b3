use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::{get, put},
    Json, Router,
};
use tracing::{debug, info, instrument, warn};

use crate::{
    db::UnitOfWork,
    error::{AppError, AppResult},
    extract::{AppJson, AppMultipart, AppPath},
    images::services::{discard_image, store_image, StoredImage, UploadItem},
    movies::{
        dto::{MovieFields, MovieForm, UpdateMovieRequest},
        repo::Movie,
    },
    response::Detail,
    state::AppState,
};

pub fn movie_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/movies/", get(list_movies).post(create_movie))
        .route(
            "/movies/:id",
            get(get_movie).put(update_movie).delete(delete_movie),
        )
        .route("/movies/:id/image", put(replace_movie_image))
        .route("/movies/title/:title", get(get_movies_by_title))
        .route("/movies/genre/:genre", get(get_movies_by_genre))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

// --- reads ---

#[instrument(skip(uow))]
pub async fn list_movies(mut uow: UnitOfWork) -> AppResult<Json<Vec<Movie>>> {
    Ok(Json(Movie::list_all(uow.conn()).await?))
}

#[instrument(skip(uow))]
pub async fn get_movie(mut uow: UnitOfWork, AppPath(id): AppPath<i64>) -> AppResult<Json<Movie>> {
    Movie::find_by_id(uow.conn(), id)
        .await?
        .map(Json)
        .ok_or_else(|| movie_not_found(id))
}

#[instrument(skip(uow))]
pub async fn get_movies_by_title(
    mut uow: UnitOfWork,
    AppPath(title): AppPath<String>,
) -> AppResult<Json<Vec<Movie>>> {
    let movies = Movie::find_by_title(uow.conn(), &title).await?;
    if movies.is_empty() {
        return Err(AppError::not_found(format!(
            "No movies found with title '{title}'"
        )));
    }
    Ok(Json(movies))
}

#[instrument(skip(uow))]
pub async fn get_movies_by_genre(
    mut uow: UnitOfWork,
    AppPath(genre): AppPath<String>,
) -> AppResult<Json<Vec<Movie>>> {
    let movies = Movie::find_by_genre(uow.conn(), &genre).await?;
    if movies.is_empty() {
        return Err(AppError::not_found(format!(
            "No movies found in genre '{genre}'"
        )));
    }
    Ok(Json(movies))
}

// --- writes ---

/// POST /movies/ (multipart)
/// Text parts: title, description, year, genre, rating. File part: image.
/// A taken title surfaces as the unique violation on insert (409).
#[instrument(skip(state, uow, mp))]
pub async fn create_movie(
    State(state): State<AppState>,
    mut uow: UnitOfWork,
    AppMultipart(mp): AppMultipart,
) -> AppResult<Json<Movie>> {
    let (form, image) = read_movie_multipart(mp).await?;
    let fields: MovieFields = form.into_fields()?;
    let image = require_image(image)?;

    let stored = store_image(state.storage.as_ref(), image)
        .await
        .map_err(AppError::Storage)?;

    let created = async {
        let movie = Movie::create(uow.conn(), &fields, &stored.url).await?;
        uow.commit().await?;
        Ok::<_, sqlx::Error>(movie)
    }
    .await;

    match created {
        Ok(movie) => {
            info!(movie_id = movie.id, title = %movie.title, image = %stored.url, "movie created");
            Ok(Json(movie))
        }
        Err(e) => {
            if matches!(&e, sqlx::Error::Database(db) if db.is_unique_violation()) {
                warn!(title = %fields.title, "movie title already taken");
            }
            discard_image(state.storage.as_ref(), &stored.key).await;
            Err(e.into())
        }
    }
}

#[instrument(skip(uow, payload))]
pub async fn update_movie(
    mut uow: UnitOfWork,
    AppPath(id): AppPath<i64>,
    AppJson(payload): AppJson<UpdateMovieRequest>,
) -> AppResult<Json<Movie>> {
    let (fields, image_url) = payload.into_parts()?;

    let movie = Movie::update(uow.conn(), id, &fields, image_url.as_deref())
        .await?
        .ok_or_else(|| movie_not_found(id))?;
    uow.commit().await?;

    info!(movie_id = movie.id, title = %movie.title, "movie updated");
    Ok(Json(movie))
}

/// PUT /movies/:id/image (multipart, `image` part). Swaps the poster and
/// removes the previous file when it was one of ours. The current poster is
/// read outside the write transaction.
#[instrument(skip(state, mp))]
pub async fn replace_movie_image(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    AppMultipart(mp): AppMultipart,
) -> AppResult<Json<Movie>> {
    let (_, image) = read_movie_multipart(mp).await?;
    let image = require_image(image)?;

    let previous = {
        let mut conn = state.db.acquire().await?;
        Movie::find_by_id(&mut conn, id)
            .await?
            .ok_or_else(|| movie_not_found(id))?
    };

    let stored: StoredImage = store_image(state.storage.as_ref(), image)
        .await
        .map_err(AppError::Storage)?;

    let updated = async {
        let mut uow = UnitOfWork::begin(&state.db).await?;
        let movie = Movie::set_image_url(uow.conn(), id, &stored.url).await?;
        uow.commit().await?;
        Ok::<_, sqlx::Error>(movie)
    }
    .await;

    let movie = match updated {
        Ok(Some(movie)) => movie,
        Ok(None) => {
            discard_image(state.storage.as_ref(), &stored.key).await;
            return Err(movie_not_found(id));
        }
        Err(e) => {
            discard_image(state.storage.as_ref(), &stored.key).await;
            return Err(e.into());
        }
    };

    if let Some(old_key) = previous
        .image_url
        .as_deref()
        .and_then(|url| state.storage.key_from_url(url))
    {
        discard_image(state.storage.as_ref(), &old_key).await;
    }

    info!(movie_id = movie.id, image = %stored.url, "movie image replaced");
    Ok(Json(movie))
}

/// Reviews of the movie are kept; they just lose their parent.
#[instrument(skip(uow))]
pub async fn delete_movie(mut uow: UnitOfWork, AppPath(id): AppPath<i64>) -> AppResult<Json<Detail>> {
    if !Movie::delete(uow.conn(), id).await? {
        return Err(movie_not_found(id));
    }
    uow.commit().await?;

    info!(movie_id = id, "movie deleted");
    Ok(Json(Detail::new("Movie deleted")))
}

// --- helpers ---

fn movie_not_found(id: i64) -> AppError {
    AppError::not_found(format!("Movie with id {id} not found"))
}

fn require_image(image: Option<UploadItem>) -> AppResult<UploadItem> {
    match image {
        Some(img) if !img.body.is_empty() => Ok(img),
        _ => Err(AppError::validation("image file is required")),
    }
}

/// Splits the stream into the text form and the (last) `image` file part.
async fn read_movie_multipart(mut mp: Multipart) -> AppResult<(MovieForm, Option<UploadItem>)> {
    let mut form = MovieForm::default();
    let mut image = None;

    while let Some(field) = mp.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            let content_type = field.content_type().map(str::to_string);
            let file_name = field.file_name().map(str::to_string);
            let body = field.bytes().await?;
            image = Some(UploadItem {
                body,
                content_type,
                file_name,
            });
        } else {
            let value = field.text().await?;
            if !form.set(&name, value) {
                debug!(field = %name, "ignoring unknown form field");
            }
        }
    }
    Ok((form, image))
}
