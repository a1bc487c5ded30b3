use serde::Deserialize;

use crate::error::AppError;

pub const MIN_RATING: f64 = 1.0;
pub const MAX_RATING: f64 = 10.0;

/// Ratings on movies and reviews both live in `[1, 10]`.
pub fn validate_rating(rating: f64) -> Result<(), AppError> {
    if rating.is_finite() && (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(())
    } else {
        Err(AppError::validation(format!(
            "rating must be between {MIN_RATING} and {MAX_RATING}, got {rating}"
        )))
    }
}

/// The scalar columns of a movie after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieFields {
    pub title: String,
    pub description: String,
    pub year: i64,
    pub genre: String,
    pub rating: f64,
}

impl MovieFields {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::validation("title must not be empty"));
        }
        if self.genre.trim().is_empty() {
            return Err(AppError::validation("genre must not be empty"));
        }
        validate_rating(self.rating)
    }
}

/// Text parts of the `POST /movies/` multipart form, collected as they arrive.
#[derive(Debug, Default)]
pub struct MovieForm {
    title: Option<String>,
    description: Option<String>,
    year: Option<String>,
    genre: Option<String>,
    rating: Option<String>,
}

impl MovieForm {
    /// Records a text part. Returns `false` for names the form does not know.
    pub fn set(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "title" => &mut self.title,
            "description" => &mut self.description,
            "year" => &mut self.year,
            "genre" => &mut self.genre,
            "rating" => &mut self.rating,
            _ => return false,
        };
        *slot = Some(value);
        true
    }

    pub fn into_fields(self) -> Result<MovieFields, AppError> {
        let year = required("year", self.year)?;
        let rating = required("rating", self.rating)?;
        let fields = MovieFields {
            title: required("title", self.title)?,
            description: required("description", self.description)?,
            year: year
                .trim()
                .parse()
                .map_err(|_| AppError::validation(format!("year must be an integer, got {year:?}")))?,
            genre: required("genre", self.genre)?,
            rating: rating
                .trim()
                .parse()
                .map_err(|_| AppError::validation(format!("rating must be a number, got {rating:?}")))?,
        };
        fields.validate()?;
        Ok(fields)
    }
}

fn required(field: &str, value: Option<String>) -> Result<String, AppError> {
    value.ok_or_else(|| AppError::validation(format!("field '{field}' is required")))
}

/// `PUT /movies/{id}`. `image_url` is optional; leaving it out keeps the poster.
#[derive(Debug, Deserialize)]
pub struct UpdateMovieRequest {
    pub title: String,
    pub description: String,
    pub year: i64,
    pub genre: String,
    pub rating: f64,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl UpdateMovieRequest {
    pub fn into_parts(self) -> Result<(MovieFields, Option<String>), AppError> {
        let fields = MovieFields {
            title: self.title,
            description: self.description,
            year: self.year,
            genre: self.genre,
            rating: self.rating,
        };
        fields.validate()?;
        Ok((fields, self.image_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(rating: &str) -> MovieForm {
        let mut f = MovieForm::default();
        f.set("title", "Heat".into());
        f.set("description", "LA, 1995".into());
        f.set("year", "1995".into());
        f.set("genre", "crime".into());
        f.set("rating", rating.into());
        f
    }

    #[test]
    fn rating_bounds_are_inclusive() {
        assert!(validate_rating(1.0).is_ok());
        assert!(validate_rating(10.0).is_ok());
        assert!(validate_rating(0.99).is_err());
        assert!(validate_rating(11.0).is_err());
        assert!(validate_rating(f64::NAN).is_err());
        assert!(validate_rating(f64::INFINITY).is_err());
    }

    #[test]
    fn form_parses_into_fields() {
        let fields = form("10").into_fields().unwrap();
        assert_eq!(fields.year, 1995);
        assert_eq!(fields.rating, 10.0);
        assert_eq!(fields.title, "Heat");
    }

    #[test]
    fn form_rejects_out_of_range_rating() {
        assert!(matches!(form("11").into_fields(), Err(AppError::Validation(_))));
    }

    #[test]
    fn form_rejects_garbage_numbers() {
        let err = form("great").into_fields().unwrap_err();
        assert!(err.to_string().contains("rating must be a number"));

        let mut f = form("7");
        f.set("year", "nineteen".into());
        assert!(f.into_fields().unwrap_err().to_string().contains("year"));
    }

    #[test]
    fn form_requires_every_field() {
        let mut f = MovieForm::default();
        f.set("title", "Heat".into());
        let err = f.into_fields().unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn form_ignores_unknown_names() {
        let mut f = MovieForm::default();
        assert!(!f.set("director", "Mann".into()));
        assert!(f.set("title", "Heat".into()));
    }

    #[test]
    fn update_request_defaults_image_url() {
        let req: UpdateMovieRequest = serde_json::from_value(serde_json::json!({
            "title": "Heat", "description": "", "year": 1995, "genre": "crime", "rating": 9.0
        }))
        .unwrap();
        let (fields, image_url) = req.into_parts().unwrap();
        assert_eq!(fields.rating, 9.0);
        assert!(image_url.is_none());
    }
}
