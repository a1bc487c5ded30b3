use serde::Deserialize;

use crate::{error::AppError, movies::dto::validate_rating};

/// Body of review creation and update.
#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub content: String,
    pub rating: f64,
}

impl ReviewRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_rating(self.rating)
    }
}

/// How `/movies/{key}/reviews/` names its movie: an id when the key is numeric,
/// a title otherwise. A numeric key that matches no id is retried as a title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovieKey {
    Id(i64, String),
    Title(String),
}

impl MovieKey {
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<i64>() {
            Ok(id) => MovieKey::Id(id, raw.to_string()),
            Err(_) => MovieKey::Title(raw.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn review_rating_is_bounded() {
        let ok = ReviewRequest { content: "fine".into(), rating: 10.0 };
        assert!(ok.validate().is_ok());
        let bad = ReviewRequest { content: "meh".into(), rating: 0.0 };
        assert!(matches!(bad.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn movie_key_parsing() {
        assert_eq!(MovieKey::parse("12"), MovieKey::Id(12, "12".into()));
        assert_eq!(MovieKey::parse("1917"), MovieKey::Id(1917, "1917".into()));
        assert_eq!(MovieKey::parse("Heat"), MovieKey::Title("Heat".into()));
        assert_eq!(MovieKey::parse("12 Angry Men"), MovieKey::Title("12 Angry Men".into()));
    }
}
