use serde::Serialize;

/// `{"detail": "..."}` acknowledgement, the same shape errors use.
#[derive(Debug, Serialize)]
pub struct Detail {
    pub detail: String,
}

impl Detail {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}
