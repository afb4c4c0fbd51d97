//! What the error page shows for a failed request.

use serde::{Deserialize, Serialize};

/// Context of `errors/error.html`.
///
/// `detail` is only filled in for errors whose message is safe to show a
/// visitor; server faults carry a status and a title only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPage {
    pub status: u16,
    pub title: String,
    pub detail: Option<String>,
}

impl ErrorPage {
    pub fn not_found(detail: impl Into<String>) -> Self {
        Self {
            status: 404,
            title: "Page not found".to_string(),
            detail: Some(detail.into()),
        }
    }

    /// A write clashed with existing data, e.g. a taken slug.
    pub fn conflict(detail: impl Into<String>) -> Self {
        Self {
            status: 409,
            title: "Conflict".to_string(),
            detail: Some(detail.into()),
        }
    }

    pub fn server_error() -> Self {
        Self {
            status: 500,
            title: "Server error".to_string(),
            detail: None,
        }
    }
}
