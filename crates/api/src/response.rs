//! Page responses: render contexts and redirects.

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use yatube_common::{AppError, AppResult};

/// A template name plus the context to render it with.
///
/// Markup is produced by an external template layer; this is what it
/// receives.
#[derive(Debug)]
pub struct Rendered {
    template: &'static str,
    context: Value,
}

impl Rendered {
    /// Serialize `context` for `template`.
    pub fn new(template: &'static str, context: impl Serialize) -> AppResult<Self> {
        let context =
            serde_json::to_value(context).map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(Self { template, context })
    }
}

impl IntoResponse for Rendered {
    fn into_response(self) -> Response {
        (
            StatusCode::OK,
            Json(json!({
                "template": self.template,
                "context": self.context,
            })),
        )
            .into_response()
    }
}

/// A `302 Found` redirect.
#[must_use]
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Path of a user's profile page.
#[must_use]
pub fn profile_path(username: &str) -> String {
    format!("/profile/{}/", urlencoding::encode(username))
}

/// Path of a post's detail page.
#[must_use]
pub fn post_path(post_id: &str) -> String {
    format!("/posts/{}/", urlencoding::encode(post_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_found_sets_location() {
        let response = found("/posts/abc/");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/posts/abc/");
    }

    #[test]
    fn test_profile_path_is_encoded() {
        assert_eq!(profile_path("leo"), "/profile/leo/");
        assert_eq!(profile_path("Лев"), "/profile/%D0%9B%D0%B5%D0%B2/");
    }
}
