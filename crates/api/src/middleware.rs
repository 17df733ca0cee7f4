//! Application state and authentication middleware.

#![allow(missing_docs)]

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use yatube_core::{CommentService, FollowService, GroupService, PostService, UserService};

use crate::page_cache::PageCache;

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "sessionid";

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub group_service: GroupService,
    pub post_service: PostService,
    pub comment_service: CommentService,
    pub follow_service: FollowService,
    pub page_cache: PageCache,
    /// Where anonymous visitors are sent for protected pages.
    pub login_url: String,
}

fn bearer_token(req: &Request<Body>) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|t| t.trim().to_string())
}

/// Authentication middleware.
///
/// Resolves the user from a bearer token or the session cookie and stores it
/// in the request extensions. Requests with unknown tokens stay anonymous.
pub async fn auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = bearer_token(&req)
        .or_else(|| jar.get(SESSION_COOKIE).map(|c| c.value().to_string()));

    if let Some(token) = token {
        match state.user_service.authenticate_by_token(&token).await {
            Ok(Some(user)) => {
                req.extensions_mut().insert(user);
            }
            Ok(None) => tracing::debug!("Unknown session token"),
            Err(e) => tracing::warn!(error = %e, "Failed to resolve session token"),
        }
    }

    next.run(req).await
}
