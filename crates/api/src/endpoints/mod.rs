//! Page routes.

mod groups;
mod posts;
mod profile;

use axum::{
    Router,
    http::Uri,
    middleware,
    routing::{get, post},
};
use serde::Deserialize;
use yatube_common::AppError;

use crate::middleware::{AppState, auth_middleware};
use crate::page_cache::{PageCache, cache_page};

/// The `?page=` query parameter, kept raw so bad values fall back to page 1.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// Create the page router. The homepage is served through `page_cache`.
pub fn router(page_cache: PageCache) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(posts::index).route_layer(middleware::from_fn_with_state(page_cache, cache_page)),
        )
        .route("/group/{slug}/", get(groups::group_posts))
        .route("/profile/{username}/", get(profile::profile))
        .route(
            "/profile/{username}/follow/",
            get(profile::profile_follow).post(profile::profile_follow),
        )
        .route(
            "/profile/{username}/unfollow/",
            get(profile::profile_unfollow).post(profile::profile_unfollow),
        )
        .route("/follow/", get(profile::follow_index))
        .route(
            "/create/",
            get(posts::post_create_form).post(posts::post_create),
        )
        .route("/posts/{post_id}/", get(posts::post_detail))
        .route(
            "/posts/{post_id}/edit/",
            get(posts::post_edit_form).post(posts::post_edit),
        )
        .route("/posts/{post_id}/comment/", post(posts::add_comment))
        .fallback(not_found)
}

/// Build the application: routes, identity resolution and state.
pub fn app(state: AppState) -> Router {
    router(state.page_cache.clone())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state)
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}
