//! Profile pages and subscriptions.

use axum::{
    extract::{Path, Query, State},
    response::Response,
};
use serde::Serialize;
use yatube_common::AppResult;
use yatube_core::{FollowOutcome, Page, PostView};
use yatube_db::{entities::user, repositories::PostFilter};

use super::PageQuery;
use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::{Rendered, found, profile_path},
};

#[derive(Serialize)]
struct ProfileContext {
    author: user::Model,
    page_obj: Page<PostView>,
    following: bool,
}

#[derive(Serialize)]
struct FeedContext {
    page_obj: Page<PostView>,
}

/// `GET /profile/{username}/`
pub async fn profile(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Rendered> {
    let author = state.user_service.get_by_username(&username).await?;
    let page_obj = state
        .post_service
        .list(&PostFilter::Author(author.id.clone()), query.page.as_deref())
        .await?;
    let following = state
        .follow_service
        .is_following(viewer.id(), &author.id)
        .await?;

    Rendered::new(
        "posts/profile.html",
        ProfileContext {
            author,
            page_obj,
            following,
        },
    )
}

/// `GET /follow/`: posts by the authors the viewer follows.
pub async fn follow_index(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Rendered> {
    let page_obj = state
        .post_service
        .list(&PostFilter::FollowedBy(user.id), query.page.as_deref())
        .await?;

    Rendered::new("posts/follow.html", FeedContext { page_obj })
}

/// `/profile/{username}/follow/`
pub async fn profile_follow(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(username): Path<String>,
) -> AppResult<Response> {
    let author = state.user_service.get_by_username(&username).await?;

    match state.follow_service.follow(&user.id, &author.id).await? {
        FollowOutcome::Created => {}
        outcome => tracing::debug!(?outcome, username = %username, "Follow not recorded"),
    }

    Ok(found(&profile_path(&author.username)))
}

/// `/profile/{username}/unfollow/`
pub async fn profile_unfollow(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(username): Path<String>,
) -> AppResult<Response> {
    let author = state.user_service.get_by_username(&username).await?;
    state.follow_service.unfollow(&user.id, &author.id).await?;

    Ok(found("/"))
}
