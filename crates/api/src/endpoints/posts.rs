//! Post pages: homepage, detail, create, edit and comments.

use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use yatube_common::AppResult;
use yatube_core::{
    BoundForm, CommentForm, CommentOutcome, CommentView, Page, PostForm, PostFormOutcome,
    PostView,
};
use yatube_db::{entities::group, repositories::PostFilter};

use super::PageQuery;
use crate::{
    extractors::{AuthUser, PostFormBody},
    middleware::AppState,
    response::{Rendered, found, post_path, profile_path},
};

/// Length post titles are cut to on the detail page.
const TITLE_CHAR_COUNT: usize = 30;

#[derive(Serialize)]
struct IndexContext {
    page_obj: Page<PostView>,
}

#[derive(Serialize)]
struct DetailContext {
    post: PostView,
    author_posts_count: u64,
    form: BoundForm<CommentForm>,
    comments: Vec<CommentView>,
    char_count: usize,
}

#[derive(Serialize)]
struct PostFormContext {
    form: BoundForm<PostForm>,
    /// Choices for the `group` select.
    groups: Vec<group::Model>,
    #[serde(skip_serializing_if = "Option::is_none")]
    post_id: Option<String>,
    is_edit: bool,
}

/// `GET /`: every post, newest first.
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Rendered> {
    let page_obj = state
        .post_service
        .list(&PostFilter::All, query.page.as_deref())
        .await?;

    Rendered::new("posts/index.html", IndexContext { page_obj })
}

/// `GET /posts/{post_id}/`
pub async fn post_detail(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> AppResult<Rendered> {
    let post = state.post_service.get_view(&post_id).await?;
    let author_posts_count = state
        .post_service
        .count_by_author(&post.post.author_id)
        .await?;
    let comments = state.comment_service.list_for_post(&post_id).await?;

    Rendered::new(
        "posts/post_detail.html",
        DetailContext {
            post,
            author_posts_count,
            form: state.comment_service.blank_form(),
            comments,
            char_count: TITLE_CHAR_COUNT,
        },
    )
}

/// `GET /create/`
pub async fn post_create_form(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
) -> AppResult<Rendered> {
    Rendered::new(
        "posts/create_post.html",
        PostFormContext {
            form: state.post_service.blank_form(),
            groups: state.group_service.list().await?,
            post_id: None,
            is_edit: false,
        },
    )
}

/// `POST /create/`
pub async fn post_create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    PostFormBody(form): PostFormBody,
) -> AppResult<Response> {
    match state.post_service.create(&user.id, form).await? {
        PostFormOutcome::Saved(_) => Ok(found(&profile_path(&user.username))),
        PostFormOutcome::Invalid(form) => Ok(Rendered::new(
            "posts/create_post.html",
            PostFormContext {
                form,
                groups: state.group_service.list().await?,
                post_id: None,
                is_edit: false,
            },
        )?
        .into_response()),
    }
}

/// `GET /posts/{post_id}/edit/`
pub async fn post_edit_form(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(post_id): Path<String>,
) -> AppResult<Response> {
    let post = state.post_service.get_by_id(&post_id).await?;
    if post.author_id != user.id {
        return Ok(found(&post_path(&post.id)));
    }

    Ok(Rendered::new(
        "posts/create_post.html",
        PostFormContext {
            form: state.post_service.edit_form(&post),
            groups: state.group_service.list().await?,
            post_id: Some(post.id),
            is_edit: true,
        },
    )?
    .into_response())
}

/// `POST /posts/{post_id}/edit/`
pub async fn post_edit(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(post_id): Path<String>,
    PostFormBody(form): PostFormBody,
) -> AppResult<Response> {
    let post = state.post_service.get_by_id(&post_id).await?;
    if post.author_id != user.id {
        tracing::debug!(post_id = %post.id, user_id = %user.id, "Edit by non-author ignored");
        return Ok(found(&post_path(&post.id)));
    }

    let id = post.id.clone();
    match state.post_service.edit(post, form).await? {
        PostFormOutcome::Saved(_) => Ok(found(&post_path(&id))),
        PostFormOutcome::Invalid(form) => Ok(Rendered::new(
            "posts/create_post.html",
            PostFormContext {
                form,
                groups: state.group_service.list().await?,
                post_id: Some(id),
                is_edit: true,
            },
        )?
        .into_response()),
    }
}

/// `POST /posts/{post_id}/comment/`
///
/// Always returns to the post; a blank comment is dropped.
pub async fn add_comment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(post_id): Path<String>,
    Form(form): Form<CommentForm>,
) -> AppResult<Response> {
    let post = state.post_service.get_by_id(&post_id).await?;

    if let CommentOutcome::Invalid(errors) =
        state.comment_service.add(&post.id, &user.id, form).await?
    {
        tracing::debug!(post_id = %post.id, errors = ?errors, "Discarded invalid comment");
    }

    Ok(found(&post_path(&post.id)))
}
