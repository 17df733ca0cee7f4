//! Group pages.

use axum::extract::{Path, Query, State};
use serde::Serialize;
use yatube_common::AppResult;
use yatube_core::{Page, PostView};
use yatube_db::{entities::group, repositories::PostFilter};

use super::PageQuery;
use crate::{middleware::AppState, response::Rendered};

#[derive(Serialize)]
struct GroupContext {
    group: group::Model,
    page_obj: Page<PostView>,
}

/// `GET /group/{slug}/`: posts filed under a group.
pub async fn group_posts(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Rendered> {
    let group = state.group_service.get_by_slug(&slug).await?;
    let page_obj = state
        .post_service
        .list(&PostFilter::Group(group.id.clone()), query.page.as_deref())
        .await?;

    Rendered::new("posts/group_list.html", GroupContext { group, page_obj })
}
