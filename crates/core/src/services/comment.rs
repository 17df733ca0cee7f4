//! Comment service.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::Set;
use serde::Serialize;
use yatube_common::{AppResult, IdGenerator};
use yatube_db::{
    entities::{comment, user},
    repositories::{CommentRepository, UserRepository},
};

use crate::forms::{BoundForm, CommentForm, FormErrors};

/// A comment with its author resolved.
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: comment::Model,
    pub author: user::Model,
}

/// Result of submitting a comment.
#[derive(Debug)]
pub enum CommentOutcome {
    Created(comment::Model),
    Invalid(FormErrors),
}

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub const fn new(comment_repo: CommentRepository, user_repo: UserRepository) -> Self {
        Self {
            comment_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// An empty comment form.
    #[must_use]
    pub fn blank_form(&self) -> BoundForm<CommentForm> {
        CommentForm::default().bind(FormErrors::new())
    }

    /// Add a comment to a post. The post must already be known to exist.
    pub async fn add(
        &self,
        post_id: &str,
        author_id: &str,
        form: CommentForm,
    ) -> AppResult<CommentOutcome> {
        let errors = form.clean();
        if !errors.is_empty() {
            return Ok(CommentOutcome::Invalid(errors));
        }

        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            post_id: Set(post_id.to_string()),
            author_id: Set(author_id.to_string()),
            text: Set(form.text.trim().to_string()),
            created_at: Set(Utc::now().into()),
        };

        let comment = self.comment_repo.create(model).await?;
        tracing::info!(comment_id = %comment.id, post_id = %post_id, author_id = %author_id, "Added comment");
        Ok(CommentOutcome::Created(comment))
    }

    /// Comments on a post, oldest first.
    pub async fn list_for_post(&self, post_id: &str) -> AppResult<Vec<CommentView>> {
        let comments = self.comment_repo.find_by_post(post_id).await?;

        let mut author_ids: Vec<String> = comments.iter().map(|c| c.author_id.clone()).collect();
        author_ids.sort_unstable();
        author_ids.dedup();

        let authors: HashMap<String, user::Model> = self
            .user_repo
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        Ok(comments
            .into_iter()
            .filter_map(|comment| {
                let author = authors.get(&comment.author_id).cloned()?;
                Some(CommentView { comment, author })
            })
            .collect())
    }
}
