//! Follow service.

use yatube_common::{AppResult, IdGenerator};
use yatube_db::repositories::FollowRepository;

/// Result of a follow request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    /// A new relationship was recorded.
    Created,
    /// The relationship already existed.
    AlreadyFollowing,
    /// Users cannot follow themselves; nothing was recorded.
    SelfFollow,
}

/// Follow service for business logic.
#[derive(Clone)]
pub struct FollowService {
    follow_repo: FollowRepository,
    id_gen: IdGenerator,
}

impl FollowService {
    /// Create a new follow service.
    #[must_use]
    pub const fn new(follow_repo: FollowRepository) -> Self {
        Self {
            follow_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Subscribe `user_id` to `author_id`'s posts.
    pub async fn follow(&self, user_id: &str, author_id: &str) -> AppResult<FollowOutcome> {
        if user_id == author_id {
            return Ok(FollowOutcome::SelfFollow);
        }

        let created = self
            .follow_repo
            .follow(self.id_gen.generate(), user_id, author_id)
            .await?;

        if created {
            tracing::info!(user_id = %user_id, author_id = %author_id, "Followed author");
            Ok(FollowOutcome::Created)
        } else {
            Ok(FollowOutcome::AlreadyFollowing)
        }
    }

    /// Remove a subscription. Returns whether one existed.
    pub async fn unfollow(&self, user_id: &str, author_id: &str) -> AppResult<bool> {
        let removed = self.follow_repo.unfollow(user_id, author_id).await? > 0;
        if removed {
            tracing::info!(user_id = %user_id, author_id = %author_id, "Unfollowed author");
        }
        Ok(removed)
    }

    /// Whether the viewer follows the author. Anonymous viewers follow nobody.
    pub async fn is_following(&self, viewer_id: Option<&str>, author_id: &str) -> AppResult<bool> {
        match viewer_id {
            Some(viewer_id) => self.follow_repo.is_following(viewer_id, author_id).await,
            None => Ok(false),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;
    use yatube_db::entities::follow;

    fn service(db: MockDatabase) -> FollowService {
        FollowService::new(FollowRepository::new(Arc::new(db.into_connection())))
    }

    fn existing(user_id: &str, author_id: &str) -> follow::Model {
        follow::Model {
            id: "f1".to_string(),
            user_id: user_id.to_string(),
            author_id: author_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_follow_self_is_noop() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres));
        assert_eq!(
            svc.follow("u1", "u1").await.unwrap(),
            FollowOutcome::SelfFollow
        );
    }

    #[tokio::test]
    async fn test_follow_new_author() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<follow::Model>::new()])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }]),
        );
        assert_eq!(svc.follow("u1", "u2").await.unwrap(), FollowOutcome::Created);
    }

    #[tokio::test]
    async fn test_follow_twice() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing("u1", "u2")]]),
        );
        assert_eq!(
            svc.follow("u1", "u2").await.unwrap(),
            FollowOutcome::AlreadyFollowing
        );
    }

    #[tokio::test]
    async fn test_unfollow_missing_relationship() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }]),
        );
        assert!(!svc.unfollow("u1", "u2").await.unwrap());
    }

    #[tokio::test]
    async fn test_anonymous_follows_nobody() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres));
        assert!(!svc.is_following(None, "u2").await.unwrap());
    }
}
