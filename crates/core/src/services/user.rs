//! User service.

use chrono::Utc;
use regex::Regex;
use std::sync::LazyLock;
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;
use yatube_common::{AppError, AppResult, IdGenerator};
use yatube_db::{entities::user, repositories::UserRepository};

/// Letters, digits and `@ . + - _`.
#[allow(clippy::unwrap_used)]
static USERNAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").unwrap());

/// Input for creating a user.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserInput {
    #[validate(
        length(min = 1, max = 150),
        regex(
            path = *USERNAME_RE,
            message = "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
        )
    )]
    pub username: String,
}

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self {
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a user with a fresh access token.
    pub async fn create(&self, input: CreateUserInput) -> AppResult<user::Model> {
        input.validate()?;

        if self
            .user_repo
            .find_by_username(&input.username)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "Username already taken: {}",
                input.username
            )));
        }

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(input.username),
            token: Set(Some(self.id_gen.generate_token())),
            created_at: Set(Utc::now().into()),
        };

        let user = self.user_repo.create(model).await?;
        tracing::info!(user_id = %user.id, username = %user.username, "Created user");
        Ok(user)
    }

    /// Get a user by username.
    pub async fn get_by_username(&self, username: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_username(username).await
    }

    /// Resolve an access token to its user.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<Option<user::Model>> {
        if token.is_empty() {
            return Ok(None);
        }
        self.user_repo.find_by_token(token).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_user(id: &str, username: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            token: Some("test_token".to_string()),
            created_at: Utc::now().into(),
        }
    }

    fn service(db: MockDatabase) -> UserService {
        UserService::new(UserRepository::new(Arc::new(db.into_connection())))
    }

    #[tokio::test]
    async fn test_create_user() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .append_query_results([[create_test_user("u1", "leo")]]),
        );

        let user = svc
            .create(CreateUserInput {
                username: "leo".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(user.username, "leo");
    }

    #[tokio::test]
    async fn test_create_duplicate_username() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user("u1", "leo")]]),
        );

        let result = svc
            .create(CreateUserInput {
                username: "leo".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_invalid_username() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres));

        let too_long = "a".repeat(151);
        for username in ["", "has space", "semi;colon", too_long.as_str()] {
            let result = svc
                .create(CreateUserInput {
                    username: username.to_string(),
                })
                .await;
            assert!(
                matches!(result, Err(AppError::Validation(_))),
                "{username:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_username_pattern() {
        assert!(USERNAME_RE.is_match("john.doe+blog@example_1-x"));
        assert!(USERNAME_RE.is_match("Лев"));
        assert!(!USERNAME_RE.is_match("no/slash"));
    }

    #[tokio::test]
    async fn test_authenticate_empty_token_skips_query() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres));
        assert!(svc.authenticate_by_token("").await.unwrap().is_none());
    }
}
