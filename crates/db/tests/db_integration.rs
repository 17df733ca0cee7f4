//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `yatube_test`)
//!   `TEST_DB_PASSWORD` (default: `yatube_test`)
//!   `TEST_DB_NAME` (default: `yatube_test`)

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use sea_orm::Set;
use yatube_db::entities::{group, post, user};
use yatube_db::repositories::{
    FollowRepository, GroupRepository, PostFilter, PostRepository, UserRepository,
};
use yatube_db::test_utils::{TestDatabase, TestDbConfig};

async fn seed_user(repo: &UserRepository, id: &str) -> user::Model {
    repo.create(user::ActiveModel {
        id: Set(id.to_string()),
        username: Set(format!("user_{id}")),
        token: Set(Some(format!("token_{id}"))),
        created_at: Set(Utc::now().into()),
    })
    .await
    .unwrap()
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_database_connection() {
    let config = TestDbConfig::default();
    let result = TestDatabase::with_config(config).await;
    assert!(result.is_ok(), "Failed to connect: {:?}", result.err());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_follow_pair_is_unique() {
    let db = TestDatabase::create_unique().await.unwrap();
    let conn = Arc::new(db.connection().clone());

    let users = UserRepository::new(conn.clone());
    let reader = seed_user(&users, "reader").await;
    let author = seed_user(&users, "author").await;

    let follows = FollowRepository::new(conn);
    assert!(follows.follow("f1".to_string(), &reader.id, &author.id).await.unwrap());
    assert!(!follows.follow("f2".to_string(), &reader.id, &author.id).await.unwrap());
    assert!(follows.is_following(&reader.id, &author.id).await.unwrap());

    assert_eq!(follows.unfollow(&reader.id, &author.id).await.unwrap(), 1);
    assert!(!follows.is_following(&reader.id, &author.id).await.unwrap());

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_post_listing_filters_and_order() {
    let db = TestDatabase::create_unique().await.unwrap();
    let conn = Arc::new(db.connection().clone());

    let users = UserRepository::new(conn.clone());
    let reader = seed_user(&users, "reader").await;
    let author = seed_user(&users, "author").await;
    let other = seed_user(&users, "other").await;

    let groups = GroupRepository::new(conn.clone());
    let cats = groups
        .create(group::ActiveModel {
            id: Set("g1".to_string()),
            title: Set("Cats".to_string()),
            slug: Set("cats".to_string()),
            description: Set(String::new()),
        })
        .await
        .unwrap();

    let posts = PostRepository::new(conn.clone());
    let base = Utc::now();
    for i in 0..13_i64 {
        let author_id = if i % 2 == 0 { &author.id } else { &other.id };
        posts
            .create(post::ActiveModel {
                id: Set(format!("p{i:02}")),
                text: Set(format!("Post number {i}")),
                author_id: Set(author_id.clone()),
                group_id: Set((i < 3).then(|| cats.id.clone())),
                image: Set(None),
                created_at: Set((base + Duration::seconds(i)).into()),
            })
            .await
            .unwrap();
    }

    assert_eq!(posts.count(&PostFilter::All).await.unwrap(), 13);
    assert_eq!(
        posts
            .count(&PostFilter::Group(cats.id.clone()))
            .await
            .unwrap(),
        3
    );
    assert_eq!(posts.count_by_author(&author.id).await.unwrap(), 7);

    let first = posts.find_page(&PostFilter::All, 0, 10).await.unwrap();
    assert_eq!(first.len(), 10);
    assert_eq!(first[0].id, "p12");
    let last = posts.find_page(&PostFilter::All, 10, 10).await.unwrap();
    assert_eq!(last.len(), 3);

    let follows = FollowRepository::new(conn);
    follows
        .follow("f1".to_string(), &reader.id, &author.id)
        .await
        .unwrap();
    let feed = posts
        .find_page(&PostFilter::FollowedBy(reader.id.clone()), 0, 10)
        .await
        .unwrap();
    assert_eq!(feed.len(), 7);
    assert!(feed.iter().all(|p| p.author_id == author.id));

    db.drop_database().await.unwrap();
}

#[test]
fn test_config_from_env() {
    let config = TestDbConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
    assert!(!config.username.is_empty());
    assert!(!config.database.is_empty());
}

#[test]
fn test_postgres_url_format() {
    let config = TestDbConfig::default();
    let url = config.postgres_url();
    assert!(url.ends_with("/postgres"));
}
