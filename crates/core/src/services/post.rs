//! Post service: listings, detail, creation and editing.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use sea_orm::{IntoActiveModel, Set};
use serde::Serialize;
use yatube_common::{AppError, AppResult, IdGenerator, StorageBackend, generate_storage_key};
use yatube_db::{
    entities::{group, post, user},
    repositories::{GroupRepository, PostFilter, PostRepository, UserRepository},
};

use crate::forms::{BoundForm, FormErrors, INVALID_CHOICE, ImageUpload, PostForm};
use crate::pagination::{Page, Paginator};

/// Storage prefix for post images.
const IMAGE_PREFIX: &str = "posts";

/// A post with its author and group resolved, as listings display it.
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: post::Model,
    pub author: user::Model,
    pub group: Option<group::Model>,
    pub excerpt: String,
    pub image_url: Option<String>,
}

/// Result of submitting a post form.
#[derive(Debug)]
pub enum PostFormOutcome {
    /// The post was written.
    Saved(post::Model),
    /// The form has errors and should be shown again.
    Invalid(BoundForm<PostForm>),
}

/// Post service for business logic.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    user_repo: UserRepository,
    group_repo: GroupRepository,
    storage: Arc<dyn StorageBackend>,
    paginator: Paginator,
    id_gen: IdGenerator,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub fn new(
        post_repo: PostRepository,
        user_repo: UserRepository,
        group_repo: GroupRepository,
        storage: Arc<dyn StorageBackend>,
        posts_per_page: u64,
    ) -> Self {
        Self {
            post_repo,
            user_repo,
            group_repo,
            storage,
            paginator: Paginator::new(posts_per_page),
            id_gen: IdGenerator::new(),
        }
    }

    /// Get one page of posts, newest first.
    ///
    /// `page` is the raw `page` query parameter.
    pub async fn list(&self, filter: &PostFilter, page: Option<&str>) -> AppResult<Page<PostView>> {
        let total = self.post_repo.count(filter).await?;
        let window = self.paginator.window(total, page);

        let posts = if total == 0 {
            Vec::new()
        } else {
            self.post_repo
                .find_page(filter, window.offset, window.limit)
                .await?
        };

        let views = self.hydrate(posts).await?;
        Ok(self.paginator.page(window, views))
    }

    /// Get a post by ID.
    pub async fn get_by_id(&self, id: &str) -> AppResult<post::Model> {
        self.post_repo.get_by_id(id).await
    }

    /// Get a post by ID with author and group resolved.
    pub async fn get_view(&self, id: &str) -> AppResult<PostView> {
        let post = self.post_repo.get_by_id(id).await?;
        self.hydrate_one(post).await
    }

    /// Count the posts written by a user.
    pub async fn count_by_author(&self, author_id: &str) -> AppResult<u64> {
        self.post_repo.count_by_author(author_id).await
    }

    /// An empty creation form.
    #[must_use]
    pub fn blank_form(&self) -> BoundForm<PostForm> {
        PostForm::default().bind(FormErrors::new())
    }

    /// A form prefilled from an existing post.
    #[must_use]
    pub fn edit_form(&self, post: &post::Model) -> BoundForm<PostForm> {
        PostForm {
            text: post.text.clone(),
            group: Some(post.group_id.clone().unwrap_or_default()),
            image: None,
        }
        .bind(FormErrors::new())
    }

    /// Create a post authored by `author_id`.
    pub async fn create(&self, author_id: &str, form: PostForm) -> AppResult<PostFormOutcome> {
        let errors = self.clean(&form).await?;
        if !errors.is_empty() {
            return Ok(PostFormOutcome::Invalid(form.bind(errors)));
        }

        let image = match &form.image {
            Some(upload) => Some(self.store_image(upload).await?),
            None => None,
        };

        let model = post::ActiveModel {
            id: Set(self.id_gen.generate()),
            text: Set(form.text.trim().to_string()),
            author_id: Set(author_id.to_string()),
            group_id: Set(form.group_id().map(ToString::to_string)),
            image: Set(image),
            created_at: Set(Utc::now().into()),
        };

        let post = self.post_repo.create(model).await?;
        tracing::info!(post_id = %post.id, author_id = %author_id, "Created post");
        Ok(PostFormOutcome::Saved(post))
    }

    /// Apply a submitted form to an existing post.
    ///
    /// Only submitted fields change: the group is left alone when the field
    /// is absent and the image is kept unless a new file is uploaded. The
    /// caller is responsible for checking authorship.
    pub async fn edit(&self, post: post::Model, mut form: PostForm) -> AppResult<PostFormOutcome> {
        let errors = self.clean(&form).await?;
        if !errors.is_empty() {
            form.group
                .get_or_insert_with(|| post.group_id.clone().unwrap_or_default());
            return Ok(PostFormOutcome::Invalid(form.bind(errors)));
        }

        let old_image = post.image.clone();
        let mut active = post.into_active_model();
        active.text = Set(form.text.trim().to_string());

        if form.group.is_some() {
            active.group_id = Set(form.group_id().map(ToString::to_string));
        }

        let mut replaced_image = None;
        if let Some(upload) = &form.image {
            active.image = Set(Some(self.store_image(upload).await?));
            replaced_image = old_image;
        }

        let post = self.post_repo.update(active).await?;
        tracing::info!(post_id = %post.id, "Edited post");

        if let Some(key) = replaced_image {
            if let Err(e) = self.storage.delete(&key).await {
                tracing::warn!(key = %key, error = %e, "Failed to delete replaced image");
            }
        }

        Ok(PostFormOutcome::Saved(post))
    }

    async fn clean(&self, form: &PostForm) -> AppResult<FormErrors> {
        let mut errors = form.clean();

        if let Some(group_id) = form.group_id() {
            if self.group_repo.find_by_id(group_id).await?.is_none() {
                errors.add("group", INVALID_CHOICE);
            }
        }

        Ok(errors)
    }

    async fn store_image(&self, upload: &ImageUpload) -> AppResult<String> {
        let key = generate_storage_key(IMAGE_PREFIX, &upload.file_name);
        let stored = self
            .storage
            .upload(&key, &upload.data, &upload.content_type)
            .await?;
        Ok(stored.key)
    }

    async fn hydrate_one(&self, post: post::Model) -> AppResult<PostView> {
        let id = post.id.clone();
        self.hydrate(vec![post])
            .await?
            .pop()
            .ok_or_else(|| AppError::PostNotFound(id))
    }

    /// Resolve authors and groups for a batch of posts with one query each.
    async fn hydrate(&self, posts: Vec<post::Model>) -> AppResult<Vec<PostView>> {
        let author_ids: Vec<String> = posts
            .iter()
            .map(|p| p.author_id.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let group_ids: Vec<String> = posts
            .iter()
            .filter_map(|p| p.group_id.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let authors: HashMap<String, user::Model> = self
            .user_repo
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();
        let groups: HashMap<String, group::Model> = self
            .group_repo
            .find_by_ids(&group_ids)
            .await?
            .into_iter()
            .map(|g| (g.id.clone(), g))
            .collect();

        Ok(posts
            .into_iter()
            .filter_map(|post| {
                let Some(author) = authors.get(&post.author_id).cloned() else {
                    tracing::warn!(post_id = %post.id, "Post author is missing");
                    return None;
                };
                let group = post
                    .group_id
                    .as_ref()
                    .and_then(|id| groups.get(id).cloned());
                Some(PostView {
                    excerpt: post.excerpt(),
                    image_url: post.image.as_deref().map(|k| self.storage.public_url(k)),
                    author,
                    group,
                    post,
                })
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use crate::forms::{INVALID_IMAGE, REQUIRED};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Mutex;
    use yatube_common::UploadedFile;

    /// Keeps uploads in memory.
    #[derive(Default)]
    pub(crate) struct MemoryStorage {
        pub(crate) files: Mutex<HashMap<String, usize>>,
    }

    #[async_trait::async_trait]
    impl StorageBackend for MemoryStorage {
        async fn upload(
            &self,
            key: &str,
            data: &[u8],
            content_type: &str,
        ) -> AppResult<UploadedFile> {
            self.files
                .lock()
                .unwrap()
                .insert(key.to_string(), data.len());
            Ok(UploadedFile {
                key: key.to_string(),
                url: self.public_url(key),
                size: data.len() as u64,
                content_type: content_type.to_string(),
                md5: String::new(),
            })
        }

        async fn delete(&self, key: &str) -> AppResult<()> {
            self.files.lock().unwrap().remove(key);
            Ok(())
        }

        fn public_url(&self, key: &str) -> String {
            format!("/media/{key}")
        }
    }

    pub(crate) fn create_test_user(id: &str, username: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            token: None,
            created_at: Utc::now().into(),
        }
    }

    pub(crate) fn create_test_post(id: &str, author_id: &str, group_id: Option<&str>) -> post::Model {
        post::Model {
            id: id.to_string(),
            text: "A post long enough to be truncated".to_string(),
            author_id: author_id.to_string(),
            group_id: group_id.map(ToString::to_string),
            image: None,
            created_at: Utc::now().into(),
        }
    }

    fn create_test_group(id: &str) -> group::Model {
        group::Model {
            id: id.to_string(),
            title: "Cats".to_string(),
            slug: "cats".to_string(),
            description: String::new(),
        }
    }

    fn service(db: MockDatabase, storage: Arc<MemoryStorage>) -> PostService {
        let conn = Arc::new(db.into_connection());
        PostService::new(
            PostRepository::new(conn.clone()),
            UserRepository::new(conn.clone()),
            GroupRepository::new(conn),
            storage,
            10,
        )
    }

    fn count_row(n: i64) -> [std::collections::BTreeMap<&'static str, sea_orm::Value>; 1] {
        [maplit::btreemap! { "num_items" => sea_orm::Value::BigInt(Some(n)) }]
    }

    #[tokio::test]
    async fn test_list_hydrates_authors_and_groups() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([count_row(2)])
            .append_query_results([[
                create_test_post("p2", "u1", Some("g1")),
                create_test_post("p1", "u1", None),
            ]])
            .append_query_results([[create_test_user("u1", "leo")]])
            .append_query_results([[create_test_group("g1")]]);
        let svc = service(db, Arc::default());

        let page = svc.list(&PostFilter::All, None).await.unwrap();

        assert_eq!(page.count, 2);
        assert_eq!(page.num_pages, 1);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].author.username, "leo");
        assert_eq!(page.items[0].group.as_ref().unwrap().slug, "cats");
        assert!(page.items[1].group.is_none());
        assert_eq!(page.items[0].excerpt, "A post long eno");
    }

    #[tokio::test]
    async fn test_list_empty_skips_fetch() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([count_row(0)]);
        let svc = service(db, Arc::default());

        let page = svc
            .list(&PostFilter::FollowedBy("u1".to_string()), Some("3"))
            .await
            .unwrap();

        assert!(page.items.is_empty());
        assert_eq!((page.number, page.num_pages), (1, 1));
    }

    #[tokio::test]
    async fn test_create_post_with_image() {
        let storage = Arc::new(MemoryStorage::default());
        let mut created = create_test_post("p1", "u1", Some("g1"));
        created.image = Some("posts/x.png".to_string());

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_group("g1")]])
            .append_query_results([[created]]);
        let svc = service(db, storage.clone());

        let outcome = svc
            .create(
                "u1",
                PostForm {
                    text: "Hello".to_string(),
                    group: Some("g1".to_string()),
                    image: Some(crate::forms::tests::png_upload()),
                },
            )
            .await
            .unwrap();

        assert!(matches!(outcome, PostFormOutcome::Saved(p) if p.author_id == "u1"));
        let files = storage.files.lock().unwrap();
        assert_eq!(files.len(), 1);
        assert!(files.keys().all(|k| k.starts_with("posts/") && k.ends_with(".png")));
    }

    #[tokio::test]
    async fn test_create_stores_trimmed_text() {
        let conn = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_post("p1", "u1", None)]])
                .into_connection(),
        );
        let svc = PostService::new(
            PostRepository::new(conn.clone()),
            UserRepository::new(conn.clone()),
            GroupRepository::new(conn.clone()),
            Arc::new(MemoryStorage::default()),
            10,
        );

        svc.create(
            "u1",
            PostForm {
                text: "  Hello  \n".to_string(),
                group: None,
                image: None,
            },
        )
        .await
        .unwrap();
        drop(svc);

        let Ok(conn) = Arc::try_unwrap(conn) else {
            panic!("connection still shared");
        };
        let log = format!("{:?}", conn.into_transaction_log());
        assert!(log.contains(r#"Some("Hello")"#), "{log}");
    }

    #[tokio::test]
    async fn test_create_invalid_collects_all_errors() {
        let storage = Arc::new(MemoryStorage::default());
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<group::Model>::new()]);
        let svc = service(db, storage.clone());

        let outcome = svc
            .create(
                "u1",
                PostForm {
                    text: "  ".to_string(),
                    group: Some("missing".to_string()),
                    image: Some(ImageUpload {
                        file_name: "a.png".to_string(),
                        content_type: "image/png".to_string(),
                        data: b"junk".to_vec(),
                    }),
                },
            )
            .await
            .unwrap();

        let PostFormOutcome::Invalid(bound) = outcome else {
            panic!("expected an invalid form");
        };
        assert_eq!(bound.errors.field("text"), [REQUIRED.to_string()]);
        assert_eq!(bound.errors.field("group"), [INVALID_CHOICE.to_string()]);
        assert_eq!(bound.errors.field("image"), [INVALID_IMAGE.to_string()]);
        assert!(storage.files.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_edit_keeps_unsubmitted_group() {
        let existing = create_test_post("p1", "u1", Some("g1"));
        let mut updated = existing.clone();
        updated.text = "Changed".to_string();

        let db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[updated]]);
        let svc = service(db, Arc::default());

        let outcome = svc
            .edit(
                existing,
                PostForm {
                    text: "Changed".to_string(),
                    group: None,
                    image: None,
                },
            )
            .await
            .unwrap();

        let PostFormOutcome::Saved(post) = outcome else {
            panic!("expected the post to be saved");
        };
        assert_eq!(post.text, "Changed");
        assert_eq!(post.group_id.as_deref(), Some("g1"));
    }

    #[tokio::test]
    async fn test_edit_replaces_image() {
        let storage = Arc::new(MemoryStorage::default());
        storage
            .files
            .lock()
            .unwrap()
            .insert("posts/old.png".to_string(), 1);

        let mut existing = create_test_post("p1", "u1", None);
        existing.image = Some("posts/old.png".to_string());
        let mut updated = existing.clone();
        updated.image = Some("posts/new.png".to_string());

        let db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[updated]]);
        let svc = service(db, storage.clone());

        svc.edit(
            existing,
            PostForm {
                text: "Same".to_string(),
                group: Some(String::new()),
                image: Some(crate::forms::tests::png_upload()),
            },
        )
        .await
        .unwrap();

        let files = storage.files.lock().unwrap();
        assert!(!files.contains_key("posts/old.png"));
        assert_eq!(files.len(), 1);
    }

    #[tokio::test]
    async fn test_edit_invalid_redisplays_current_group() {
        let existing = create_test_post("p1", "u1", Some("g1"));
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres), Arc::default());

        let outcome = svc
            .edit(existing, PostForm::default())
            .await
            .unwrap();

        let PostFormOutcome::Invalid(bound) = outcome else {
            panic!("expected an invalid form");
        };
        assert_eq!(bound.data.group.as_deref(), Some("g1"));
    }

    #[test]
    fn test_edit_form_is_prefilled() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres), Arc::default());
        let bound = svc.edit_form(&create_test_post("p1", "u1", None));

        assert!(bound.is_valid());
        assert_eq!(bound.data.group.as_deref(), Some(""));
        assert_eq!(bound.data.text, "A post long enough to be truncated");
    }

    #[tokio::test]
    async fn test_get_view_unknown_post() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<post::Model>::new()]);
        let svc = service(db, Arc::default());

        assert!(matches!(
            svc.get_view("nope").await,
            Err(AppError::PostNotFound(_))
        ));
    }
}
