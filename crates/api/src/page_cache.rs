//! In-process cache for whole page responses.
//!
//! Successful GET responses are stored by request URI for a fixed lifetime.
//! Entries are not invalidated on writes, so a cached page can lag behind
//! the database until it expires.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::RwLock;

/// A stored response.
#[derive(Debug, Clone)]
struct CachedPage {
    headers: HeaderMap,
    body: Bytes,
    stored_at: Instant,
}

impl CachedPage {
    fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.duration_since(self.stored_at) < ttl
    }

    fn to_response(&self) -> Response {
        let mut response = (StatusCode::OK, self.body.clone()).into_response();
        *response.headers_mut() = self.headers.clone();
        response
    }
}

/// Page cache shared by all requests.
#[derive(Clone)]
pub struct PageCache {
    entries: Arc<RwLock<HashMap<String, CachedPage>>>,
    ttl: Duration,
}

impl PageCache {
    /// Create a cache whose entries live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Look up a fresh entry.
    async fn get(&self, key: &str) -> Option<Response> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|page| page.is_fresh(Instant::now(), self.ttl))
            .map(CachedPage::to_response)
    }

    /// Store an entry, dropping any that have expired.
    async fn insert(&self, key: String, headers: HeaderMap, body: Bytes) {
        let mut entries = self.entries.write().await;
        let now = Instant::now();
        entries.retain(|_, page| page.is_fresh(now, self.ttl));
        entries.insert(
            key,
            CachedPage {
                headers,
                body,
                stored_at: now,
            },
        );
    }

    /// Drop every entry.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Number of stored entries, fresh or not.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

/// Serve GET requests from the cache, filling it on a miss.
pub async fn cache_page(
    State(cache): State<PageCache>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if req.method() != Method::GET {
        return next.run(req).await;
    }

    let key = req
        .uri()
        .path_and_query()
        .map_or_else(|| req.uri().path().to_string(), ToString::to_string);

    if let Some(response) = cache.get(&key).await {
        tracing::debug!(key = %key, "Page cache hit");
        return response;
    }

    let response = next.run(req).await;
    if response.status() != StatusCode::OK {
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Failed to buffer response for caching");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    cache.insert(key, parts.headers.clone(), bytes.clone()).await;
    Response::from_parts(parts, Body::from(bytes))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::{Router, middleware, routing::get};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    fn counting_app(cache: PageCache, hits: Arc<AtomicUsize>) -> Router {
        Router::new()
            .route(
                "/",
                get(move || {
                    let hits = hits.clone();
                    async move { hits.fetch_add(1, Ordering::SeqCst).to_string() }
                }),
            )
            .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
            .layer(middleware::from_fn_with_state(cache, cache_page))
    }

    async fn body_of(app: &Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_second_request_is_served_from_cache() {
        let cache = PageCache::new(Duration::from_secs(20));
        let hits = Arc::new(AtomicUsize::new(0));
        let app = counting_app(cache.clone(), hits.clone());

        assert_eq!(body_of(&app, "/").await.1, "0");
        assert_eq!(body_of(&app, "/").await.1, "0");
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        // Query strings are part of the key.
        assert_eq!(body_of(&app, "/?page=2").await.1, "1");
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_clear_forces_refresh() {
        let cache = PageCache::new(Duration::from_secs(20));
        let hits = Arc::new(AtomicUsize::new(0));
        let app = counting_app(cache.clone(), hits.clone());

        body_of(&app, "/").await;
        cache.clear().await;
        assert!(cache.is_empty().await);

        assert_eq!(body_of(&app, "/").await.1, "1");
    }

    #[tokio::test]
    async fn test_expired_entries_are_refreshed() {
        let cache = PageCache::new(Duration::ZERO);
        let hits = Arc::new(AtomicUsize::new(0));
        let app = counting_app(cache.clone(), hits.clone());

        body_of(&app, "/").await;
        body_of(&app, "/").await;
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache = PageCache::new(Duration::from_secs(20));
        let app = counting_app(cache.clone(), Arc::new(AtomicUsize::new(0)));

        assert_eq!(body_of(&app, "/missing").await.0, StatusCode::NOT_FOUND);
        assert!(cache.is_empty().await);
    }
}
