//! HTTP layer for yatube-rs.
//!
//! - **Endpoints**: the blog's pages, returning render contexts or redirects
//! - **Extractors**: signed-in identity and post form bodies
//! - **Middleware**: token/session authentication
//! - **Page cache**: short-lived cache in front of the homepage
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod page_cache;
pub mod response;

pub use endpoints::{app, router};
pub use middleware::AppState;
pub use page_cache::PageCache;
