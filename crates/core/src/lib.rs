//! Core business logic for yatube-rs.
//!
//! Services sit between the HTTP layer and the repositories: they paginate
//! listings, validate submitted forms and apply the resulting changes.

pub mod forms;
pub mod pagination;
pub mod services;

pub use forms::{BoundForm, CommentForm, FormErrors, ImageUpload, PostForm};
pub use pagination::{Page, PageWindow, Paginator};
pub use services::*;
