//! Business logic services.

#![allow(missing_docs)]

pub mod comment;
pub mod follow;
pub mod group;
pub mod post;
pub mod user;

pub use comment::{CommentOutcome, CommentService, CommentView};
pub use follow::{FollowOutcome, FollowService};
pub use group::{CreateGroupInput, GroupService};
pub use post::{PostFormOutcome, PostService, PostView};
pub use user::{CreateUserInput, UserService};
