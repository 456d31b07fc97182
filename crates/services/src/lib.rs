//! # services
//!
//! Use cases of the blog, written against the ports in `domains` only.

pub mod accounts;
pub mod feeds;
pub mod follows;
pub mod forms;
pub mod posts;

pub use accounts::{AccountService, Session};
pub use feeds::{FeedService, GroupFeed, ProfileFeed};
pub use follows::{FollowOutcome, FollowService, UnfollowOutcome};
pub use forms::{CommentInput, LoginInput, PostInput, SignupInput};
pub use posts::{PostDetail, PostService};
