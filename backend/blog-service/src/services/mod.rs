/// Business logic layer
///
/// Services own the rules handlers rely on: who may change a blog, how the
/// feed is paged, how credentials and sessions are handled.
pub mod admin;
pub mod auth;
pub mod blogs;
pub mod comments;

pub use admin::{ModeratedBlog, ModeratedUser, ModerationService};
pub use auth::{AuthService, IssuedSession, RegisterOutcome, ResetOutcome};
pub use blogs::{BlogService, BlogView, FeedItem};
pub use comments::CommentService;
