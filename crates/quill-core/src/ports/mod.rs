//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
pub mod media;
mod rate_limit;
mod repository;

pub use auth::{AuthError, PasswordService, STAFF_ROLE, TokenClaims, TokenService, USER_ROLE};
pub use media::{MediaError, MediaKind, MediaStorage, StoredMedia};
pub use rate_limit::{RateLimitError, RateLimitResult, RateLimiter};
pub use repository::{
    BlogStore, CategoryRepository, CommentRepository, CommitFuture, PostQuery, PostRepository,
    StoreTransaction, TagRepository, TransactionalStore, UserRepository,
};
