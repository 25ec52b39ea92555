use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

use crate::domain::{
    Category, CategoryId, Comment, CommentId, NewCategory, NewComment, NewPost, NewTag, Post,
    PostId, Tag, TagId, User, UserId,
};
use crate::error::RepoError;

/// Which posts a listing selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostQuery {
    All,
    Uncategorized,
    Category(CategoryId),
    Tag(TagId),
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user(&self, id: UserId) -> Result<Option<User>, RepoError>;

    /// Users for the given ids; unknown ids are skipped.
    async fn find_users(&self, ids: &[UserId]) -> Result<Vec<User>, RepoError>;

    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    /// Fails with `RepoError::Constraint` when email or username is taken.
    async fn insert_user(&self, user: User) -> Result<User, RepoError>;

    /// Deletes the user's comments and clears the author of their posts.
    async fn delete_user(&self, id: UserId) -> Result<(), RepoError>;
}

/// Post repository.
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn find_post(&self, id: PostId) -> Result<Option<Post>, RepoError>;

    /// Like `find_post`, but the row stays locked until the surrounding
    /// transaction ends.
    async fn find_post_for_update(&self, id: PostId) -> Result<Option<Post>, RepoError>;

    /// Posts matching `query`, newest first.
    async fn list_posts(&self, query: PostQuery) -> Result<Vec<Post>, RepoError>;

    async fn count_uncategorized(&self) -> Result<u64, RepoError>;

    async fn insert_post(&self, post: NewPost) -> Result<Post, RepoError>;

    async fn update_post(&self, post: Post) -> Result<Post, RepoError>;

    /// Deletes the post, its comments and its tag links.
    async fn delete_post(&self, id: PostId) -> Result<(), RepoError>;

    /// Tags of one post, ordered by name.
    async fn post_tags(&self, id: PostId) -> Result<Vec<Tag>, RepoError>;

    /// Tags of several posts as `(post_id, tag)` pairs.
    async fn tags_for_posts(&self, ids: &[PostId]) -> Result<Vec<(PostId, Tag)>, RepoError>;

    /// Links a tag to a post; linking twice is a no-op.
    async fn add_post_tag(&self, post_id: PostId, tag_id: TagId) -> Result<(), RepoError>;

    async fn clear_post_tags(&self, post_id: PostId) -> Result<(), RepoError>;
}

/// Category repository.
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn find_category(&self, id: CategoryId) -> Result<Option<Category>, RepoError>;

    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError>;

    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>, RepoError>;

    /// All categories ordered by name.
    async fn list_categories(&self) -> Result<Vec<Category>, RepoError>;

    /// `(category_id, post_count)` for every category with at least one post.
    async fn category_post_counts(&self) -> Result<Vec<(CategoryId, u64)>, RepoError>;

    /// Fails with `RepoError::Constraint` when name or slug is taken.
    async fn insert_category(&self, category: NewCategory) -> Result<Category, RepoError>;

    /// Deletes the category; its posts become uncategorized.
    async fn delete_category(&self, id: CategoryId) -> Result<(), RepoError>;
}

/// Tag repository.
#[async_trait]
pub trait TagRepository: Send + Sync {
    async fn find_tag_by_slug(&self, slug: &str) -> Result<Option<Tag>, RepoError>;

    /// Oldest tag with exactly this name.
    async fn find_tag_by_name(&self, name: &str) -> Result<Option<Tag>, RepoError>;

    async fn tag_slug_exists(&self, slug: &str) -> Result<bool, RepoError>;

    /// All tags ordered by name.
    async fn list_tags(&self) -> Result<Vec<Tag>, RepoError>;

    /// Atomic insert-if-absent keyed on the slug. Returns `None` when a tag
    /// with the same slug already exists and nothing was written.
    async fn insert_tag_if_absent(&self, tag: NewTag) -> Result<Option<Tag>, RepoError>;
}

/// Comment repository.
#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn find_comment(&self, id: CommentId) -> Result<Option<Comment>, RepoError>;

    /// Comments of one post, oldest first.
    async fn comments_for_post(&self, post_id: PostId) -> Result<Vec<Comment>, RepoError>;

    async fn insert_comment(&self, comment: NewComment) -> Result<Comment, RepoError>;

    async fn update_comment(&self, comment: Comment) -> Result<Comment, RepoError>;

    async fn delete_comment(&self, id: CommentId) -> Result<(), RepoError>;
}

/// Everything the blog reads and writes.
pub trait BlogStore:
    UserRepository + PostRepository + CategoryRepository + TagRepository + CommentRepository
{
}

impl<T> BlogStore for T where
    T: UserRepository + PostRepository + CategoryRepository + TagRepository + CommentRepository
{
}

pub type CommitFuture = Pin<Box<dyn Future<Output = Result<(), RepoError>> + Send>>;

/// A unit of work. Dropping it without `commit` rolls every write back.
pub trait StoreTransaction: BlogStore {
    fn commit(self: Box<Self>) -> CommitFuture;
}

/// A store that can open transactions.
#[async_trait]
pub trait TransactionalStore: BlogStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, RepoError>;
}
