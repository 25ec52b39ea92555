//! In-memory blog store - used when no database is configured and in tests.
//!
//! Transactions hold the store's lock for their whole lifetime and write to
//! a private copy of the state, which replaces the shared state on commit.
//! Dropping a transaction discards the copy.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, MutexGuard, OwnedMutexGuard};

use quill_core::domain::{
    Category, CategoryId, Comment, CommentId, NewCategory, NewComment, NewPost, NewTag, Post,
    PostId, Tag, TagId, User, UserId,
};
use quill_core::error::RepoError;
use quill_core::ports::{
    CategoryRepository, CommentRepository, CommitFuture, PostQuery, PostRepository,
    StoreTransaction, TagRepository, TransactionalStore, UserRepository,
};

/// Tables of the in-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    users: HashMap<UserId, User>,
    categories: BTreeMap<CategoryId, Category>,
    tags: BTreeMap<TagId, Tag>,
    posts: BTreeMap<PostId, Post>,
    post_tags: BTreeSet<(PostId, TagId)>,
    comments: BTreeMap<CommentId, Comment>,
    last_id: i64,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn by_name(tags: &mut Vec<Tag>) {
        tags.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    }

    fn delete_post(&mut self, id: PostId) {
        self.posts.remove(&id);
        self.post_tags.retain(|(post_id, _)| *post_id != id);
        self.comments.retain(|_, c| c.post_id != id);
    }
}

/// Access to the state a store instance operates on.
pub trait Scope: Send + Sync {
    fn state(&self) -> impl Future<Output = MutexGuard<'_, MemoryState>> + Send;
}

/// Scope of the shared store: every call locks, works and releases.
pub struct Shared(Arc<Mutex<MemoryState>>);

impl Scope for Shared {
    fn state(&self) -> impl Future<Output = MutexGuard<'_, MemoryState>> + Send {
        self.0.lock()
    }
}

/// Scope of an open transaction.
pub struct Pending {
    gate: OwnedMutexGuard<MemoryState>,
    working: Mutex<MemoryState>,
}

impl Scope for Pending {
    fn state(&self) -> impl Future<Output = MutexGuard<'_, MemoryState>> + Send {
        self.working.lock()
    }
}

/// Blog store backed by process memory. Data is lost on restart.
pub struct MemoryStore<S> {
    scope: S,
}

pub type InMemoryStore = MemoryStore<Shared>;
pub type InMemoryTransaction = MemoryStore<Pending>;

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            scope: Shared(Arc::new(Mutex::new(MemoryState::default()))),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransactionalStore for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, RepoError> {
        let gate = Arc::clone(&self.scope.0).lock_owned().await;
        let working = Mutex::new((*gate).clone());
        Ok(Box::new(MemoryStore {
            scope: Pending { gate, working },
        }))
    }
}

impl StoreTransaction for InMemoryTransaction {
    fn commit(self: Box<Self>) -> CommitFuture {
        Box::pin(async move {
            let Pending { mut gate, working } = self.scope;
            *gate = working.into_inner();
            Ok(())
        })
    }
}

#[async_trait]
impl<S: Scope> UserRepository for MemoryStore<S> {
    async fn find_user(&self, id: UserId) -> Result<Option<User>, RepoError> {
        Ok(self.scope.state().await.users.get(&id).cloned())
    }

    async fn find_users(&self, ids: &[UserId]) -> Result<Vec<User>, RepoError> {
        let state = self.scope.state().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.users.get(id).cloned())
            .collect())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let state = self.scope.state().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let state = self.scope.state().await;
        Ok(state
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn insert_user(&self, user: User) -> Result<User, RepoError> {
        let mut state = self.scope.state().await;
        let taken = state
            .users
            .values()
            .any(|u| u.id == user.id || u.email == user.email || u.username == user.username);
        if taken {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete_user(&self, id: UserId) -> Result<(), RepoError> {
        let mut state = self.scope.state().await;
        if state.users.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        state.comments.retain(|_, c| c.author_id != id);
        for post in state.posts.values_mut() {
            if post.author_id == Some(id) {
                post.author_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<S: Scope> PostRepository for MemoryStore<S> {
    async fn find_post(&self, id: PostId) -> Result<Option<Post>, RepoError> {
        Ok(self.scope.state().await.posts.get(&id).cloned())
    }

    // A transaction already holds the whole store.
    async fn find_post_for_update(&self, id: PostId) -> Result<Option<Post>, RepoError> {
        self.find_post(id).await
    }

    async fn list_posts(&self, query: PostQuery) -> Result<Vec<Post>, RepoError> {
        let state = self.scope.state().await;
        Ok(state
            .posts
            .values()
            .rev()
            .filter(|post| match query {
                PostQuery::All => true,
                PostQuery::Uncategorized => post.category_id.is_none(),
                PostQuery::Category(id) => post.category_id == Some(id),
                PostQuery::Tag(id) => state.post_tags.contains(&(post.id, id)),
            })
            .cloned()
            .collect())
    }

    async fn count_uncategorized(&self) -> Result<u64, RepoError> {
        let state = self.scope.state().await;
        Ok(state
            .posts
            .values()
            .filter(|p| p.category_id.is_none())
            .count() as u64)
    }

    async fn insert_post(&self, post: NewPost) -> Result<Post, RepoError> {
        let mut state = self.scope.state().await;
        let NewPost {
            draft,
            author_id,
            created_at,
        } = post;

        if !state.users.contains_key(&author_id) {
            return Err(RepoError::Constraint("author does not exist".to_string()));
        }
        if let Some(category_id) = draft.category_id {
            if !state.categories.contains_key(&category_id) {
                return Err(RepoError::Constraint("category does not exist".to_string()));
            }
        }

        let post = Post {
            id: state.next_id(),
            title: draft.title,
            hook_text: draft.hook_text,
            content: draft.content,
            head_image: draft.head_image,
            file_upload: draft.file_upload,
            created_at,
            updated_at: created_at,
            author_id: Some(author_id),
            category_id: draft.category_id,
        };
        state.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update_post(&self, post: Post) -> Result<Post, RepoError> {
        let mut state = self.scope.state().await;
        if let Some(category_id) = post.category_id {
            if !state.categories.contains_key(&category_id) {
                return Err(RepoError::Constraint("category does not exist".to_string()));
            }
        }
        let stored = state.posts.get_mut(&post.id).ok_or(RepoError::NotFound)?;
        let created_at = stored.created_at;
        *stored = Post { created_at, ..post };
        Ok(stored.clone())
    }

    async fn delete_post(&self, id: PostId) -> Result<(), RepoError> {
        let mut state = self.scope.state().await;
        if !state.posts.contains_key(&id) {
            return Err(RepoError::NotFound);
        }
        state.delete_post(id);
        Ok(())
    }

    async fn post_tags(&self, id: PostId) -> Result<Vec<Tag>, RepoError> {
        let state = self.scope.state().await;
        let mut tags: Vec<Tag> = state
            .post_tags
            .iter()
            .filter(|(post_id, _)| *post_id == id)
            .filter_map(|(_, tag_id)| state.tags.get(tag_id).cloned())
            .collect();
        MemoryState::by_name(&mut tags);
        Ok(tags)
    }

    async fn tags_for_posts(&self, ids: &[PostId]) -> Result<Vec<(PostId, Tag)>, RepoError> {
        let state = self.scope.state().await;
        let mut pairs: Vec<(PostId, Tag)> = state
            .post_tags
            .iter()
            .filter(|(post_id, _)| ids.contains(post_id))
            .filter_map(|(post_id, tag_id)| state.tags.get(tag_id).map(|t| (*post_id, t.clone())))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.name.cmp(&b.1.name)));
        Ok(pairs)
    }

    async fn add_post_tag(&self, post_id: PostId, tag_id: TagId) -> Result<(), RepoError> {
        let mut state = self.scope.state().await;
        if !state.posts.contains_key(&post_id) || !state.tags.contains_key(&tag_id) {
            return Err(RepoError::Constraint("post or tag does not exist".to_string()));
        }
        state.post_tags.insert((post_id, tag_id));
        Ok(())
    }

    async fn clear_post_tags(&self, post_id: PostId) -> Result<(), RepoError> {
        let mut state = self.scope.state().await;
        state.post_tags.retain(|(id, _)| *id != post_id);
        Ok(())
    }
}

#[async_trait]
impl<S: Scope> CategoryRepository for MemoryStore<S> {
    async fn find_category(&self, id: CategoryId) -> Result<Option<Category>, RepoError> {
        Ok(self.scope.state().await.categories.get(&id).cloned())
    }

    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let state = self.scope.state().await;
        Ok(state
            .categories
            .values()
            .find(|c| c.slug == slug)
            .cloned())
    }

    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>, RepoError> {
        let state = self.scope.state().await;
        Ok(state
            .categories
            .values()
            .find(|c| c.name == name)
            .cloned())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepoError> {
        let state = self.scope.state().await;
        let mut categories: Vec<Category> = state.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn category_post_counts(&self) -> Result<Vec<(CategoryId, u64)>, RepoError> {
        let state = self.scope.state().await;
        let mut counts: BTreeMap<CategoryId, u64> = BTreeMap::new();
        for category_id in state.posts.values().filter_map(|p| p.category_id) {
            *counts.entry(category_id).or_default() += 1;
        }
        Ok(counts.into_iter().collect())
    }

    async fn insert_category(&self, category: NewCategory) -> Result<Category, RepoError> {
        let mut state = self.scope.state().await;
        let taken = state
            .categories
            .values()
            .any(|c| c.name == category.name || c.slug == category.slug);
        if taken {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }

        let category = Category {
            id: state.next_id(),
            name: category.name,
            slug: category.slug,
        };
        state.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn delete_category(&self, id: CategoryId) -> Result<(), RepoError> {
        let mut state = self.scope.state().await;
        if state.categories.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        for post in state.posts.values_mut() {
            if post.category_id == Some(id) {
                post.category_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<S: Scope> TagRepository for MemoryStore<S> {
    async fn find_tag_by_slug(&self, slug: &str) -> Result<Option<Tag>, RepoError> {
        let state = self.scope.state().await;
        Ok(state.tags.values().find(|t| t.slug == slug).cloned())
    }

    async fn find_tag_by_name(&self, name: &str) -> Result<Option<Tag>, RepoError> {
        let state = self.scope.state().await;
        Ok(state.tags.values().find(|t| t.name == name).cloned())
    }

    async fn tag_slug_exists(&self, slug: &str) -> Result<bool, RepoError> {
        let state = self.scope.state().await;
        Ok(state.tags.values().any(|t| t.slug == slug))
    }

    async fn list_tags(&self) -> Result<Vec<Tag>, RepoError> {
        let state = self.scope.state().await;
        let mut tags: Vec<Tag> = state.tags.values().cloned().collect();
        MemoryState::by_name(&mut tags);
        Ok(tags)
    }

    async fn insert_tag_if_absent(&self, tag: NewTag) -> Result<Option<Tag>, RepoError> {
        let mut state = self.scope.state().await;
        if state.tags.values().any(|t| t.slug == tag.slug) {
            return Ok(None);
        }

        let tag = Tag {
            id: state.next_id(),
            name: tag.name,
            slug: tag.slug,
        };
        state.tags.insert(tag.id, tag.clone());
        Ok(Some(tag))
    }
}

#[async_trait]
impl<S: Scope> CommentRepository for MemoryStore<S> {
    async fn find_comment(&self, id: CommentId) -> Result<Option<Comment>, RepoError> {
        Ok(self.scope.state().await.comments.get(&id).cloned())
    }

    async fn comments_for_post(&self, post_id: PostId) -> Result<Vec<Comment>, RepoError> {
        let state = self.scope.state().await;
        Ok(state
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<Comment, RepoError> {
        let mut state = self.scope.state().await;
        if !state.posts.contains_key(&comment.post_id) {
            return Err(RepoError::Constraint("post does not exist".to_string()));
        }
        if !state.users.contains_key(&comment.author_id) {
            return Err(RepoError::Constraint("author does not exist".to_string()));
        }

        let comment = Comment {
            id: state.next_id(),
            post_id: comment.post_id,
            author_id: comment.author_id,
            content: comment.content,
            created_at: comment.created_at,
            updated_at: comment.created_at,
        };
        state.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn update_comment(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut state = self.scope.state().await;
        let stored = state
            .comments
            .get_mut(&comment.id)
            .ok_or(RepoError::NotFound)?;
        stored.content = comment.content;
        stored.updated_at = comment.updated_at;
        Ok(stored.clone())
    }

    async fn delete_comment(&self, id: CommentId) -> Result<(), RepoError> {
        let mut state = self.scope.state().await;
        state
            .comments
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}
