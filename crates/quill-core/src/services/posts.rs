//! Post listing, detail and the create/update/delete flows.

use std::collections::HashMap;
use std::sync::Arc;

use validator::Validate;

use crate::domain::{
    Actor, Category, Comment, NewPost, Post, PostDraft, PostId, Tag, UNCATEGORIZED_SLUG, User,
};
use crate::error::{DomainError, FieldErrors};
use crate::ports::{BlogStore, CategoryRepository, PostQuery, TransactionalStore};

use super::guard::{require_account, require_actor, require_owner};
use super::sidebar::{Sidebar, load_sidebar};
use super::tagging::{TagResolution, assign_tags, join_tag_names, replace_tags, validate_tag_names};

/// Which posts a list page shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Uncategorized,
    Category(String),
    Tag(String),
}

impl PostFilter {
    /// Filter for a category slug; `no_category` selects uncategorized posts.
    pub fn category(slug: &str) -> Self {
        if slug == UNCATEGORIZED_SLUG {
            PostFilter::Uncategorized
        } else {
            PostFilter::Category(slug.to_string())
        }
    }

    pub fn tag(slug: &str) -> Self {
        PostFilter::Tag(slug.to_string())
    }
}

/// What a list page is showing, resolved from its filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListHeading {
    All,
    Uncategorized,
    Category(Category),
    Tag(Tag),
}

/// A post with its author, category and tags resolved.
#[derive(Debug, Clone)]
pub struct PostEntry {
    pub post: Post,
    pub author: Option<User>,
    pub category: Option<Category>,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone)]
pub struct CommentEntry {
    pub comment: Comment,
    pub author: Option<User>,
}

#[derive(Debug, Clone)]
pub struct PostListing {
    pub heading: ListHeading,
    pub posts: Vec<PostEntry>,
    pub sidebar: Sidebar,
}

/// Submitted content of the comment form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct CommentInput {
    #[validate(custom(function = "crate::validation::validate_required"))]
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct PostDetail {
    pub entry: PostEntry,
    pub comments: Vec<CommentEntry>,
    pub sidebar: Sidebar,
    /// Empty scaffold for the comment submission form.
    pub comment_form: CommentInput,
}

/// Submitted content of the post form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostInput {
    pub draft: PostDraft,
    /// Free-text tags separated by `,` or `;`.
    pub tags_str: String,
}

impl PostInput {
    fn normalized(self) -> Self {
        Self {
            draft: self.draft.normalized(),
            tags_str: self.tags_str,
        }
    }

    /// Draft and tag rules together, so one response lists every bad field.
    fn check(&self) -> Result<(), DomainError> {
        let mut errors = match self.draft.validate() {
            Ok(()) => FieldErrors::new(),
            Err(errors) => errors.into(),
        };
        if let Err(err) = validate_tag_names(&self.tags_str) {
            let message = err.message.map(|m| m.to_string());
            errors.push("tags_str", message.unwrap_or_else(|| "Invalid value.".into()));
        }
        errors.into_result()
    }
}

/// A post form ready to be filled in: empty for create, pre-filled for edit.
#[derive(Debug, Clone)]
pub struct PostFormPage {
    pub post_id: Option<PostId>,
    pub input: PostInput,
    pub categories: Vec<Category>,
}

/// A saved post and how each of its tags was resolved.
#[derive(Debug, Clone)]
pub struct SavedPost {
    pub post: Post,
    pub tags: Vec<TagResolution>,
}

#[derive(Clone)]
pub struct PostService {
    store: Arc<dyn TransactionalStore>,
}

impl PostService {
    pub fn new(store: Arc<dyn TransactionalStore>) -> Self {
        Self { store }
    }

    pub async fn sidebar(&self) -> Result<Sidebar, DomainError> {
        load_sidebar(&*self.store).await
    }

    /// Category choices offered by the post form.
    pub async fn categories(&self) -> Result<Vec<Category>, DomainError> {
        Ok(self.store.list_categories().await?)
    }

    /// Posts selected by `filter`, newest first.
    pub async fn list(&self, filter: &PostFilter) -> Result<PostListing, DomainError> {
        let store = &*self.store;
        let (heading, query) = match filter {
            PostFilter::All => (ListHeading::All, PostQuery::All),
            PostFilter::Uncategorized => (ListHeading::Uncategorized, PostQuery::Uncategorized),
            PostFilter::Category(slug) => {
                let category = store
                    .find_category_by_slug(slug)
                    .await?
                    .ok_or_else(|| DomainError::not_found("category", slug))?;
                let query = PostQuery::Category(category.id);
                (ListHeading::Category(category), query)
            }
            PostFilter::Tag(slug) => {
                let tag = store
                    .find_tag_by_slug(slug)
                    .await?
                    .ok_or_else(|| DomainError::not_found("tag", slug))?;
                let query = PostQuery::Tag(tag.id);
                (ListHeading::Tag(tag), query)
            }
        };

        let posts = store.list_posts(query).await?;
        let posts = assemble_entries(store, posts).await?;

        Ok(PostListing {
            heading,
            posts,
            sidebar: load_sidebar(store).await?,
        })
    }

    pub async fn detail(&self, id: PostId) -> Result<PostDetail, DomainError> {
        let store = &*self.store;
        let post = store
            .find_post(id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", id))?;

        let entry = assemble_entries(store, vec![post])
            .await?
            .pop()
            .ok_or_else(|| DomainError::Internal(format!("post {id} vanished while loading")))?;

        let comments = store.comments_for_post(id).await?;
        let author_ids: Vec<_> = comments.iter().map(|c| c.author_id).collect();
        let authors = users_by_id(store.find_users(&dedup(author_ids)).await?);
        let comments = comments
            .into_iter()
            .map(|comment| CommentEntry {
                author: authors.get(&comment.author_id).cloned(),
                comment,
            })
            .collect();

        Ok(PostDetail {
            entry,
            comments,
            sidebar: load_sidebar(store).await?,
            comment_form: CommentInput::default(),
        })
    }

    /// Empty form for a new post.
    pub async fn new_form(&self, actor: Option<&Actor>) -> Result<PostFormPage, DomainError> {
        require_actor(actor)?;
        Ok(PostFormPage {
            post_id: None,
            input: PostInput::default(),
            categories: self.store.list_categories().await?,
        })
    }

    /// Create a post authored by `actor` and attach its tags, atomically.
    pub async fn create(
        &self,
        actor: Option<&Actor>,
        input: PostInput,
    ) -> Result<SavedPost, DomainError> {
        require_actor(actor)?;
        let input = input.normalized();
        input.check()?;

        let tx = self.store.begin().await?;
        let actor = require_account(&*tx, actor).await?;
        ensure_category_exists(&*tx, &input.draft).await?;

        let post = tx
            .insert_post(NewPost::new(input.draft, actor.user_id))
            .await?;
        let tags = assign_tags(&*tx, post.id, &input.tags_str).await?;
        tx.commit().await?;

        tracing::info!(post_id = post.id, user_id = %actor.user_id, tags = tags.len(), "Created post");
        Ok(SavedPost { post, tags })
    }

    /// The post's current values, with tags joined by `"; "`. Owner only.
    pub async fn edit_form(
        &self,
        actor: Option<&Actor>,
        id: PostId,
    ) -> Result<PostFormPage, DomainError> {
        require_actor(actor)?;
        let post = self
            .store
            .find_post(id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", id))?;
        require_owner(actor, &post)?;

        let tags = self.store.post_tags(id).await?;
        Ok(PostFormPage {
            post_id: Some(id),
            input: PostInput {
                draft: PostDraft {
                    title: post.title,
                    hook_text: post.hook_text,
                    content: post.content,
                    head_image: post.head_image,
                    file_upload: post.file_upload,
                    category_id: post.category_id,
                },
                tags_str: join_tag_names(&tags),
            },
            categories: self.store.list_categories().await?,
        })
    }

    /// Overwrite the post and make its tag set exactly `input.tags_str`. Owner only.
    pub async fn update(
        &self,
        actor: Option<&Actor>,
        id: PostId,
        input: PostInput,
    ) -> Result<SavedPost, DomainError> {
        require_actor(actor)?;

        let tx = self.store.begin().await?;
        let mut post = tx
            .find_post_for_update(id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", id))?;
        let actor = require_owner(actor, &post)?;

        let input = input.normalized();
        input.check()?;
        ensure_category_exists(&*tx, &input.draft).await?;

        post.apply(input.draft);
        let post = tx.update_post(post).await?;
        let tags = replace_tags(&*tx, post.id, &input.tags_str).await?;
        tx.commit().await?;

        tracing::info!(post_id = post.id, user_id = %actor.user_id, tags = tags.len(), "Updated post");
        Ok(SavedPost { post, tags })
    }

    /// Delete the post with its comments. Owner only.
    pub async fn delete(&self, actor: Option<&Actor>, id: PostId) -> Result<Post, DomainError> {
        require_actor(actor)?;

        let tx = self.store.begin().await?;
        let post = tx
            .find_post_for_update(id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", id))?;
        let actor = require_owner(actor, &post)?;

        tx.delete_post(id).await?;
        tx.commit().await?;

        tracing::info!(post_id = id, user_id = %actor.user_id, "Deleted post");
        Ok(post)
    }
}

async fn ensure_category_exists<S>(store: &S, draft: &PostDraft) -> Result<(), DomainError>
where
    S: CategoryRepository + ?Sized,
{
    if let Some(category_id) = draft.category_id {
        if store.find_category(category_id).await?.is_none() {
            return Err(DomainError::invalid(
                "category",
                "Select a valid choice. That choice is not one of the available choices.",
            ));
        }
    }
    Ok(())
}

/// Resolve authors, categories and tags for a page of posts, keeping order.
async fn assemble_entries<S>(store: &S, posts: Vec<Post>) -> Result<Vec<PostEntry>, DomainError>
where
    S: BlogStore + ?Sized,
{
    if posts.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<PostId> = posts.iter().map(|p| p.id).collect();
    let mut tags: HashMap<PostId, Vec<Tag>> = HashMap::new();
    for (post_id, tag) in store.tags_for_posts(&ids).await? {
        tags.entry(post_id).or_default().push(tag);
    }

    let author_ids: Vec<_> = posts.iter().filter_map(|p| p.author_id).collect();
    let authors = users_by_id(store.find_users(&dedup(author_ids)).await?);

    let categories: HashMap<_, _> = store
        .list_categories()
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();

    Ok(posts
        .into_iter()
        .map(|post| PostEntry {
            author: post.author_id.and_then(|id| authors.get(&id).cloned()),
            category: post.category_id.and_then(|id| categories.get(&id).cloned()),
            tags: tags.remove(&post.id).unwrap_or_default(),
            post,
        })
        .collect())
}

fn users_by_id(users: Vec<User>) -> HashMap<uuid::Uuid, User> {
    users.into_iter().map(|u| (u.id, u)).collect()
}

fn dedup<T: Ord>(mut values: Vec<T>) -> Vec<T> {
    values.sort();
    values.dedup();
    values
}
