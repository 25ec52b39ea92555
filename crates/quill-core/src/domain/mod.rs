//! Domain entities - the core business objects.

mod category;
mod comment;
mod post;
mod tag;
mod user;

pub use category::{
    CATEGORY_NAME_MAX, CATEGORY_SLUG_MAX, Category, CategoryCount, CategoryId, NewCategory,
    UNCATEGORIZED_LABEL, UNCATEGORIZED_SLUG,
};
pub use comment::{Comment, CommentId, NewComment};
pub use post::{HOOK_TEXT_MAX, NewPost, Post, PostDraft, PostId, TITLE_MAX};
pub use tag::{NewTag, TAG_NAME_MAX, Tag, TagId};
pub use user::{Actor, User, UserId};
