//! PostgreSQL repository implementations.

use async_trait::async_trait;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, JoinType, NotSet, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TryInsertResult,
};

use quill_core::domain::{
    Category, CategoryId, Comment, CommentId, NewCategory, NewComment, NewPost, NewTag, Post,
    PostId, Tag, TagId, User, UserId,
};
use quill_core::error::RepoError;
use quill_core::ports::{
    CategoryRepository, CommentRepository, PostQuery, PostRepository, TagRepository, UserRepository,
};

use super::entity::category::{self, Entity as CategoryEntity};
use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::post_tag::{self, Entity as PostTagEntity};
use super::entity::tag::{self, Entity as TagEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{SeaOrmStore, db_err};

/// Mask an email address for logging.
fn mask_email(email: &str) -> String {
    match email.find('@') {
        Some(at_pos) => {
            let (local, domain) = email.split_at(at_pos);
            let masked_local = match local.chars().next() {
                Some(first) if local.chars().count() > 1 => format!("{first}***"),
                _ => "***".to_string(),
            };
            format!("{masked_local}{domain}")
        }
        None => "***".to_string(),
    }
}

fn not_found_if_untouched(rows_affected: u64) -> Result<(), RepoError> {
    if rows_affected == 0 {
        return Err(RepoError::NotFound);
    }
    Ok(())
}

#[async_trait]
impl<C> UserRepository for SeaOrmStore<C>
where
    C: ConnectionTrait + Send + Sync,
{
    async fn find_user(&self, id: UserId) -> Result<Option<User>, RepoError> {
        let result = UserEntity::find_by_id(id)
            .one(&self.conn)
            .await
            .map_err(db_err)?;
        Ok(result.map(Into::into))
    }

    async fn find_users(&self, ids: &[UserId]) -> Result<Vec<User>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let result = UserEntity::find()
            .filter(user::Column::Id.is_in(ids.iter().copied()))
            .all(&self.conn)
            .await
            .map_err(db_err)?;
        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .map_err(db_err)?;
        Ok(result.map(Into::into))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .map_err(db_err)?;
        Ok(result.map(Into::into))
    }

    async fn insert_user(&self, user: User) -> Result<User, RepoError> {
        let model = user::ActiveModel::from(user)
            .insert(&self.conn)
            .await
            .map_err(db_err)?;
        Ok(model.into())
    }

    async fn delete_user(&self, id: UserId) -> Result<(), RepoError> {
        // comments cascade, posts.author_id is SET NULL
        let result = UserEntity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .map_err(db_err)?;
        not_found_if_untouched(result.rows_affected)
    }
}

#[async_trait]
impl<C> PostRepository for SeaOrmStore<C>
where
    C: ConnectionTrait + Send + Sync,
{
    async fn find_post(&self, id: PostId) -> Result<Option<Post>, RepoError> {
        let result = PostEntity::find_by_id(id)
            .one(&self.conn)
            .await
            .map_err(db_err)?;
        Ok(result.map(Into::into))
    }

    async fn find_post_for_update(&self, id: PostId) -> Result<Option<Post>, RepoError> {
        let result = PostEntity::find_by_id(id)
            .lock_exclusive()
            .one(&self.conn)
            .await
            .map_err(db_err)?;
        Ok(result.map(Into::into))
    }

    async fn list_posts(&self, query: PostQuery) -> Result<Vec<Post>, RepoError> {
        let select = PostEntity::find();
        let select = match query {
            PostQuery::All => select,
            PostQuery::Uncategorized => select.filter(post::Column::CategoryId.is_null()),
            PostQuery::Category(id) => select.filter(post::Column::CategoryId.eq(id)),
            PostQuery::Tag(id) => select
                .join(JoinType::InnerJoin, post::Relation::PostTag.def())
                .filter(post_tag::Column::TagId.eq(id)),
        };

        let result = select
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .all(&self.conn)
            .await
            .map_err(db_err)?;
        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn count_uncategorized(&self) -> Result<u64, RepoError> {
        PostEntity::find()
            .filter(post::Column::CategoryId.is_null())
            .count(&self.conn)
            .await
            .map_err(db_err)
    }

    async fn insert_post(&self, post: NewPost) -> Result<Post, RepoError> {
        let model = post::ActiveModel::from(post)
            .insert(&self.conn)
            .await
            .map_err(db_err)?;
        Ok(model.into())
    }

    async fn update_post(&self, post: Post) -> Result<Post, RepoError> {
        let model = post::ActiveModel::from(post)
            .update(&self.conn)
            .await
            .map_err(db_err)?;
        Ok(model.into())
    }

    async fn delete_post(&self, id: PostId) -> Result<(), RepoError> {
        // comments and post_tags rows cascade
        let result = PostEntity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .map_err(db_err)?;
        not_found_if_untouched(result.rows_affected)
    }

    async fn post_tags(&self, id: PostId) -> Result<Vec<Tag>, RepoError> {
        let result = TagEntity::find()
            .join(JoinType::InnerJoin, tag::Relation::PostTag.def())
            .filter(post_tag::Column::PostId.eq(id))
            .order_by_asc(tag::Column::Name)
            .order_by_asc(tag::Column::Id)
            .all(&self.conn)
            .await
            .map_err(db_err)?;
        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn tags_for_posts(&self, ids: &[PostId]) -> Result<Vec<(PostId, Tag)>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = PostTagEntity::find()
            .filter(post_tag::Column::PostId.is_in(ids.iter().copied()))
            .find_also_related(TagEntity)
            .all(&self.conn)
            .await
            .map_err(db_err)?;

        let mut pairs: Vec<(PostId, Tag)> = rows
            .into_iter()
            .filter_map(|(link, tag)| tag.map(|t| (link.post_id, t.into())))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.name.cmp(&b.1.name)));
        Ok(pairs)
    }

    async fn add_post_tag(&self, post_id: PostId, tag_id: TagId) -> Result<(), RepoError> {
        let link = post_tag::ActiveModel {
            post_id: Set(post_id),
            tag_id: Set(tag_id),
        };
        PostTagEntity::insert(link)
            .on_conflict(
                OnConflict::columns([post_tag::Column::PostId, post_tag::Column::TagId])
                    .do_nothing()
                    .to_owned(),
            )
            .do_nothing()
            .exec_without_returning(&self.conn)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn clear_post_tags(&self, post_id: PostId) -> Result<(), RepoError> {
        PostTagEntity::delete_many()
            .filter(post_tag::Column::PostId.eq(post_id))
            .exec(&self.conn)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}

#[async_trait]
impl<C> CategoryRepository for SeaOrmStore<C>
where
    C: ConnectionTrait + Send + Sync,
{
    async fn find_category(&self, id: CategoryId) -> Result<Option<Category>, RepoError> {
        let result = CategoryEntity::find_by_id(id)
            .one(&self.conn)
            .await
            .map_err(db_err)?;
        Ok(result.map(Into::into))
    }

    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let result = CategoryEntity::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&self.conn)
            .await
            .map_err(db_err)?;
        Ok(result.map(Into::into))
    }

    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>, RepoError> {
        let result = CategoryEntity::find()
            .filter(category::Column::Name.eq(name))
            .one(&self.conn)
            .await
            .map_err(db_err)?;
        Ok(result.map(Into::into))
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepoError> {
        let result = CategoryEntity::find()
            .order_by_asc(category::Column::Name)
            .all(&self.conn)
            .await
            .map_err(db_err)?;
        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn category_post_counts(&self) -> Result<Vec<(CategoryId, u64)>, RepoError> {
        let rows: Vec<(CategoryId, i64)> = PostEntity::find()
            .select_only()
            .column(post::Column::CategoryId)
            .column_as(Expr::col(post::Column::Id).count(), "post_count")
            .filter(post::Column::CategoryId.is_not_null())
            .group_by(post::Column::CategoryId)
            .into_tuple()
            .all(&self.conn)
            .await
            .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .map(|(id, count)| (id, count.max(0) as u64))
            .collect())
    }

    async fn insert_category(&self, category: NewCategory) -> Result<Category, RepoError> {
        let model = category::ActiveModel {
            id: NotSet,
            name: Set(category.name),
            slug: Set(category.slug),
        }
        .insert(&self.conn)
        .await
        .map_err(db_err)?;
        Ok(model.into())
    }

    async fn delete_category(&self, id: CategoryId) -> Result<(), RepoError> {
        // posts.category_id is SET NULL
        let result = CategoryEntity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .map_err(db_err)?;
        not_found_if_untouched(result.rows_affected)
    }
}

#[async_trait]
impl<C> TagRepository for SeaOrmStore<C>
where
    C: ConnectionTrait + Send + Sync,
{
    async fn find_tag_by_slug(&self, slug: &str) -> Result<Option<Tag>, RepoError> {
        let result = TagEntity::find()
            .filter(tag::Column::Slug.eq(slug))
            .one(&self.conn)
            .await
            .map_err(db_err)?;
        Ok(result.map(Into::into))
    }

    async fn find_tag_by_name(&self, name: &str) -> Result<Option<Tag>, RepoError> {
        let result = TagEntity::find()
            .filter(tag::Column::Name.eq(name))
            .order_by_asc(tag::Column::Id)
            .one(&self.conn)
            .await
            .map_err(db_err)?;
        Ok(result.map(Into::into))
    }

    async fn tag_slug_exists(&self, slug: &str) -> Result<bool, RepoError> {
        let count = TagEntity::find()
            .filter(tag::Column::Slug.eq(slug))
            .count(&self.conn)
            .await
            .map_err(db_err)?;
        Ok(count > 0)
    }

    async fn list_tags(&self) -> Result<Vec<Tag>, RepoError> {
        let result = TagEntity::find()
            .order_by_asc(tag::Column::Name)
            .order_by_asc(tag::Column::Id)
            .all(&self.conn)
            .await
            .map_err(db_err)?;
        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn insert_tag_if_absent(&self, tag: NewTag) -> Result<Option<Tag>, RepoError> {
        let model = tag::ActiveModel {
            id: NotSet,
            name: Set(tag.name),
            slug: Set(tag.slug),
        };
        let result = TagEntity::insert(model)
            .on_conflict(
                OnConflict::column(tag::Column::Slug)
                    .do_nothing()
                    .to_owned(),
            )
            .do_nothing()
            .exec_with_returning(&self.conn)
            .await
            .map_err(db_err)?;

        match result {
            TryInsertResult::Inserted(model) => Ok(Some(model.into())),
            TryInsertResult::Conflicted | TryInsertResult::Empty => Ok(None),
        }
    }
}

#[async_trait]
impl<C> CommentRepository for SeaOrmStore<C>
where
    C: ConnectionTrait + Send + Sync,
{
    async fn find_comment(&self, id: CommentId) -> Result<Option<Comment>, RepoError> {
        let result = CommentEntity::find_by_id(id)
            .one(&self.conn)
            .await
            .map_err(db_err)?;
        Ok(result.map(Into::into))
    }

    async fn comments_for_post(&self, post_id: PostId) -> Result<Vec<Comment>, RepoError> {
        let result = CommentEntity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_asc(comment::Column::CreatedAt)
            .order_by_asc(comment::Column::Id)
            .all(&self.conn)
            .await
            .map_err(db_err)?;
        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<Comment, RepoError> {
        let model = comment::ActiveModel::from(comment)
            .insert(&self.conn)
            .await
            .map_err(db_err)?;
        Ok(model.into())
    }

    async fn update_comment(&self, comment: Comment) -> Result<Comment, RepoError> {
        let model = comment::ActiveModel {
            id: Set(comment.id),
            content: Set(comment.content),
            updated_at: Set(comment.updated_at.into()),
            ..Default::default()
        }
        .update(&self.conn)
        .await
        .map_err(db_err)?;
        Ok(model.into())
    }

    async fn delete_comment(&self, id: CommentId) -> Result<(), RepoError> {
        let result = CommentEntity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .map_err(db_err)?;
        not_found_if_untouched(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::mask_email;

    #[test]
    fn emails_are_masked_for_logs() {
        assert_eq!(mask_email("alice@example.com"), "a***@example.com");
        assert_eq!(mask_email("a@example.com"), "***@example.com");
        assert_eq!(mask_email("not-an-email"), "***");
    }
}
