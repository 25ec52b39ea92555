//! Post entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    pub hook_text: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub head_image: Option<String>,
    pub file_upload: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub author_id: Option<Uuid>,
    pub category_id: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Category,
    #[sea_orm(has_many = "super::comment::Entity")]
    Comment,
    #[sea_orm(has_many = "super::post_tag::Entity")]
    PostTag,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

impl Related<super::tag::Entity> for Entity {
    fn to() -> RelationDef {
        super::post_tag::Relation::Tag.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::post_tag::Relation::Post.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from SeaORM Model to Domain Post.
impl From<Model> for quill_core::domain::Post {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            hook_text: model.hook_text,
            content: model.content,
            head_image: model.head_image,
            file_upload: model.file_upload,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
            author_id: model.author_id,
            category_id: model.category_id,
        }
    }
}

/// Conversion from Domain Post to SeaORM ActiveModel. `created_at` is left
/// untouched so updates never rewrite it.
impl From<quill_core::domain::Post> for ActiveModel {
    fn from(post: quill_core::domain::Post) -> Self {
        Self {
            id: Set(post.id),
            title: Set(post.title),
            hook_text: Set(post.hook_text),
            content: Set(post.content),
            head_image: Set(post.head_image),
            file_upload: Set(post.file_upload),
            updated_at: Set(post.updated_at.into()),
            author_id: Set(post.author_id),
            category_id: Set(post.category_id),
            ..Default::default()
        }
    }
}

impl From<quill_core::domain::NewPost> for ActiveModel {
    fn from(post: quill_core::domain::NewPost) -> Self {
        let draft = post.draft;
        Self {
            title: Set(draft.title),
            hook_text: Set(draft.hook_text),
            content: Set(draft.content),
            head_image: Set(draft.head_image),
            file_upload: Set(draft.file_upload),
            created_at: Set(post.created_at.into()),
            updated_at: Set(post.created_at.into()),
            author_id: Set(Some(post.author_id)),
            category_id: Set(draft.category_id),
            ..Default::default()
        }
    }
}
