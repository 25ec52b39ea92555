//! Mapping from domain values to response DTOs.

use actix_web::{HttpResponse, http::header};

use quill_core::domain::{
    Category, Comment, Post, PostDraft, Tag, UNCATEGORIZED_LABEL, UNCATEGORIZED_SLUG, User,
};
use quill_core::ports::StoredMedia;
use quill_core::services::{
    CommentEntry, CommentInput, ListHeading, PostDetail, PostEntry, PostFormPage, PostInput,
    PostListing, Sidebar,
};
use quill_shared::RedirectResponse;
use quill_shared::dto::{
    AttachmentResponse, AuthorResponse, CategoryCountResponse, CategoryResponse, CommentForm,
    CommentFormResponse, CommentResponse, ListHeadingResponse, PostDetailResponse, PostForm,
    PostFormResponse, PostListResponse, PostResponse, SidebarResponse, TagResponse, UserResponse,
};

/// `303 See Other` to `location`, echoed in the body.
pub fn see_other(location: impl Into<String>) -> HttpResponse {
    let location = location.into();
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location.clone()))
        .json(RedirectResponse { location })
}

fn media_url(path: &str) -> String {
    StoredMedia {
        path: path.to_string(),
    }
    .url()
}

pub fn author(user: &User) -> AuthorResponse {
    AuthorResponse {
        id: user.id.to_string(),
        username: user.username.clone(),
    }
}

pub fn user(user: &User) -> UserResponse {
    UserResponse {
        id: user.id.to_string(),
        username: user.username.clone(),
        email: user.email.clone(),
        is_staff: user.is_staff,
        created_at: user.created_at.to_rfc3339(),
    }
}

pub fn category(category: &Category) -> CategoryResponse {
    CategoryResponse {
        id: category.id,
        name: category.name.clone(),
        slug: category.slug.clone(),
        url: category.absolute_url(),
    }
}

pub fn tag(tag: &Tag) -> TagResponse {
    TagResponse {
        id: tag.id,
        name: tag.name.clone(),
        slug: tag.slug.clone(),
        url: tag.absolute_url(),
    }
}

pub fn sidebar(sidebar: &Sidebar) -> SidebarResponse {
    SidebarResponse {
        categories: sidebar
            .categories
            .iter()
            .map(|c| CategoryCountResponse {
                name: c.category.name.clone(),
                slug: c.category.slug.clone(),
                url: c.category.absolute_url(),
                post_count: c.post_count,
            })
            .collect(),
        uncategorized_count: sidebar.uncategorized_count,
        uncategorized_url: format!("/posts/category/{UNCATEGORIZED_SLUG}"),
    }
}

fn attachment(post: &Post) -> Option<AttachmentResponse> {
    let path = post.file_upload.as_deref()?;
    Some(AttachmentResponse {
        path: path.to_string(),
        url: media_url(path),
        name: post.file_name().unwrap_or(path).to_string(),
        extension: post.file_ext().map(str::to_string),
    })
}

pub fn post(entry: &PostEntry) -> PostResponse {
    let post = &entry.post;
    PostResponse {
        id: post.id,
        title: post.title.clone(),
        hook_text: post.hook_text.clone(),
        content: post.content.clone(),
        head_image_url: post.head_image.as_deref().map(media_url),
        attachment: attachment(post),
        url: post.absolute_url(),
        created_at: post.created_at.to_rfc3339(),
        updated_at: post.updated_at.to_rfc3339(),
        author: entry.author.as_ref().map(author),
        category: entry.category.as_ref().map(category),
        tags: entry.tags.iter().map(tag).collect(),
    }
}

pub fn listing(listing: &PostListing) -> PostListResponse {
    let heading = match &listing.heading {
        ListHeading::All => ListHeadingResponse::All,
        ListHeading::Uncategorized => ListHeadingResponse::Uncategorized {
            label: UNCATEGORIZED_LABEL.to_string(),
        },
        ListHeading::Category(c) => ListHeadingResponse::Category(category(c)),
        ListHeading::Tag(t) => ListHeadingResponse::Tag(tag(t)),
    };

    PostListResponse {
        heading,
        posts: listing.posts.iter().map(post).collect(),
        sidebar: sidebar(&listing.sidebar),
    }
}

pub fn comment(comment: &Comment, author_user: Option<&User>) -> CommentResponse {
    CommentResponse {
        id: comment.id,
        post_id: comment.post_id,
        content: comment.content.clone(),
        author: author_user.map(author),
        anchor: comment.anchor(),
        url: comment.absolute_url(),
        created_at: comment.created_at.to_rfc3339(),
        updated_at: comment.updated_at.to_rfc3339(),
    }
}

pub fn detail(detail: &PostDetail) -> PostDetailResponse {
    PostDetailResponse {
        post: post(&detail.entry),
        comments: detail
            .comments
            .iter()
            .map(|CommentEntry { comment: c, author }| comment(c, author.as_ref()))
            .collect(),
        sidebar: sidebar(&detail.sidebar),
        comment_form: CommentForm {
            content: detail.comment_form.content.clone(),
        },
    }
}

pub fn post_form(input: &PostInput) -> PostForm {
    let draft = &input.draft;
    PostForm {
        title: draft.title.clone(),
        hook_text: draft.hook_text.clone(),
        content: draft.content.clone(),
        head_image: draft.head_image.clone(),
        file_upload: draft.file_upload.clone(),
        category: draft.category_id,
        tags_str: input.tags_str.clone(),
    }
}

pub fn post_input(form: PostForm) -> PostInput {
    PostInput {
        draft: PostDraft {
            title: form.title,
            hook_text: form.hook_text,
            content: form.content,
            head_image: form.head_image,
            file_upload: form.file_upload,
            category_id: form.category,
        },
        tags_str: form.tags_str,
    }
}

pub fn post_form_page(page: &PostFormPage) -> PostFormResponse {
    PostFormResponse {
        post_id: page.post_id,
        form: post_form(&page.input),
        categories: page.categories.iter().map(category).collect(),
        errors: Vec::new(),
    }
}

/// The post form as submitted, for re-presenting after a rejection.
pub fn rejected_post_form(
    post_id: Option<i64>,
    form: PostForm,
    categories: &[Category],
) -> PostFormResponse {
    PostFormResponse {
        post_id,
        form,
        categories: categories.iter().map(category).collect(),
        errors: Vec::new(),
    }
}

pub fn comment_form(comment_id: Option<i64>, post_id: i64, content: &str) -> CommentFormResponse {
    CommentFormResponse {
        comment_id,
        post_id,
        form: CommentForm {
            content: content.to_string(),
        },
        errors: Vec::new(),
    }
}

pub fn comment_input(form: CommentForm) -> CommentInput {
    CommentInput {
        content: form.content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_post(file_upload: Option<&str>) -> Post {
        let now = Utc::now();
        Post {
            id: 7,
            title: "Hello".into(),
            hook_text: None,
            content: "World".into(),
            head_image: Some("blog/images/2024/01/02/a.png".into()),
            file_upload: file_upload.map(str::to_string),
            created_at: now,
            updated_at: now,
            author_id: None,
            category_id: None,
        }
    }

    #[test]
    fn post_urls_point_at_media_and_detail() {
        let entry = PostEntry {
            post: sample_post(Some("blog/files/2024/01/02/report.pdf")),
            author: None,
            category: None,
            tags: Vec::new(),
        };

        let body = post(&entry);
        assert_eq!(body.url, "/posts/7");
        assert_eq!(
            body.head_image_url.as_deref(),
            Some("/media/blog/images/2024/01/02/a.png")
        );
        let file = body.attachment.unwrap();
        assert_eq!(file.name, "report.pdf");
        assert_eq!(file.extension.as_deref(), Some("pdf"));
    }

    #[test]
    fn uncategorized_heading_carries_label() {
        let body = listing(&PostListing {
            heading: ListHeading::Uncategorized,
            posts: Vec::new(),
            sidebar: Sidebar::default(),
        });

        assert_eq!(
            body.heading,
            ListHeadingResponse::Uncategorized {
                label: "Uncategorized".into(),
            }
        );
        assert_eq!(body.sidebar.uncategorized_url, "/posts/category/no_category");
    }

    #[test]
    fn form_round_trips_through_input() {
        let form = PostForm {
            title: "T".into(),
            content: "C".into(),
            category: Some(3),
            tags_str: "a; b".into(),
            ..PostForm::default()
        };

        assert_eq!(post_form(&post_input(form.clone())), form);
    }

    #[test]
    fn see_other_sets_location() {
        let res = see_other("/posts/7#comment-3");
        assert_eq!(res.status(), actix_web::http::StatusCode::SEE_OTHER);
        assert_eq!(
            res.headers().get(header::LOCATION).unwrap(),
            "/posts/7#comment-3"
        );
    }
}
