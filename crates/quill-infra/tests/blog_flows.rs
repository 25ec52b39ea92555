//! End-to-end service flows over the in-memory store.

use std::collections::BTreeSet;
use std::sync::Arc;

use quill_core::domain::{Actor, PostDraft, User};
use quill_core::error::DomainError;
use quill_core::ports::{
    CategoryRepository, CommentRepository, PostRepository, TagRepository, TransactionalStore,
    UserRepository,
};
use quill_core::services::{
    CommentInput, CommentService, ListHeading, PostFilter, PostInput, PostService, TaxonomyInput,
    TaxonomyService,
};
use quill_infra::InMemoryStore;

struct Blog {
    store: Arc<InMemoryStore>,
    posts: PostService,
    comments: CommentService,
    taxonomy: TaxonomyService,
}

impl Blog {
    fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let shared: Arc<dyn TransactionalStore> = store.clone();
        Self {
            posts: PostService::new(shared.clone()),
            comments: CommentService::new(shared.clone()),
            taxonomy: TaxonomyService::new(shared),
            store,
        }
    }

    async fn user(&self, name: &str) -> Actor {
        self.store
            .insert_user(User::new(
                name.to_string(),
                format!("{name}@example.com"),
                "hash".to_string(),
            ))
            .await
            .unwrap()
            .actor()
    }

    async fn staff(&self, name: &str) -> Actor {
        self.store
            .insert_user(
                User::new(
                    name.to_string(),
                    format!("{name}@example.com"),
                    "hash".to_string(),
                )
                .with_staff(true),
            )
            .await
            .unwrap()
            .actor()
    }
}

fn input(title: &str, tags: &str) -> PostInput {
    PostInput {
        draft: PostDraft {
            title: title.to_string(),
            content: "Some content".to_string(),
            ..Default::default()
        },
        tags_str: tags.to_string(),
    }
}

fn category(name: &str) -> TaxonomyInput {
    TaxonomyInput {
        name: name.to_string(),
        slug: None,
    }
}

fn comment(content: &str) -> CommentInput {
    CommentInput {
        content: content.to_string(),
    }
}

#[tokio::test]
async fn mixed_delimiters_create_three_tags_with_unique_slugs() {
    let blog = Blog::new();
    let alice = blog.user("alice").await;

    let saved = blog
        .posts
        .create(Some(&alice), input("Tagged", "news, django ; web"))
        .await
        .unwrap();

    let names: Vec<_> = saved.tags.iter().map(|t| t.tag().name.clone()).collect();
    assert_eq!(names, vec!["news", "django", "web"]);
    assert!(saved.tags.iter().all(|t| t.is_created()));

    let slugs: BTreeSet<_> = saved.tags.iter().map(|t| t.tag().slug.clone()).collect();
    assert_eq!(slugs.len(), 3);
    assert!(slugs.iter().all(|s| !s.is_empty()));

    assert_eq!(blog.store.post_tags(saved.post.id).await.unwrap().len(), 3);
}

#[tokio::test]
async fn delimiter_order_does_not_change_the_tag_set() {
    let blog = Blog::new();
    let alice = blog.user("alice").await;

    for raw in ["a,b;c", "a;b;c", "a;b,c"] {
        let saved = blog
            .posts
            .create(Some(&alice), input("Split", raw))
            .await
            .unwrap();
        let names: BTreeSet<_> = blog
            .store
            .post_tags(saved.post.id)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, BTreeSet::from(["a".into(), "b".into(), "c".into()]));
    }

    // the second and third posts reuse the tags made by the first
    assert_eq!(blog.store.list_tags().await.unwrap().len(), 3);
}

#[tokio::test]
async fn existing_tags_are_reused_by_name() {
    let blog = Blog::new();
    let alice = blog.user("alice").await;

    blog.posts
        .create(Some(&alice), input("First", "rust"))
        .await
        .unwrap();
    let second = blog
        .posts
        .create(Some(&alice), input("Second", "rust; async"))
        .await
        .unwrap();

    assert!(!second.tags[0].is_created());
    assert!(second.tags[1].is_created());
}

#[tokio::test]
async fn names_slugifying_alike_get_suffixed_slugs() {
    let blog = Blog::new();
    let alice = blog.user("alice").await;

    let saved = blog
        .posts
        .create(Some(&alice), input("Suffixes", "Web Dev; web-dev"))
        .await
        .unwrap();

    let slugs: Vec<_> = saved.tags.iter().map(|t| t.tag().slug.clone()).collect();
    assert_eq!(slugs, vec!["web-dev", "web-dev-1"]);
}

#[tokio::test]
async fn update_with_empty_tags_clears_them() {
    let blog = Blog::new();
    let alice = blog.user("alice").await;
    let saved = blog
        .posts
        .create(Some(&alice), input("Tagged", "one; two"))
        .await
        .unwrap();

    let updated = blog
        .posts
        .update(Some(&alice), saved.post.id, input("Tagged", ""))
        .await
        .unwrap();

    assert!(updated.tags.is_empty());
    assert!(blog.store.post_tags(saved.post.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn resubmitting_tags_is_idempotent() {
    let blog = Blog::new();
    let alice = blog.user("alice").await;
    let saved = blog
        .posts
        .create(Some(&alice), input("Tagged", "x; y"))
        .await
        .unwrap();

    for _ in 0..2 {
        blog.posts
            .update(Some(&alice), saved.post.id, input("Tagged", "y, z"))
            .await
            .unwrap();
    }

    let form = blog
        .posts
        .edit_form(Some(&alice), saved.post.id)
        .await
        .unwrap();
    assert_eq!(form.input.tags_str, "y; z");
}

#[tokio::test]
async fn invalid_post_is_not_persisted() {
    let blog = Blog::new();
    let alice = blog.user("alice").await;

    let err = blog
        .posts
        .create(Some(&alice), input("", "orphan-tag"))
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::Validation(_)));
    assert!(blog.store.list_tags().await.unwrap().is_empty());
    assert!(
        blog.posts
            .list(&PostFilter::All)
            .await
            .unwrap()
            .posts
            .is_empty()
    );
}

#[tokio::test]
async fn unknown_category_is_a_validation_error() {
    let blog = Blog::new();
    let alice = blog.user("alice").await;
    let mut post = input("Lost", "");
    post.draft.category_id = Some(999);

    let err = blog.posts.create(Some(&alice), post).await.unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
}

#[tokio::test]
async fn anonymous_post_creation_is_forbidden() {
    let blog = Blog::new();

    let err = blog
        .posts
        .create(None, input("Nope", ""))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden));
    assert!(matches!(
        blog.posts.new_form(None).await,
        Err(DomainError::Forbidden)
    ));
}

#[tokio::test]
async fn no_category_lists_exactly_uncategorized_posts() {
    let blog = Blog::new();
    let alice = blog.user("alice").await;
    let admin = blog.staff("admin").await;
    let rust = blog
        .taxonomy
        .create_category(Some(&admin), category("Rust"))
        .await
        .unwrap();

    let loose = blog
        .posts
        .create(Some(&alice), input("Loose", ""))
        .await
        .unwrap();
    let mut filed_input = input("Filed", "");
    filed_input.draft.category_id = Some(rust.id);
    let filed = blog.posts.create(Some(&alice), filed_input).await.unwrap();

    let uncategorized = blog
        .posts
        .list(&PostFilter::category("no_category"))
        .await
        .unwrap();
    assert_eq!(uncategorized.heading, ListHeading::Uncategorized);
    let ids: Vec<_> = uncategorized.posts.iter().map(|e| e.post.id).collect();
    assert_eq!(ids, vec![loose.post.id]);

    let by_category = blog
        .posts
        .list(&PostFilter::category(&rust.slug))
        .await
        .unwrap();
    assert_eq!(by_category.heading, ListHeading::Category(rust.clone()));
    let ids: Vec<_> = by_category.posts.iter().map(|e| e.post.id).collect();
    assert_eq!(ids, vec![filed.post.id]);

    assert_eq!(by_category.sidebar.uncategorized_count, 1);
    assert_eq!(by_category.sidebar.categories[0].post_count, 1);
}

#[tokio::test]
async fn tag_listing_and_unknown_slugs() {
    let blog = Blog::new();
    let alice = blog.user("alice").await;
    let saved = blog
        .posts
        .create(Some(&alice), input("Tagged", "web"))
        .await
        .unwrap();
    blog.posts
        .create(Some(&alice), input("Untagged", ""))
        .await
        .unwrap();

    let slug = saved.tags[0].tag().slug.clone();
    let listing = blog.posts.list(&PostFilter::tag(&slug)).await.unwrap();
    assert_eq!(listing.posts.len(), 1);
    assert_eq!(listing.posts[0].post.id, saved.post.id);

    assert!(matches!(
        blog.posts.list(&PostFilter::tag("missing")).await,
        Err(DomainError::NotFound { .. })
    ));
    assert!(matches!(
        blog.posts.list(&PostFilter::category("missing")).await,
        Err(DomainError::NotFound { .. })
    ));
}

#[tokio::test]
async fn non_owner_cannot_touch_a_post() {
    let blog = Blog::new();
    let alice = blog.user("alice").await;
    let mallory = blog.user("mallory").await;
    let saved = blog
        .posts
        .create(Some(&alice), input("Mine", "keep"))
        .await
        .unwrap();

    assert!(matches!(
        blog.posts
            .update(Some(&mallory), saved.post.id, input("Hijacked", ""))
            .await,
        Err(DomainError::Forbidden)
    ));
    assert!(matches!(
        blog.posts.delete(Some(&mallory), saved.post.id).await,
        Err(DomainError::Forbidden)
    ));
    assert!(matches!(
        blog.posts.edit_form(Some(&mallory), saved.post.id).await,
        Err(DomainError::Forbidden)
    ));

    let stored = blog.store.find_post(saved.post.id).await.unwrap().unwrap();
    assert_eq!(stored, saved.post);
    assert_eq!(blog.store.post_tags(saved.post.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn owner_can_delete_a_post_and_its_comments() {
    let blog = Blog::new();
    let alice = blog.user("alice").await;
    let saved = blog
        .posts
        .create(Some(&alice), input("Short lived", ""))
        .await
        .unwrap();
    let note = blog
        .comments
        .create(Some(&alice), saved.post.id, comment("bye"))
        .await
        .unwrap();

    blog.posts
        .delete(Some(&alice), saved.post.id)
        .await
        .unwrap();

    assert!(matches!(
        blog.posts.detail(saved.post.id).await,
        Err(DomainError::NotFound { .. })
    ));
    assert_eq!(blog.store.find_comment(note.id).await.unwrap(), None);
}

#[tokio::test]
async fn comment_redirect_points_at_its_anchor() {
    let blog = Blog::new();
    let alice = blog.user("alice").await;
    let saved = blog
        .posts
        .create(Some(&alice), input("Discuss", ""))
        .await
        .unwrap();

    let created = blog
        .comments
        .create(Some(&alice), saved.post.id, comment("  first!  "))
        .await
        .unwrap();

    assert_eq!(created.content, "first!");
    assert_eq!(created.author_id, alice.user_id);
    assert_eq!(
        created.absolute_url(),
        format!("/posts/{}#comment-{}", saved.post.id, created.id)
    );

    let detail = blog.posts.detail(saved.post.id).await.unwrap();
    assert_eq!(detail.comments.len(), 1);
    let author = detail.comments[0].author.as_ref();
    assert_eq!(author.map(|u| u.username.as_str()), Some("alice"));
    assert_eq!(detail.comment_form, CommentInput::default());
}

#[tokio::test]
async fn anonymous_comment_is_forbidden_and_not_stored() {
    let blog = Blog::new();
    let alice = blog.user("alice").await;
    let saved = blog
        .posts
        .create(Some(&alice), input("Quiet", ""))
        .await
        .unwrap();

    let err = blog
        .comments
        .create(None, saved.post.id, comment("drive-by"))
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::Forbidden));
    assert!(
        blog.store
            .comments_for_post(saved.post.id)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn comment_on_missing_post_is_not_found() {
    let blog = Blog::new();
    let alice = blog.user("alice").await;

    assert!(matches!(
        blog.comments
            .create(Some(&alice), 404, comment("hello?"))
            .await,
        Err(DomainError::NotFound { .. })
    ));
    assert!(matches!(
        blog.comments.target_post(Some(&alice), 404).await,
        Err(DomainError::NotFound { .. })
    ));
}

#[tokio::test]
async fn only_the_comment_author_may_edit_or_delete() {
    let blog = Blog::new();
    let alice = blog.user("alice").await;
    let bob = blog.user("bob").await;
    let saved = blog
        .posts
        .create(Some(&alice), input("Thread", ""))
        .await
        .unwrap();
    let reply = blog
        .comments
        .create(Some(&bob), saved.post.id, comment("original"))
        .await
        .unwrap();

    // the post's author does not own bob's comment
    assert!(matches!(
        blog.comments
            .update(Some(&alice), reply.id, comment("edited by alice"))
            .await,
        Err(DomainError::Forbidden)
    ));
    assert!(matches!(
        blog.comments.delete(Some(&alice), reply.id).await,
        Err(DomainError::Forbidden)
    ));
    let stored = blog.store.find_comment(reply.id).await.unwrap().unwrap();
    assert_eq!(stored.content, "original");

    let edited = blog
        .comments
        .update(Some(&bob), reply.id, comment("edited"))
        .await
        .unwrap();
    assert_eq!(edited.content, "edited");

    let removed = blog.comments.delete(Some(&bob), reply.id).await.unwrap();
    assert_eq!(removed.post_id, saved.post.id);
    assert_eq!(blog.store.find_comment(reply.id).await.unwrap(), None);
}

#[tokio::test]
async fn duplicate_category_conflicts_without_a_second_record() {
    let blog = Blog::new();
    let admin = blog.staff("admin").await;

    blog.taxonomy
        .create_category(Some(&admin), category("Programming"))
        .await
        .unwrap();

    let by_name = blog
        .taxonomy
        .create_category(Some(&admin), category("Programming"))
        .await;
    assert!(matches!(by_name, Err(DomainError::Conflict(_))));

    let by_slug = blog
        .taxonomy
        .create_category(
            Some(&admin),
            TaxonomyInput {
                name: "Coding".to_string(),
                slug: Some("programming".to_string()),
            },
        )
        .await;
    assert!(matches!(by_slug, Err(DomainError::Conflict(_))));

    assert_eq!(blog.store.list_categories().await.unwrap().len(), 1);
}

#[tokio::test]
async fn category_management_is_staff_only() {
    let blog = Blog::new();
    let alice = blog.user("alice").await;

    assert!(matches!(
        blog.taxonomy
            .create_category(Some(&alice), category("Mine"))
            .await,
        Err(DomainError::Forbidden)
    ));
    assert!(matches!(
        blog.taxonomy.create_category(None, category("Mine")).await,
        Err(DomainError::Forbidden)
    ));
    assert!(matches!(
        blog.taxonomy
            .create_tag(Some(&alice), category("tag"))
            .await,
        Err(DomainError::Forbidden)
    ));
}

#[tokio::test]
async fn reserved_category_slug_is_rejected() {
    let blog = Blog::new();
    let admin = blog.staff("admin").await;

    let err = blog
        .taxonomy
        .create_category(
            Some(&admin),
            TaxonomyInput {
                name: "Nothing".to_string(),
                slug: Some("no_category".to_string()),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
}

#[tokio::test]
async fn deleting_a_category_leaves_its_posts_uncategorized() {
    let blog = Blog::new();
    let alice = blog.user("alice").await;
    let admin = blog.staff("admin").await;
    let news = blog
        .taxonomy
        .create_category(Some(&admin), category("News"))
        .await
        .unwrap();
    let mut filed = input("Filed", "");
    filed.draft.category_id = Some(news.id);
    let saved = blog.posts.create(Some(&alice), filed).await.unwrap();

    blog.taxonomy
        .delete_category(Some(&admin), &news.slug)
        .await
        .unwrap();

    let post = blog.store.find_post(saved.post.id).await.unwrap().unwrap();
    assert_eq!(post.category_id, None);
    let listing = blog.posts.list(&PostFilter::Uncategorized).await.unwrap();
    assert_eq!(listing.posts.len(), 1);
    assert!(listing.sidebar.categories.is_empty());
}

#[tokio::test]
async fn explicit_tag_slug_collision_conflicts() {
    let blog = Blog::new();
    let admin = blog.staff("admin").await;

    let first = blog
        .taxonomy
        .create_tag(Some(&admin), category("Rust Lang"))
        .await
        .unwrap();
    assert_eq!(first.slug, "rust-lang");

    let clash = blog
        .taxonomy
        .create_tag(
            Some(&admin),
            TaxonomyInput {
                name: "Other".to_string(),
                slug: Some("rust-lang".to_string()),
            },
        )
        .await;
    assert!(matches!(clash, Err(DomainError::Conflict(_))));
    assert_eq!(blog.taxonomy.tags().await.unwrap().len(), 1);
}

#[tokio::test]
async fn deleting_a_user_orphans_posts_and_drops_comments() {
    let blog = Blog::new();
    let alice = blog.user("alice").await;
    let bob = blog.user("bob").await;
    let saved = blog
        .posts
        .create(Some(&alice), input("Legacy", ""))
        .await
        .unwrap();
    blog.comments
        .create(Some(&alice), saved.post.id, comment("mine"))
        .await
        .unwrap();
    blog.comments
        .create(Some(&bob), saved.post.id, comment("bob's"))
        .await
        .unwrap();

    blog.store.delete_user(alice.user_id).await.unwrap();

    let detail = blog.posts.detail(saved.post.id).await.unwrap();
    assert_eq!(detail.entry.post.author_id, None);
    assert!(detail.entry.author.is_none());
    assert_eq!(detail.comments.len(), 1);
    assert_eq!(detail.comments[0].comment.author_id, bob.user_id);

    // an authorless post can no longer be edited by anyone
    assert!(matches!(
        blog.posts.delete(Some(&alice), saved.post.id).await,
        Err(DomainError::Forbidden)
    ));
}

fn invalid_fields(err: DomainError) -> Vec<String> {
    match err {
        DomainError::Validation(errors) => errors.iter().map(|e| e.field.clone()).collect(),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn over_long_tag_names_are_rejected_before_any_write() {
    let blog = Blog::new();
    let alice = blog.user("alice").await;
    let long = "t".repeat(60);

    let err = blog
        .posts
        .create(Some(&alice), input("Long", &format!("ok; {long}")))
        .await
        .unwrap_err();
    assert_eq!(invalid_fields(err), ["tags_str"]);
    assert!(blog.store.list_tags().await.unwrap().is_empty());

    let saved = blog
        .posts
        .create(Some(&alice), input("Short", "keep"))
        .await
        .unwrap();
    let err = blog
        .posts
        .update(Some(&alice), saved.post.id, input("Short", &long))
        .await
        .unwrap_err();
    assert_eq!(invalid_fields(err), ["tags_str"]);

    let tags = blog.store.post_tags(saved.post.id).await.unwrap();
    let names: Vec<_> = tags.into_iter().map(|t| t.name).collect();
    assert_eq!(names, ["keep"]);
}

#[tokio::test]
async fn over_long_staff_tag_name_is_rejected() {
    let blog = Blog::new();
    let admin = blog.staff("admin").await;

    let err = blog
        .taxonomy
        .create_tag(Some(&admin), category(&"n".repeat(51)))
        .await
        .unwrap_err();
    assert_eq!(invalid_fields(err), ["name"]);
    assert!(blog.taxonomy.tags().await.unwrap().is_empty());
}

#[tokio::test]
async fn deleted_account_cannot_write() {
    let blog = Blog::new();
    let alice = blog.user("alice").await;
    let bob = blog.user("bob").await;
    let saved = blog
        .posts
        .create(Some(&bob), input("Open", ""))
        .await
        .unwrap();

    blog.store.delete_user(alice.user_id).await.unwrap();

    assert!(matches!(
        blog.posts.create(Some(&alice), input("Ghost", "boo")).await,
        Err(DomainError::Forbidden)
    ));
    assert!(matches!(
        blog.comments
            .create(Some(&alice), saved.post.id, comment("boo"))
            .await,
        Err(DomainError::Forbidden)
    ));
    assert!(blog.store.list_tags().await.unwrap().is_empty());
    assert!(
        blog.store
            .comments_for_post(saved.post.id)
            .await
            .unwrap()
            .is_empty()
    );
}
