//! Tag normalizer: free-text tag strings to canonical tag records.

use std::borrow::Cow;

use validator::{ValidateLength, ValidationError};

use crate::domain::{NewTag, PostId, TAG_NAME_MAX, Tag};
use crate::error::{DomainError, RepoError};
use crate::ports::{PostRepository, TagRepository};

use super::slugs::{slug_candidate, slugify_name};

/// Separator used when a post's tags are written back into a form.
pub const TAG_JOINER: &str = "; ";

/// How many times a lost insert race is retried before giving up.
const INSERT_ATTEMPTS: usize = 3;

/// Outcome of a lookup-or-create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagResolution {
    Existing(Tag),
    Created(Tag),
}

impl TagResolution {
    pub fn tag(&self) -> &Tag {
        match self {
            TagResolution::Existing(tag) | TagResolution::Created(tag) => tag,
        }
    }

    pub fn into_tag(self) -> Tag {
        match self {
            TagResolution::Existing(tag) | TagResolution::Created(tag) => tag,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, TagResolution::Created(_))
    }
}

/// Split a raw tag string on `,` and `;` into trimmed, de-duplicated names.
///
/// Order of first appearance is kept; empty tokens are skipped.
pub fn parse_tag_names(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Vec::new();
    }

    let mut names: Vec<String> = Vec::new();
    for token in raw.replace(',', ";").split(';') {
        let name = token.trim();
        if name.is_empty() || names.iter().any(|n| n == name) {
            continue;
        }
        names.push(name.to_string());
    }
    names
}

/// Reject a tag string holding a name longer than the tag column.
pub fn validate_tag_names(raw: &str) -> Result<(), ValidationError> {
    let too_long = parse_tag_names(raw)
        .into_iter()
        .find(|name| !name.validate_length(None, Some(TAG_NAME_MAX as u64), None));

    match too_long {
        None => Ok(()),
        Some(name) => {
            let mut error = ValidationError::new("length");
            error.message = Some(Cow::from(format!(
                "Ensure each tag has at most {TAG_NAME_MAX} characters."
            )));
            error.add_param(Cow::from("value"), &name);
            Err(error)
        }
    }
}

/// Tag names joined back into the form representation.
pub fn join_tag_names(tags: &[Tag]) -> String {
    tags.iter()
        .map(|t| t.name.as_str())
        .collect::<Vec<_>>()
        .join(TAG_JOINER)
}

/// First free slug derived from `name`.
pub async fn unique_tag_slug<S>(store: &S, name: &str) -> Result<String, RepoError>
where
    S: TagRepository + ?Sized,
{
    let base = slugify_name(name);
    let mut attempt = 0;
    loop {
        let candidate = slug_candidate(&base, attempt);
        if !store.tag_slug_exists(&candidate).await? {
            return Ok(candidate);
        }
        attempt += 1;
    }
}

/// Reuse the tag named exactly `name`, or create it with a fresh slug.
pub async fn resolve_tag<S>(store: &S, name: &str) -> Result<TagResolution, DomainError>
where
    S: TagRepository + ?Sized,
{
    for _ in 0..INSERT_ATTEMPTS {
        if let Some(tag) = store.find_tag_by_name(name).await? {
            return Ok(TagResolution::Existing(tag));
        }

        let slug = unique_tag_slug(store, name).await?;
        let new_tag = NewTag {
            name: name.to_string(),
            slug,
        };

        if let Some(tag) = store.insert_tag_if_absent(new_tag).await? {
            tracing::info!(tag = %tag.name, slug = %tag.slug, "Created tag");
            return Ok(TagResolution::Created(tag));
        }

        // Someone else took the slug between the check and the insert.
        tracing::debug!(tag = %name, "Tag insert lost a race, retrying");
    }

    Err(DomainError::Conflict(format!(
        "could not allocate a slug for tag '{name}'"
    )))
}

/// Resolve every tag in `raw` and link it to the post.
pub async fn assign_tags<S>(
    store: &S,
    post_id: PostId,
    raw: &str,
) -> Result<Vec<TagResolution>, DomainError>
where
    S: TagRepository + PostRepository + ?Sized,
{
    let mut resolved = Vec::new();
    for name in parse_tag_names(raw) {
        let resolution = resolve_tag(store, &name).await?;
        store.add_post_tag(post_id, resolution.tag().id).await?;
        resolved.push(resolution);
    }
    Ok(resolved)
}

/// Make the post's tag set exactly the tags parsed from `raw`.
pub async fn replace_tags<S>(
    store: &S,
    post_id: PostId,
    raw: &str,
) -> Result<Vec<TagResolution>, DomainError>
where
    S: TagRepository + PostRepository + ?Sized,
{
    store.clear_post_tags(post_id).await?;
    assign_tags(store, post_id, raw).await
}
