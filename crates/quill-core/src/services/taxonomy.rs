//! Category and tag administration.

use std::sync::Arc;

use validator::Validate;

use crate::domain::{Actor, Category, NewCategory, NewTag, Tag, UNCATEGORIZED_SLUG};
use crate::error::DomainError;
use crate::ports::TransactionalStore;

use super::guard::require_staff;
use super::sidebar::{Sidebar, load_sidebar};
use super::slugs::slugify_name;
use super::tagging::unique_tag_slug;

/// Submitted category or tag form. A missing slug is derived from the name.
///
/// Category and tag names share the same column size.
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct TaxonomyInput {
    #[validate(custom(function = "crate::validation::validate_required"))]
    #[validate(length(
        max = 50,
        message = "Ensure this value has at most 50 characters."
    ))]
    pub name: String,
    #[validate(custom(function = "crate::validation::validate_slug"))]
    pub slug: Option<String>,
}

impl TaxonomyInput {
    /// Trimmed and checked; a blank slug counts as missing.
    fn validated(self) -> Result<(String, Option<String>), DomainError> {
        let input = Self {
            name: self.name.trim().to_string(),
            slug: self
                .slug
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        };
        input.validate()?;
        Ok((input.name, input.slug))
    }
}

#[derive(Clone)]
pub struct TaxonomyService {
    store: Arc<dyn TransactionalStore>,
}

impl TaxonomyService {
    pub fn new(store: Arc<dyn TransactionalStore>) -> Self {
        Self { store }
    }

    /// Categories with their post counts.
    pub async fn categories(&self) -> Result<Sidebar, DomainError> {
        load_sidebar(&*self.store).await
    }

    pub async fn tags(&self) -> Result<Vec<Tag>, DomainError> {
        Ok(self.store.list_tags().await?)
    }

    /// Create a category. Name and slug must both be unused. Staff only.
    pub async fn create_category(
        &self,
        actor: Option<&Actor>,
        input: TaxonomyInput,
    ) -> Result<Category, DomainError> {
        let actor = require_staff(actor)?;
        let (name, slug) = input.validated()?;

        let slug = slug.unwrap_or_else(|| slugify_name(&name));
        if slug == UNCATEGORIZED_SLUG {
            return Err(DomainError::invalid("slug", "This slug is reserved."));
        }

        let tx = self.store.begin().await?;
        if tx.find_category_by_name(&name).await?.is_some() {
            return Err(DomainError::Conflict(format!(
                "category with name '{name}' already exists"
            )));
        }
        if tx.find_category_by_slug(&slug).await?.is_some() {
            return Err(DomainError::Conflict(format!(
                "category with slug '{slug}' already exists"
            )));
        }

        let category = tx.insert_category(NewCategory { name, slug }).await?;
        tx.commit().await?;

        tracing::info!(category = %category.slug, user_id = %actor.user_id, "Created category");
        Ok(category)
    }

    /// Delete a category; its posts become uncategorized. Staff only.
    pub async fn delete_category(
        &self,
        actor: Option<&Actor>,
        slug: &str,
    ) -> Result<Category, DomainError> {
        let actor = require_staff(actor)?;

        let tx = self.store.begin().await?;
        let category = tx
            .find_category_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::not_found("category", slug))?;
        tx.delete_category(category.id).await?;
        tx.commit().await?;

        tracing::info!(category = %category.slug, user_id = %actor.user_id, "Deleted category");
        Ok(category)
    }

    /// Create a tag outside of a post. Without a slug one is synthesized
    /// from the name; an explicit slug must be unused. Staff only.
    pub async fn create_tag(
        &self,
        actor: Option<&Actor>,
        input: TaxonomyInput,
    ) -> Result<Tag, DomainError> {
        let actor = require_staff(actor)?;
        let (name, slug) = input.validated()?;

        let tx = self.store.begin().await?;
        let slug = match slug {
            Some(slug) => slug,
            None => unique_tag_slug(&*tx, &name).await?,
        };

        let tag = tx
            .insert_tag_if_absent(NewTag {
                name,
                slug: slug.clone(),
            })
            .await?
            .ok_or_else(|| {
                DomainError::Conflict(format!("tag with slug '{slug}' already exists"))
            })?;
        tx.commit().await?;

        tracing::info!(tag = %tag.slug, user_id = %actor.user_id, "Created tag");
        Ok(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CATEGORY_NAME_MAX, TAG_NAME_MAX};

    fn input(name: &str, slug: Option<&str>) -> TaxonomyInput {
        TaxonomyInput {
            name: name.into(),
            slug: slug.map(String::from),
        }
    }

    fn fields(err: DomainError) -> Vec<String> {
        match err {
            DomainError::Validation(errors) => errors.iter().map(|e| e.field.clone()).collect(),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn blank_slug_is_missing() {
        let (name, slug) = input("  Web  ", Some("  ")).validated().unwrap();
        assert_eq!(name, "Web");
        assert_eq!(slug, None);
    }

    #[test]
    fn name_and_slug_are_checked_together() {
        let err = input(" ", Some("Not A Slug")).validated().unwrap_err();
        assert_eq!(fields(err), ["name", "slug"]);
    }

    #[test]
    fn name_cap_fits_both_columns() {
        assert_eq!(CATEGORY_NAME_MAX, TAG_NAME_MAX);
        assert!(input(&"n".repeat(TAG_NAME_MAX), None).validated().is_ok());

        let long = "n".repeat(TAG_NAME_MAX + 1);
        let err = input(&long, None).validated().unwrap_err();
        assert_eq!(fields(err), ["name"]);
    }
}
