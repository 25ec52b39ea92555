use serde::{Deserialize, Serialize};

pub type CategoryId = i64;

/// Slug reserved for the "posts without a category" listing.
pub const UNCATEGORIZED_SLUG: &str = "no_category";

/// Display label for posts without a category.
pub const UNCATEGORIZED_LABEL: &str = "Uncategorized";

pub const CATEGORY_NAME_MAX: usize = 50;
pub const CATEGORY_SLUG_MAX: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
}

impl Category {
    pub fn absolute_url(&self) -> String {
        format!("/posts/category/{}", self.slug)
    }
}

/// A category that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
}

/// Category together with the number of posts filed under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: Category,
    pub post_count: u64,
}
