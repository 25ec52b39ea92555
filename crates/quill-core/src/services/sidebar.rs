//! Category navigation attached to every list and detail page.

use std::collections::HashMap;

use serde::Serialize;

use crate::domain::CategoryCount;
use crate::error::DomainError;
use crate::ports::{CategoryRepository, PostRepository};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Sidebar {
    /// Every category ordered by name, including empty ones.
    pub categories: Vec<CategoryCount>,
    pub uncategorized_count: u64,
}

/// Read-only aggregation over categories and posts.
pub async fn load_sidebar<S>(store: &S) -> Result<Sidebar, DomainError>
where
    S: CategoryRepository + PostRepository + ?Sized,
{
    let counts: HashMap<_, _> = store.category_post_counts().await?.into_iter().collect();
    let categories = store
        .list_categories()
        .await?
        .into_iter()
        .map(|category| CategoryCount {
            post_count: counts.get(&category.id).copied().unwrap_or(0),
            category,
        })
        .collect();

    Ok(Sidebar {
        categories,
        uncategorized_count: store.count_uncategorized().await?,
    })
}
