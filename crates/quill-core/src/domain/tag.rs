use serde::{Deserialize, Serialize};

pub type TagId = i64;

pub const TAG_NAME_MAX: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub slug: String,
}

impl Tag {
    pub fn absolute_url(&self) -> String {
        format!("/posts/tag/{}", self.slug)
    }
}

/// A tag that has not been persisted yet. The slug is always assigned
/// before the tag reaches storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTag {
    pub name: String,
    pub slug: String,
}
