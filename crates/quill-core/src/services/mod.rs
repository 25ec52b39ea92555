//! Use cases composed over the ports.

mod comments;
pub mod guard;
mod posts;
mod sidebar;
pub mod slugs;
pub mod tagging;
mod taxonomy;

pub use comments::CommentService;
pub use posts::{
    CommentEntry, CommentInput, ListHeading, PostDetail, PostEntry, PostFilter, PostFormPage,
    PostInput, PostListing, PostService, SavedPost,
};
pub use sidebar::{Sidebar, load_sidebar};
pub use tagging::TagResolution;
pub use taxonomy::{TaxonomyInput, TaxonomyService};
