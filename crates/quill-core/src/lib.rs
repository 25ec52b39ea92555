//! # Quill Core
//!
//! The domain layer of the Quill blog.
//! This crate contains the content model, the tag normalizer, the ownership
//! guard and the request flows built on them, with zero infrastructure
//! dependencies.

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;
pub mod validation;

pub use error::{DomainError, RepoError};
