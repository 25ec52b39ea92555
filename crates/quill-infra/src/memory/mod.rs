//! In-memory implementations.

mod store;

pub use store::{
    InMemoryStore, InMemoryTransaction, MemoryState, MemoryStore, Pending, Scope, Shared,
};
