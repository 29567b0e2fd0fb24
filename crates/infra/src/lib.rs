//! Infrastructure layer: implementations of the storage ports declared in
//! `recipebook-core`.

pub mod store;

pub use store::InMemoryStore;
