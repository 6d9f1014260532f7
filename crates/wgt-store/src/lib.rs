//! Asynchronous key-value persistence for the Widgetify dashboard.
//!
//! This crate is the leaf of the dashboard stack: every domain provider reads
//! its persisted value from, and writes changes back to, a [`KeyValueStore`].
//! Values are JSON documents identified by string keys, the same model as a
//! browser extension's `storage.local`.
//!
//! # Storage Backends
//!
//! All backends implement the [`KeyValueStore`] trait:
//!
//! - [`InMemoryStore`] -- `HashMap`-based store for tests and embedding
//! - [`FileStore`] -- a single JSON object on disk, replaced atomically on write
//!
//! # Design Rules
//!
//! 1. No transactional guarantees across keys.
//! 2. A JSON `null` is indistinguishable from an absent key.
//! 3. Typed reads treat undecodable values as absent ([`typed::get`]).
//! 4. All I/O errors are propagated, never retried.

pub mod error;
pub mod file;
pub mod memory;
pub mod traits;
pub mod typed;

pub use error::{StoreError, StoreResult};
pub use file::FileStore;
pub use memory::InMemoryStore;
pub use traits::KeyValueStore;
