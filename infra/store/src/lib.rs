//! An embedded key-value store that keeps every value in its own file.
//!
//! Keys are `/`-separated strings (`orders/new/1000`) mapped onto a directory tree below a
//! configured root, so the data stays human-readable and inspectable with ordinary tools.
//! All examples use temporary directories to avoid writing to the real filesystem.
//!
//! # Core Features
//!
//! - **Sandbox Security**: keys with `.`/`..` segments are rejected, and every resolved
//!   path is checked to lie inside the root.
//! - **Atomic Writes**: records are written to a unique temporary file, synced, and renamed
//!   into place. Moves are a single rename.
//! - **Tidy Tree**: parent directories are created on write and pruned as soon as their
//!   last record is moved away or deleted.
//! - **Per-Instance Locking**: one readers-writer lock per store; independent stores never
//!   contend.
//! - **Self-Healing**: stale temporary files from interrupted writes are purged on open.
//!
//! # Architectural Overview
//!
//! 1.  **[`Store`]**: the thread-safe handle and entry point.
//! 2.  **[`StoreBuilder`]**: fluent configuration, also fed from a [`StoreConfig`].
//! 3.  **[`Codec`]**: the pluggable value encoding; [`JsonCodec`] by default.
//!
//! # Examples
//!
//! ```rust
//! use fskv_store::{Store, StoreError};
//!
//! fn main() -> Result<(), StoreError> {
//!     # let tmp = tempfile::tempdir().unwrap();
//!     # let root = tmp.path().join("data");
//!     let store = Store::builder().root(&root).open()?;
//!
//!     store.put("orders/new/1", &vec!["one", "two"])?;
//!     store.put("orders/new/2", &vec!["three"])?;
//!     store.put("orders/done/1", &vec!["four"])?;
//!
//!     let mut fresh = store.keys("orders/new")?;
//!     fresh.sort();
//!     assert_eq!(fresh, ["orders/new/1", "orders/new/2"]);
//!
//!     let items: Vec<String> = store.get("orders/done/1")?;
//!     assert_eq!(items, ["four"]);
//!     Ok(())
//! }
//! ```
//!
//! ```rust
//! # use fskv_store::{Store, StoreConfig, StoreError};
//! # fn run() -> Result<(), StoreError> {
//! # let tmp = tempfile::tempdir().unwrap();
//! // Settings from `store.toml`, overridden by `FSKV__ROOT` and friends.
//! let mut config = StoreConfig::load(None::<&str>)?;
//! # config.root = tmp.path().join("data");
//! let store = Store::builder().config(&config).open()?;
//!
//! let missing = store.delete("missing/key").err();
//! assert!(missing.is_some_and(|e| e.is_not_found()));
//! # Ok(())
//! # }
//! # run().unwrap();
//! ```

mod builder;
mod codec;
mod config;
mod engine;
mod error;
mod maintenance;
mod security;

pub use builder::{DEFAULT_ROOT, StoreBuilder};
pub use codec::{Codec, JsonCodec};
pub use crate::config::{ENV_PREFIX, StoreConfig};
pub use engine::{Store, StoreInner};
pub use error::{BoxError, StoreError, StoreErrorExt};
pub use maintenance::{Cleanup, PruneFailure, PurgeReport};
