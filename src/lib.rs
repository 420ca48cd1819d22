//! jsondb - a minimal embedded record store backed by one JSON file
//!
//! A [`RecordStore`](store::RecordStore) keeps a homogeneous table of
//! records in memory and persists it as a single JSON array, rewriting the
//! whole document on every mutation.
//!
//! ```no_run
//! use jsondb::store::RecordStore;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Clone, Serialize, Deserialize)]
//! struct User {
//!     id: u32,
//!     name: String,
//! }
//!
//! let store: RecordStore<User> = RecordStore::connect("users.json")?;
//! store.init()?;
//! store.append(User { id: 1, name: "u1".into() })?;
//! let users = store.read_all()?;
//! store.close()?;
//! # Ok::<(), jsondb::store::StoreError>(())
//! ```

pub mod cli;
pub mod observability;
pub mod store;
