//! Context store implementations.

mod sqlite;

pub use sqlite::{SqliteContextStore, StoreStats};
