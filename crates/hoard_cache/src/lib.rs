//! In-memory response cache for the proxy.
//!
//! Entries are keyed by request method plus request target and are never
//! evicted; the only way to drop them is [`MemoryCacheStore::clear`].

pub mod entry;
pub mod key;
pub mod store;

pub use entry::CachedEntry;
pub use key::CacheKey;
pub use store::MemoryCacheStore;
