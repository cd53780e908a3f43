use anyhow::Result;
use async_trait::async_trait;

/// Pluggable state-store backend.
/// Implementations: SlateDB (persistent), in-memory (tests, embedding).
///
/// Lease fields are stored one key per field under
/// `pkg_constants::state::LOCK_KEY_PREFIX`. A `put` is only considered
/// durable once the future resolves; the lease core awaits every commit
/// before reading state on the next tick. If a store is shared across
/// concurrent callers, the store (not the lease core) must serialize
/// writes.
#[async_trait]
pub trait StateBackend: Send + Sync {
    /// Retrieve the value for a key, or `None` if it does not exist.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store a value under the given key.
    async fn put(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Delete a key from the store.
    async fn delete(&self, key: &str) -> Result<()>;

    /// List all key-value pairs whose keys start with `prefix`.
    /// Returns them as `(key_string, raw_bytes)`.
    async fn list_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>>;
}
