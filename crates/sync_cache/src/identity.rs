//! SyncIdentity derivation

use contracts::SyncIdentity;

/// Tag used unless the configuration overrides it
pub const DEFAULT_TAG: &str = "SynchronizedObject";

/// md5 over `tag`, `identity_a`, `identity_b`, in that order.
///
/// Each part is length-prefixed so `("ab", "c")` and `("a", "bc")` differ.
pub fn sync_identity(tag: &str, identity_a: &str, identity_b: &str) -> SyncIdentity {
    let mut hasher = md5::Context::new();
    for part in [tag, identity_a, identity_b] {
        hasher.consume((part.len() as u64).to_le_bytes());
        hasher.consume(part.as_bytes());
    }
    SyncIdentity::from_digest(&hasher.compute().0)
}
