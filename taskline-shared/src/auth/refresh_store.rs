/// Refresh token registry
///
/// Tracks the single currently-valid refresh token per subject (user
/// email). Issuing a new refresh token overwrites the previous entry,
/// which is what makes a superseded-but-cryptographically-valid token
/// unusable: the auth service compares the presented token against the
/// registry entry before honoring it.
///
/// The registry is memory-resident by design. A process restart drops
/// every entry, invalidating all refresh tokens; access tokens remain
/// valid until their natural expiry since they are stateless.

use std::collections::HashMap;
use std::sync::RwLock;

/// Storage seam for the refresh token registry.
///
/// The in-memory implementation below is the default; a distributed
/// cache can be slotted in behind the same trait for multi-instance
/// deployments. Operations on a single subject are atomic; there are
/// no cross-subject transactions.
pub trait RefreshTokenStore: Send + Sync {
    /// Records `token` as the only live refresh token for `subject`,
    /// overwriting any previous entry.
    fn put(&self, subject: &str, token: &str);

    /// Returns the current refresh token for `subject`, if any.
    fn get(&self, subject: &str) -> Option<String>;

    /// Drops the entry for `subject`; a no-op when absent.
    fn remove(&self, subject: &str);

    /// Replaces the entry for `subject` with `next` only if the current
    /// entry equals `expected`. Returns whether the swap happened.
    ///
    /// This is the rotation step of the refresh flow: it must not expose
    /// an intermediate state to concurrent calls for the same subject.
    fn rotate(&self, subject: &str, expected: &str, next: &str) -> bool;
}

/// Process-local registry backed by a locked hash map.
#[derive(Default)]
pub struct InMemoryRefreshTokenStore {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryRefreshTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RefreshTokenStore for InMemoryRefreshTokenStore {
    fn put(&self, subject: &str, token: &str) {
        let mut entries = self.entries.write().expect("refresh store lock poisoned");
        entries.insert(subject.to_string(), token.to_string());
    }

    fn get(&self, subject: &str) -> Option<String> {
        let entries = self.entries.read().expect("refresh store lock poisoned");
        entries.get(subject).cloned()
    }

    fn remove(&self, subject: &str) {
        let mut entries = self.entries.write().expect("refresh store lock poisoned");
        entries.remove(subject);
    }

    fn rotate(&self, subject: &str, expected: &str, next: &str) -> bool {
        // Compare and swap under a single write-lock acquisition so no
        // concurrent caller for the same subject sees a half-rotated state.
        let mut entries = self.entries.write().expect("refresh store lock poisoned");
        match entries.get(subject) {
            Some(current) if current == expected => {
                entries.insert(subject.to_string(), next.to_string());
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_overwrites_previous_entry() {
        let store = InMemoryRefreshTokenStore::new();
        store.put("user@example.com", "token-1");
        store.put("user@example.com", "token-2");

        assert_eq!(store.get("user@example.com").as_deref(), Some("token-2"));
    }

    #[test]
    fn test_get_absent() {
        let store = InMemoryRefreshTokenStore::new();
        assert_eq!(store.get("nobody@example.com"), None);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let store = InMemoryRefreshTokenStore::new();
        store.put("user@example.com", "token-1");
        store.remove("user@example.com");
        store.remove("user@example.com");

        assert_eq!(store.get("user@example.com"), None);
    }

    #[test]
    fn test_rotate_requires_current_token() {
        let store = InMemoryRefreshTokenStore::new();
        store.put("user@example.com", "token-1");

        assert!(store.rotate("user@example.com", "token-1", "token-2"));
        assert_eq!(store.get("user@example.com").as_deref(), Some("token-2"));

        // Superseded token can no longer rotate
        assert!(!store.rotate("user@example.com", "token-1", "token-3"));
        assert_eq!(store.get("user@example.com").as_deref(), Some("token-2"));

        // Absent subject never rotates
        assert!(!store.rotate("other@example.com", "token-2", "token-3"));
    }

    #[test]
    fn test_subjects_are_independent() {
        let store = InMemoryRefreshTokenStore::new();
        store.put("a@example.com", "token-a");
        store.put("b@example.com", "token-b");
        store.remove("a@example.com");

        assert_eq!(store.get("a@example.com"), None);
        assert_eq!(store.get("b@example.com").as_deref(), Some("token-b"));
    }
}
