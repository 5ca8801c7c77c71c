//! Identity-scoped storage key derivation.
//!
//! Each identity owns exactly three logical keys: the message list, the
//! interaction flag, and the escalation flag. Keys are derived
//! deterministically so the same identity always maps to the same storage.

use bazaar_core::types::Identity;

/// The three storage keys belonging to one identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateKeys {
    pub messages: String,
    pub interacted: String,
    pub escalate: String,
}

impl StateKeys {
    /// Derive the key set for an identity.
    pub fn for_identity(identity: &Identity) -> Self {
        let id = identity.storage_key();
        Self {
            messages: format!("chat:{}:messages", id),
            interacted: format!("chat:{}:interacted", id),
            escalate: format!("chat:{}:escalate", id),
        }
    }

    /// All three keys, for bulk delete.
    pub fn all(&self) -> [&str; 3] {
        [&self.messages, &self.interacted, &self.escalate]
    }
}
