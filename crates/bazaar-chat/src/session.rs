//! Per-identity conversation state and its lifecycle.
//!
//! Owns loading, seeding, persistence, and the identity transition table:
//! a guest conversation migrates once into a freshly signed-in identity,
//! concrete identities switch without merging, and logging out lands on a
//! fresh guest load. All mutations persist synchronously; a failing store
//! degrades to in-memory state for the rest of the run.

use std::sync::Arc;

use tracing::{debug, info, warn};

use bazaar_core::types::{Author, ConversationState, Identity, Message};
use bazaar_store::{KvStore, StateKeys};

use crate::response::seeded_greeting;

/// Manages the conversation state for the currently observed identity.
///
/// Callers serialize access (the engine keeps this behind a lock), which
/// also makes the guest-key read-then-delete of migration a critical
/// section: the same guest state can never migrate twice.
pub struct SessionManager {
    store: Arc<dyn KvStore>,
    identity: Identity,
    state: ConversationState,
}

impl SessionManager {
    /// Start as an anonymous guest, loading any stored guest conversation.
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        let mut manager = Self {
            store,
            identity: Identity::Guest,
            state: ConversationState::default(),
        };
        manager.load();
        manager
    }

    /// The identity state is currently held for.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// A snapshot of the current conversation state.
    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    // -----------------------------------------------------------------
    // Identity transitions
    // -----------------------------------------------------------------

    /// Apply an identity observation.
    ///
    /// Evaluated in priority order: guest-to-user migrates, user-to-user
    /// switches, user-to-guest logs out, anything else resumes. Safe to
    /// call redundantly; observing the current identity reloads from
    /// storage, which is idempotent.
    pub fn observe_identity(&mut self, new_identity: Identity) {
        let was_guest = self.identity.is_guest();
        let now_guest = new_identity.is_guest();

        if was_guest && !now_guest {
            info!("Identity signed in, migrating guest conversation");
            self.migrate_guest_to(new_identity);
        } else if !was_guest && !now_guest && new_identity != self.identity {
            info!("Identity switched, loading stored conversation");
            self.identity = new_identity;
            self.load();
        } else if !was_guest && now_guest {
            info!("Identity signed out, loading guest conversation");
            self.identity = Identity::Guest;
            self.load();
        } else {
            debug!("Identity unchanged, resuming");
            self.load();
        }
    }

    /// One-time guest migration.
    ///
    /// Copies the guest's messages and flags to the new identity's keys
    /// only when the guest has stored history and the new identity does
    /// not; the guest's keys are deleted afterward either way.
    fn migrate_guest_to(&mut self, new_identity: Identity) {
        let guest_keys = StateKeys::for_identity(&Identity::Guest);
        let new_keys = StateKeys::for_identity(&new_identity);

        let guest_messages = self.read_key(&guest_keys.messages);
        let target_messages = self.read_key(&new_keys.messages);

        if let (Some(messages), None) = (&guest_messages, &target_messages) {
            self.write_key(&new_keys.messages, messages);
            if let Some(interacted) = self.read_key(&guest_keys.interacted) {
                self.write_key(&new_keys.interacted, &interacted);
            }
            if let Some(escalate) = self.read_key(&guest_keys.escalate) {
                self.write_key(&new_keys.escalate, &escalate);
            }
        }

        for key in guest_keys.all() {
            self.delete_key(key);
        }

        self.identity = new_identity;
        self.load();
    }

    // -----------------------------------------------------------------
    // Load, seed, persist
    // -----------------------------------------------------------------

    /// Load the current identity's stored state, seeding a fresh greeting
    /// when nothing (or something unreadable) is stored.
    fn load(&mut self) {
        let keys = StateKeys::for_identity(&self.identity);

        let messages = match self.read_key(&keys.messages) {
            Some(raw) => match serde_json::from_str::<Vec<Message>>(&raw) {
                Ok(messages) => Some(messages),
                Err(e) => {
                    warn!(
                        "Discarding corrupt conversation state for {}: {}",
                        self.identity.storage_key(),
                        e
                    );
                    self.delete_key(&keys.messages);
                    None
                }
            },
            None => None,
        };

        self.state = match messages {
            Some(messages) => ConversationState {
                messages,
                has_interacted: self.read_flag(&keys.interacted),
                should_escalate: self.read_flag(&keys.escalate),
            },
            None => Self::seeded(),
        };
    }

    fn seeded() -> ConversationState {
        ConversationState {
            messages: vec![Message::now(Author::Assistant, seeded_greeting())],
            has_interacted: false,
            should_escalate: false,
        }
    }

    /// Append a message and persist.
    pub fn append_message(&mut self, message: Message) {
        self.state.messages.push(message);
        self.persist();
    }

    /// Record that the shopper has sent at least one message.
    pub fn mark_interacted(&mut self) {
        if !self.state.has_interacted {
            self.state.has_interacted = true;
            self.persist();
        }
    }

    /// Latch the stored escalation flag.
    pub fn mark_escalated(&mut self) {
        if !self.state.should_escalate {
            self.state.should_escalate = true;
            self.persist();
        }
    }

    /// Whether the escalation option should be offered right now.
    ///
    /// True when the stored flag is latched, or when at least `threshold`
    /// of the last `window` history entries are assistant turns (a shopper
    /// stuck in unproductive loops). The derived part is recomputed on
    /// every call, never cached.
    pub fn should_show_escalation(&self, window: usize, threshold: usize) -> bool {
        if self.state.should_escalate {
            return true;
        }
        let recent = self
            .state
            .messages
            .iter()
            .rev()
            .take(window)
            .filter(|m| m.author == Author::Assistant)
            .count();
        recent >= threshold
    }

    /// Replace the current conversation with a fresh seeded one and drop
    /// the identity's stored keys. Distinct from identity migration.
    pub fn reset(&mut self) {
        let keys = StateKeys::for_identity(&self.identity);
        for key in keys.all() {
            self.delete_key(key);
        }
        self.state = Self::seeded();
        info!(
            "Conversation reset for {}",
            self.identity.storage_key()
        );
    }

    /// Write the full state to the current identity's keys.
    ///
    /// Write failures are logged and otherwise ignored: the conversation
    /// continues in memory for the rest of the run.
    fn persist(&self) {
        let keys = StateKeys::for_identity(&self.identity);
        match serde_json::to_string(&self.state.messages) {
            Ok(json) => self.write_key(&keys.messages, &json),
            Err(e) => warn!("Failed to serialize conversation state: {}", e),
        }
        self.write_key(&keys.interacted, bool_str(self.state.has_interacted));
        self.write_key(&keys.escalate, bool_str(self.state.should_escalate));
    }

    // -----------------------------------------------------------------
    // Store access with degraded-mode logging
    // -----------------------------------------------------------------

    fn read_key(&self, key: &str) -> Option<String> {
        match self.store.read(key) {
            Ok(value) => value,
            Err(e) => {
                warn!("Store read failed for {}: {}", key, e);
                None
            }
        }
    }

    fn read_flag(&self, key: &str) -> bool {
        self.read_key(key).as_deref() == Some("true")
    }

    fn write_key(&self, key: &str, value: &str) {
        if let Err(e) = self.store.write(key, value) {
            warn!("Store write failed for {}: {}", key, e);
        }
    }

    fn delete_key(&self, key: &str) {
        if let Err(e) = self.store.delete(key) {
            warn!("Store delete failed for {}: {}", key, e);
        }
    }
}

fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_store::MemoryStore;

    fn store() -> Arc<dyn KvStore> {
        Arc::new(MemoryStore::new())
    }

    fn user_message(body: &str) -> Message {
        Message::now(Author::User, body)
    }

    fn assistant_message(body: &str) -> Message {
        Message::now(Author::Assistant, body)
    }

    // ---- Seeding ----

    #[test]
    fn test_fresh_session_seeds_one_greeting() {
        let manager = SessionManager::new(store());
        let state = manager.state();
        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.messages[0].author, Author::Assistant);
        assert_eq!(state.messages[0].body, seeded_greeting());
        assert!(!state.has_interacted);
        assert!(!state.should_escalate);
    }

    #[test]
    fn test_seeded_greeting_not_persisted_until_mutation() {
        let store = store();
        let _manager = SessionManager::new(Arc::clone(&store));
        // Load alone writes nothing.
        assert_eq!(store.read("chat:guest:messages").unwrap(), None);
    }

    // ---- Persistence ----

    #[test]
    fn test_append_persists_messages() {
        let store = store();
        let mut manager = SessionManager::new(Arc::clone(&store));
        manager.append_message(user_message("hello"));

        let raw = store.read("chat:guest:messages").unwrap().unwrap();
        let stored: Vec<Message> = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored.len(), 2); // greeting + user message
        assert_eq!(stored[1].body, "hello");
    }

    #[test]
    fn test_state_survives_reload() {
        let store = store();
        {
            let mut manager = SessionManager::new(Arc::clone(&store));
            manager.append_message(user_message("remember me"));
            manager.mark_interacted();
        }
        let manager = SessionManager::new(store);
        assert_eq!(manager.state().messages.len(), 2);
        assert!(manager.state().has_interacted);
    }

    #[test]
    fn test_flags_persist_as_strings() {
        let store = store();
        let mut manager = SessionManager::new(Arc::clone(&store));
        manager.mark_interacted();
        manager.mark_escalated();
        assert_eq!(
            store.read("chat:guest:interacted").unwrap().as_deref(),
            Some("true")
        );
        assert_eq!(
            store.read("chat:guest:escalate").unwrap().as_deref(),
            Some("true")
        );
    }

    // ---- Corrupt state recovery ----

    #[test]
    fn test_corrupt_state_discarded_and_reseeded() {
        let store = store();
        store.write("chat:guest:messages", "{ not json ]").unwrap();

        let manager = SessionManager::new(Arc::clone(&store));
        // Fresh greeting, corrupt entry deleted.
        assert_eq!(manager.state().messages.len(), 1);
        assert_eq!(store.read("chat:guest:messages").unwrap(), None);
    }

    // ---- Migration ----

    #[test]
    fn test_migration_moves_guest_conversation() {
        let store = store();
        let mut manager = SessionManager::new(Arc::clone(&store));
        manager.append_message(user_message("as a guest"));
        manager.mark_interacted();
        let guest_count = manager.state().messages.len();

        manager.observe_identity(Identity::User("u1".into()));

        // Exactly the guest's messages, none duplicated.
        assert_eq!(manager.state().messages.len(), guest_count);
        assert!(manager.state().has_interacted);
        assert_eq!(manager.identity(), &Identity::User("u1".into()));

        // Guest keys are gone.
        assert_eq!(store.read("chat:guest:messages").unwrap(), None);
        assert_eq!(store.read("chat:guest:interacted").unwrap(), None);
        assert_eq!(store.read("chat:guest:escalate").unwrap(), None);
    }

    #[test]
    fn test_migration_then_guest_load_starts_fresh() {
        let store = store();
        let mut manager = SessionManager::new(Arc::clone(&store));
        manager.append_message(user_message("guest history"));
        manager.observe_identity(Identity::User("u1".into()));

        manager.observe_identity(Identity::Guest);
        assert_eq!(manager.state().messages.len(), 1);
        assert_eq!(manager.state().messages[0].body, seeded_greeting());
    }

    #[test]
    fn test_migration_does_not_clobber_existing_user_state() {
        let store = store();

        // The user already has a stored conversation.
        let existing = vec![assistant_message("old greeting"), user_message("old chat")];
        store
            .write(
                "chat:u1:messages",
                &serde_json::to_string(&existing).unwrap(),
            )
            .unwrap();

        let mut manager = SessionManager::new(Arc::clone(&store));
        manager.append_message(user_message("guest chatter"));
        manager.observe_identity(Identity::User("u1".into()));

        // User's own history wins; guest keys deleted regardless.
        assert_eq!(manager.state().messages.len(), 2);
        assert_eq!(manager.state().messages[1].body, "old chat");
        assert_eq!(store.read("chat:guest:messages").unwrap(), None);
    }

    #[test]
    fn test_migration_without_guest_history() {
        let store = store();
        let mut manager = SessionManager::new(Arc::clone(&store));
        // Guest never interacted, so nothing was persisted.
        manager.observe_identity(Identity::User("u1".into()));
        // User starts seeded.
        assert_eq!(manager.state().messages.len(), 1);
        assert_eq!(store.read("chat:u1:messages").unwrap(), None);
    }

    #[test]
    fn test_migration_copies_escalation_flag() {
        let store = store();
        let mut manager = SessionManager::new(Arc::clone(&store));
        manager.append_message(user_message("need help"));
        manager.mark_escalated();

        manager.observe_identity(Identity::User("u1".into()));
        assert!(manager.state().should_escalate);
        assert_eq!(
            store.read("chat:u1:escalate").unwrap().as_deref(),
            Some("true")
        );
    }

    // ---- Switch and log-out ----

    #[test]
    fn test_switch_between_users_does_not_merge() {
        let store = store();
        let mut manager = SessionManager::new(Arc::clone(&store));
        manager.observe_identity(Identity::User("u1".into()));
        manager.append_message(user_message("u1 talk"));
        let u1_len = manager.state().messages.len();

        manager.observe_identity(Identity::User("u2".into()));
        assert_eq!(manager.state().messages.len(), 1); // fresh seed for u2

        // u1's storage untouched.
        let raw = store.read("chat:u1:messages").unwrap().unwrap();
        let stored: Vec<Message> = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored.len(), u1_len);
    }

    #[test]
    fn test_logout_loads_guest_fresh() {
        let store = store();
        let mut manager = SessionManager::new(Arc::clone(&store));
        manager.observe_identity(Identity::User("u1".into()));
        manager.append_message(user_message("signed in"));

        manager.observe_identity(Identity::Guest);
        assert!(manager.identity().is_guest());
        assert_eq!(manager.state().messages.len(), 1);

        // Signing back in resumes the stored user conversation; the guest
        // side had nothing stored, so there is nothing to migrate.
        manager.observe_identity(Identity::User("u1".into()));
        assert_eq!(manager.state().messages.len(), 2);
    }

    #[test]
    fn test_redundant_observation_is_idempotent() {
        let store = store();
        let mut manager = SessionManager::new(Arc::clone(&store));
        manager.observe_identity(Identity::User("u1".into()));
        manager.append_message(user_message("once"));
        let before = manager.state().clone();

        manager.observe_identity(Identity::User("u1".into()));
        manager.observe_identity(Identity::User("u1".into()));
        assert_eq!(manager.state().messages.len(), before.messages.len());
    }

    // ---- Reset ----

    #[test]
    fn test_reset_seeds_and_deletes_keys() {
        let store = store();
        let mut manager = SessionManager::new(Arc::clone(&store));
        manager.append_message(user_message("wipe me"));
        manager.mark_escalated();

        manager.reset();
        assert_eq!(manager.state().messages.len(), 1);
        assert!(!manager.state().should_escalate);
        assert_eq!(store.read("chat:guest:messages").unwrap(), None);
        assert_eq!(store.read("chat:guest:interacted").unwrap(), None);
        assert_eq!(store.read("chat:guest:escalate").unwrap(), None);
    }

    // ---- Escalation derivation ----

    #[test]
    fn test_escalation_stored_flag_wins() {
        let mut manager = SessionManager::new(store());
        manager.mark_escalated();
        assert!(manager.should_show_escalation(5, 3));
    }

    #[test]
    fn test_escalation_derived_from_assistant_heavy_window() {
        let mut manager = SessionManager::new(store());
        // Seeded greeting is 1 assistant entry; add two more plus users.
        manager.append_message(user_message("a"));
        manager.append_message(assistant_message("b"));
        manager.append_message(user_message("c"));
        manager.append_message(assistant_message("d"));
        // Last 5: a, b, c, d, greeting-evicted -> assistant count varies;
        // recount: messages = [greet, a, b, c, d]; last 5 has 3 assistant.
        assert!(manager.should_show_escalation(5, 3));
    }

    #[test]
    fn test_escalation_not_derived_below_threshold() {
        let mut manager = SessionManager::new(store());
        manager.append_message(user_message("a"));
        manager.append_message(assistant_message("b"));
        manager.append_message(user_message("c"));
        // Last 5: greet, a, b, c -> 2 assistant turns.
        assert!(!manager.should_show_escalation(5, 3));
    }

    #[test]
    fn test_escalation_recomputed_every_check() {
        let mut manager = SessionManager::new(store());
        manager.append_message(user_message("a"));
        assert!(!manager.should_show_escalation(5, 3));

        manager.append_message(assistant_message("b"));
        manager.append_message(assistant_message("c"));
        assert!(manager.should_show_escalation(5, 3));

        // A burst of user messages pushes assistants out of the window.
        manager.append_message(user_message("d"));
        manager.append_message(user_message("e"));
        manager.append_message(user_message("f"));
        manager.append_message(user_message("g"));
        assert!(!manager.should_show_escalation(5, 3));
    }
}
