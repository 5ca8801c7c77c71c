//! Engine orchestrator.
//!
//! Wires the parser, search engine, response generator, and session
//! manager behind the produced interface: `send_message`, identity
//! notification, reset, and the escalation check. One utterance is
//! processed at a time; a second submission while a reply is being
//! prepared is rejected rather than interleaved.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracing::{debug, warn};

use bazaar_catalog::{CatalogCache, CatalogSource, SearchEngine};
use bazaar_core::config::BazaarConfig;
use bazaar_core::types::{
    Author, ConversationState, Identity, Message, Reply, ReplyKind,
};
use bazaar_store::KvStore;

use crate::error::ChatError;
use crate::parser::classify_intent;
use crate::response::{ResponseGenerator, FAILURE_ESCALATION};
use crate::session::SessionManager;

/// The conversational product-discovery engine.
///
/// Holds its own catalog cache and session state; all collaborators are
/// constructor-injected, so two engines never share hidden state.
pub struct Engine {
    config: BazaarConfig,
    cache: Arc<CatalogCache>,
    source: Arc<dyn CatalogSource>,
    responder: ResponseGenerator,
    session: Mutex<SessionManager>,
    busy: AtomicBool,
    reset_epoch: AtomicU64,
}

impl Engine {
    /// Build an engine over a catalog source and a durable store.
    ///
    /// The catalog starts empty; call [`Engine::refresh_catalog`] to pull
    /// the first snapshot.
    pub fn new(
        config: BazaarConfig,
        source: Arc<dyn CatalogSource>,
        store: Arc<dyn KvStore>,
    ) -> Self {
        let cache = Arc::new(CatalogCache::new());
        let search = SearchEngine::new(Arc::clone(&cache));
        let responder =
            ResponseGenerator::new(search, Arc::clone(&cache), config.search.clone());

        Self {
            config,
            cache,
            source,
            responder,
            session: Mutex::new(SessionManager::new(store)),
            busy: AtomicBool::new(false),
            reset_epoch: AtomicU64::new(0),
        }
    }

    /// Pull a fresh catalog snapshot.
    ///
    /// A failing source is logged inside the cache and leaves the previous
    /// snapshot serving; the engine keeps answering against stale data.
    pub fn refresh_catalog(&self) {
        let _ = self.cache.refresh(self.source.as_ref());
    }

    /// Handle one shopper utterance and produce a reply.
    ///
    /// Appends the user message, waits out the typing delay, then appends
    /// the assistant message, in that order. Rejects concurrent
    /// submissions with [`ChatError::Busy`]; a conversation reset during
    /// the delay discards the pending reply with [`ChatError::Cancelled`].
    pub async fn send_message(&self, utterance: &str) -> Result<Reply, ChatError> {
        self.send_inner(utterance, false).await
    }

    /// Handle a tapped suggestion chip; identical to [`Engine::send_message`]
    /// except the stored user message is marked as a suggestion reply.
    pub async fn send_suggestion(&self, chip: &str) -> Result<Reply, ChatError> {
        self.send_inner(chip, true).await
    }

    async fn send_inner(&self, utterance: &str, from_suggestion: bool) -> Result<Reply, ChatError> {
        let trimmed = utterance.trim();
        if trimmed.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if trimmed.len() > self.config.chat.max_message_length {
            return Err(ChatError::MessageTooLong(self.config.chat.max_message_length));
        }

        // Reentrancy guard: one reply at a time per conversation.
        let _busy = BusyToken::acquire(&self.busy).ok_or(ChatError::Busy)?;
        let epoch = self.reset_epoch.load(Ordering::SeqCst);

        // Classification and ranking run before any suspension point.
        let intent = classify_intent(trimmed);
        debug!(?intent, "Classified utterance");
        let reply = match self.responder.generate(trimmed, intent) {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Reply generation failed, escalating: {}", e);
                Reply::escalate(FAILURE_ESCALATION)
            }
        };

        // User message lands in history before the delay.
        {
            let mut session = self.lock_session()?;
            let mut message = Message::now(Author::User, trimmed);
            message.from_suggestion = from_suggestion;
            session.append_message(message);
            session.mark_interacted();
            if reply.kind == ReplyKind::EscalateToAdmin {
                session.mark_escalated();
            }
        }

        // Presentation-only pause; computation is already done.
        tokio::time::sleep(self.typing_delay(&reply)).await;

        if self.reset_epoch.load(Ordering::SeqCst) != epoch {
            debug!("Conversation reset mid-reply, discarding pending reply");
            return Err(ChatError::Cancelled);
        }

        {
            let mut session = self.lock_session()?;
            session.append_message(Message::with_products(
                reply.message.clone(),
                reply.products.clone(),
            ));
        }

        Ok(reply)
    }

    /// Apply an identity observation (sign-in, switch, or sign-out).
    ///
    /// Idempotent under redundant notification.
    pub fn notify_identity(&self, identity: Identity) -> Result<(), ChatError> {
        self.lock_session()?.observe_identity(identity);
        Ok(())
    }

    /// Start the current identity's conversation over.
    ///
    /// Any reply still being prepared is discarded rather than appended
    /// after the fresh greeting.
    pub fn reset_conversation(&self) -> Result<(), ChatError> {
        self.reset_epoch.fetch_add(1, Ordering::SeqCst);
        self.lock_session()?.reset();
        Ok(())
    }

    /// A snapshot of the current conversation.
    pub fn conversation_state(&self) -> Result<ConversationState, ChatError> {
        Ok(self.lock_session()?.state().clone())
    }

    /// Whether the hand-off-to-a-human option should be offered.
    pub fn should_show_escalation(&self) -> Result<bool, ChatError> {
        let session = self.lock_session()?;
        Ok(session.should_show_escalation(
            self.config.chat.escalation_window,
            self.config.chat.escalation_threshold,
        ))
    }

    // -----------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------

    fn lock_session(&self) -> Result<MutexGuard<'_, SessionManager>, ChatError> {
        self.session
            .lock()
            .map_err(|e| ChatError::StorageError(format!("session lock poisoned: {}", e)))
    }

    /// Typing delay scaled by reply length, clamped to the configured band.
    fn typing_delay(&self, reply: &Reply) -> Duration {
        let chat = &self.config.chat;
        let ms = (reply.message.len() as u64)
            .saturating_mul(chat.typing_delay_per_char_ms)
            .clamp(chat.typing_delay_floor_ms, chat.typing_delay_cap_ms);
        Duration::from_millis(ms)
    }
}

/// RAII guard for the engine's busy flag.
struct BusyToken<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyToken<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for BusyToken<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
