//! In-memory session store: one entry per conversation.
//!
//! State and pending fields are stored and replaced as a single value, so a
//! reader never observes a step from one flow paired with fields from
//! another. Per-conversation write ordering is provided by the dispatch
//! workers (one queue per conversation); the lock here only guards the map
//! itself.

use crate::domain::ConversationId;
use crate::state_machine::{FieldKey, FieldValue, Session};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct SessionStore {
    inner: RwLock<HashMap<ConversationId, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current session for a conversation; `None` means no active flow.
    pub async fn get(&self, id: ConversationId) -> Option<Session> {
        self.inner.read().await.get(&id).cloned()
    }

    /// Replace the whole session (state + fields) in one write.
    pub async fn set(&self, id: ConversationId, session: Session) {
        self.inner.write().await.insert(id, session);
    }

    /// Merge field updates into an existing session, leaving the step
    /// unchanged. A no-op when no flow is active.
    ///
    /// The dispatcher advances flows exclusively through [`Self::set`], so
    /// state and fields always change together; this narrower write covers
    /// field-only updates that leave the step in place.
    pub async fn update_fields(
        &self,
        id: ConversationId,
        updates: Vec<(FieldKey, FieldValue)>,
    ) {
        let mut map = self.inner.write().await;
        if let Some(session) = map.get_mut(&id) {
            for (key, value) in updates {
                session.fields.insert(key, value);
            }
        }
    }

    pub async fn clear(&self, id: ConversationId) {
        self.inner.write().await.remove(&id);
    }
}
