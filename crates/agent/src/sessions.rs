use std::collections::HashMap;
use std::sync::Arc;

use showroom_core::dialogue::{DialogueSession, SessionSettings};
use tokio::sync::{Mutex, RwLock};

/// Live conversations keyed by caller-supplied session id. Each session has
/// its own lock so turns for different buyers never wait on each other.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<DialogueSession>>>>,
    settings: SessionSettings,
}

impl SessionStore {
    pub fn new(settings: SessionSettings) -> Self {
        Self { sessions: RwLock::new(HashMap::new()), settings }
    }

    pub async fn get_or_create(&self, session_id: &str) -> Arc<Mutex<DialogueSession>> {
        if let Some(session) = self.sessions.read().await.get(session_id) {
            return Arc::clone(session);
        }

        let mut sessions = self.sessions.write().await;
        Arc::clone(
            sessions
                .entry(session_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(DialogueSession::new(&self.settings)))),
        )
    }

    pub async fn get(&self, session_id: &str) -> Option<Arc<Mutex<DialogueSession>>> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// Clears profile, listing and transcript. Returns false when the session
    /// did not exist.
    pub async fn reset(&self, session_id: &str) -> bool {
        match self.get(session_id).await {
            Some(session) => {
                session.lock().await.reset();
                true
            }
            None => false,
        }
    }

    pub async fn remove(&self, session_id: &str) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use showroom_core::dialogue::SessionSettings;
    use showroom_core::extraction::ExtractedAttributes;

    use super::SessionStore;

    #[tokio::test]
    async fn same_id_returns_same_session() {
        let store = SessionStore::new(SessionSettings::default());
        let first = store.get_or_create("buyer-1").await;
        let second = store.get_or_create("buyer-1").await;
        let other = store.get_or_create("buyer-2").await;

        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn reset_clears_state_but_keeps_the_entry() {
        let store = SessionStore::new(SessionSettings::default());
        let session = store.get_or_create("buyer-1").await;
        session
            .lock()
            .await
            .merge(&ExtractedAttributes { family_size: Some(5), ..ExtractedAttributes::default() });

        assert!(store.reset("buyer-1").await);
        assert!(session.lock().await.profile().is_empty());
        assert!(!store.reset("missing").await);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn remove_forgets_the_session() {
        let store = SessionStore::new(SessionSettings::default());
        store.get_or_create("buyer-1").await;

        assert!(store.remove("buyer-1").await);
        assert!(!store.remove("buyer-1").await);
        assert!(store.is_empty().await);
    }
}
