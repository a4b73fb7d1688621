use freegpt_client::ChatMessage;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

pub type UserId = u64;

/// What plain text messages from a user are turned into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Text,
    Image,
}

/// Per-user conversation state. Lives only in memory.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub history: Vec<ChatMessage>,
    pub mode: Mode,
}

/// All sessions, keyed by user.
///
/// The map lock is only held to find or insert a session; each session has
/// its own mutex so different users never wait on each other.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<UserId, Arc<Mutex<Session>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_create(&self, user: UserId) -> Arc<Mutex<Session>> {
        if let Some(session) = self.sessions.read().await.get(&user) {
            return Arc::clone(session);
        }
        let mut sessions = self.sessions.write().await;
        Arc::clone(sessions.entry(user).or_default())
    }

    /// Starts over: empty history, text mode.
    pub async fn reset(&self, user: UserId) {
        let session = self.get_or_create(user).await;
        *session.lock().await = Session::default();
    }

    /// Forgets the history of a known user and keeps the mode.
    pub async fn clear(&self, user: UserId) {
        let session = self.sessions.read().await.get(&user).cloned();
        if let Some(session) = session {
            session.lock().await.history.clear();
        }
    }

    pub async fn set_mode(&self, user: UserId, mode: Mode) {
        let session = self.get_or_create(user).await;
        session.lock().await.mode = mode;
    }

    pub async fn mode(&self, user: UserId) -> Mode {
        let session = self.get_or_create(user).await;
        let mode = session.lock().await.mode;
        mode
    }

    /// Copy of the history, safe to send upstream while the session moves on.
    pub async fn history(&self, user: UserId) -> Vec<ChatMessage> {
        let session = self.get_or_create(user).await;
        let history = session.lock().await.history.clone();
        history
    }

    /// Appends the user's prompt and, when the call succeeded, the reply.
    pub async fn record_exchange(
        &self,
        user: UserId,
        prompt: ChatMessage,
        reply: Option<ChatMessage>,
    ) {
        let session = self.get_or_create(user).await;
        let mut session = session.lock().await;
        session.history.push(prompt);
        session.history.extend(reply);
    }

    /// Number of users with a session.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_new_session_defaults_to_text() {
        let store = SessionStore::new();
        assert_eq!(store.mode(7).await, Mode::Text);
        assert!(store.history(7).await.is_empty());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_record_exchange_appends_in_order() {
        let store = SessionStore::new();
        store
            .record_exchange(1, ChatMessage::user("hi"), Some(ChatMessage::assistant("hello")))
            .await;
        store.record_exchange(1, ChatMessage::user("again"), None).await;

        let history = store.history(1).await;
        assert_eq!(
            history,
            vec![
                ChatMessage::user("hi"),
                ChatMessage::assistant("hello"),
                ChatMessage::user("again"),
            ]
        );
    }

    #[tokio::test]
    async fn test_clear_keeps_mode_and_ignores_unknown_users() {
        let store = SessionStore::new();
        store.set_mode(1, Mode::Image).await;
        store.record_exchange(1, ChatMessage::user("hi"), None).await;

        store.clear(1).await;
        store.clear(2).await;

        assert!(store.history(1).await.is_empty());
        assert_eq!(store.mode(1).await, Mode::Image);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_reset_restores_text_mode() {
        let store = SessionStore::new();
        store.set_mode(3, Mode::Image).await;
        store.record_exchange(3, ChatMessage::user("hi"), None).await;

        store.reset(3).await;

        assert_eq!(store.mode(3).await, Mode::Text);
        assert!(store.history(3).await.is_empty());
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let store = Arc::new(SessionStore::new());
        let mut handles = Vec::new();
        for user in 0..8u64 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                for i in 0..10 {
                    store
                        .record_exchange(user, ChatMessage::user(format!("{user}-{i}")), None)
                        .await;
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.len().await, 8);
        for user in 0..8u64 {
            let history = store.history(user).await;
            assert_eq!(history.len(), 10);
            assert!(history.iter().all(|m| m.content.starts_with(&format!("{user}-"))));
        }
    }
}
