//! Chat sessions and the store that holds them.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::state::{SessionEvent, SessionState, Turn};
use crate::endpoint::ChatEndpoint;
use crate::error::ChatError;

/// Default idle time after which a session is swept (30 minutes).
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Controller for one page load's conversation.
///
/// Cloning is cheap and every clone refers to the same session. State only
/// changes through [`SessionState::apply`], and at most one request is in
/// flight at a time.
#[derive(Debug, Clone)]
pub struct ChatSession {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    /// Unique session identifier.
    id: String,
    state: RwLock<SessionState>,
    last_activity: RwLock<DateTime<Utc>>,
}

impl ChatSession {
    fn new(id: String) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                id,
                state: RwLock::new(SessionState::new()),
                last_activity: RwLock::new(Utc::now()),
            }),
        }
    }

    /// Get the session ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Copy of the current state, for rendering.
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.read_state().clone()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.read_state().is_loading()
    }

    #[must_use]
    pub fn history_len(&self) -> usize {
        self.read_state().history().len()
    }

    /// Record new input field contents.
    pub fn edit_draft(&self, text: impl Into<String>) {
        self.transition(SessionEvent::DraftEdited(text.into()));
    }

    /// Submit `draft` to `endpoint` and fold the outcome into the session.
    ///
    /// Blank drafts are rejected without a network call. While a request is
    /// pending, further submissions return [`ChatError::InFlight`] and leave
    /// the state untouched. The lock is released while awaiting the endpoint.
    ///
    /// The request runs on its own task, so dropping the returned future (a
    /// client disconnecting mid-request) does not cancel it: the session still
    /// settles on success or failure.
    pub async fn submit<E>(
        &self,
        draft: impl Into<String>,
        endpoint: Arc<E>,
    ) -> Result<Turn, ChatError>
    where
        E: ChatEndpoint + ?Sized + 'static,
    {
        let query = draft.into();

        {
            let mut guard = self.write_state();
            if guard.is_loading() {
                return Err(ChatError::InFlight);
            }

            let state = std::mem::take(&mut *guard).apply(SessionEvent::DraftEdited(query.clone()));
            if query.trim().is_empty() {
                let err = ChatError::EmptyQuery;
                *guard = state.apply(SessionEvent::Rejected(err.user_message().to_string()));
                drop(guard);
                self.touch();
                return Err(err);
            }
            *guard = state.apply(SessionEvent::SubmitStarted);
        }
        self.touch();

        tracing::debug!(session_id = %self.id(), "Submitting query");

        let session = self.clone();
        let request = tokio::spawn(async move {
            let outcome = endpoint.ask(&query).await;
            session.settle(query, outcome)
        });

        match request.await {
            Ok(result) => result,
            Err(e) => {
                let err = ChatError::from(e);
                self.transition(SessionEvent::Failed(err.user_message().to_string()));
                self.touch();
                tracing::error!(session_id = %self.id(), error = %err, "Query task failed");
                Err(err)
            }
        }
    }

    /// Apply the endpoint's outcome for `query`.
    fn settle(&self, query: String, outcome: Result<String, ChatError>) -> Result<Turn, ChatError> {
        let result = match outcome {
            Ok(response) => {
                let turn = Turn::new(query, response);
                self.transition(SessionEvent::Succeeded(turn.clone()));
                tracing::info!(
                    session_id = %self.id(),
                    history_len = self.history_len(),
                    "Query answered"
                );
                Ok(turn)
            }
            Err(e) => {
                self.transition(SessionEvent::Failed(e.user_message().to_string()));
                tracing::warn!(session_id = %self.id(), error = %e, "Query failed");
                Err(e)
            }
        };
        self.touch();
        result
    }

    /// Check if the session has been idle longer than `timeout`.
    ///
    /// Sessions with a request in flight never expire.
    #[must_use]
    pub fn is_expired_with_timeout(&self, timeout: Duration) -> bool {
        if self.is_loading() {
            return false;
        }
        let last = *self
            .inner
            .last_activity
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        // Negative durations mean clock skew; treat as fresh.
        (Utc::now() - last)
            .to_std()
            .is_ok_and(|idle| idle > timeout)
    }

    fn transition(&self, event: SessionEvent) {
        let mut guard = self.write_state();
        let state = std::mem::take(&mut *guard);
        *guard = state.apply(event);
    }

    fn touch(&self) {
        let mut guard = self
            .inner
            .last_activity
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = Utc::now();
    }

    fn read_state(&self) -> RwLockReadGuard<'_, SessionState> {
        self.inner.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.inner.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Thread-safe store for sessions.
///
/// A session is created per page load and lives until the page closes it or
/// the sweeper finds it idle.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, ChatSession>>>,
}

impl SessionStore {
    /// Create a new session store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new session and return it.
    #[must_use]
    pub fn create(&self) -> ChatSession {
        let session = ChatSession::new(Uuid::new_v4().to_string());
        self.sessions_mut()
            .insert(session.id().to_string(), session.clone());
        session
    }

    /// Get a session by ID.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<ChatSession> {
        self.sessions().get(id).cloned()
    }

    /// Remove a session by ID.
    pub fn remove(&self, id: &str) -> Option<ChatSession> {
        self.sessions_mut().remove(id)
    }

    /// Get the number of active sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove sessions that have been inactive longer than the timeout.
    ///
    /// Returns the number of sessions removed.
    pub fn cleanup_expired_with_timeout(&self, timeout: Duration) -> usize {
        let mut guard = self.sessions_mut();
        let before = guard.len();
        guard.retain(|_, session| !session.is_expired_with_timeout(timeout));
        before - guard.len()
    }

    fn sessions(&self) -> RwLockReadGuard<'_, HashMap<String, ChatSession>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn sessions_mut(&self) -> RwLockWriteGuard<'_, HashMap<String, ChatSession>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::oneshot;

    use super::*;
    use crate::error::{ErrorKind, TRANSPORT_FAILURE_MESSAGE};

    /// Endpoint that replays canned outcomes and counts calls.
    #[derive(Debug, Default)]
    struct ScriptedEndpoint {
        replies: Mutex<VecDeque<Result<String, ChatError>>>,
        queries: Mutex<Vec<String>>,
        calls: AtomicUsize,
    }

    impl ScriptedEndpoint {
        fn replying(replies: Vec<Result<String, ChatError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                ..Self::default()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl ChatEndpoint for ScriptedEndpoint {
        async fn ask(&self, query: &str) -> Result<String, ChatError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.queries.lock().unwrap().push(query.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ChatError::Status { status: 503 }))
        }
    }

    /// Endpoint that holds its reply until the test releases it.
    #[derive(Debug)]
    struct GatedEndpoint {
        gate: Mutex<Option<oneshot::Receiver<String>>>,
    }

    #[async_trait::async_trait]
    impl ChatEndpoint for GatedEndpoint {
        async fn ask(&self, _query: &str) -> Result<String, ChatError> {
            let rx = self.gate.lock().unwrap().take().expect("asked twice");
            rx.await.map_err(|_| ChatError::Status { status: 499 })
        }
    }

    #[tokio::test]
    async fn test_successful_submit_appends_turn() {
        let store = SessionStore::new();
        let session = store.create();
        let endpoint = Arc::new(ScriptedEndpoint::replying(vec![Ok("hi there".into())]));

        let turn = session.submit("hello", Arc::clone(&endpoint)).await.unwrap();

        assert_eq!(turn, Turn::new("hello", "hi there"));
        let state = session.snapshot();
        assert_eq!(state.history(), &[Turn::new("hello", "hi there")]);
        assert!(state.error_message().is_none());
        assert!(!state.is_loading());
        assert_eq!(state.draft_query(), "");
    }

    #[tokio::test]
    async fn test_blank_submit_never_calls_endpoint() {
        let store = SessionStore::new();
        let session = store.create();
        let endpoint = Arc::new(ScriptedEndpoint::default());

        for blank in ["", " ", "   ", "\t", "\n \r\n", "\u{3000}"] {
            let err = session.submit(blank, Arc::clone(&endpoint)).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
            assert_eq!(
                session.snapshot().error_message(),
                Some("Please enter a query.")
            );
        }

        assert_eq!(endpoint.calls(), 0);
        assert_eq!(session.history_len(), 0);
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn test_failed_submit_keeps_history() {
        let store = SessionStore::new();
        let session = store.create();
        let endpoint = Arc::new(ScriptedEndpoint::replying(vec![
            Ok("first".into()),
            Err(ChatError::Status { status: 500 }),
        ]));

        session.submit("one", Arc::clone(&endpoint)).await.unwrap();
        let err = session.submit("test", Arc::clone(&endpoint)).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Transport);
        let state = session.snapshot();
        assert_eq!(state.history().len(), 1);
        assert_eq!(state.error_message(), Some(TRANSPORT_FAILURE_MESSAGE));
        assert!(!state.is_loading());
        assert_eq!(state.draft_query(), "test");
    }

    #[tokio::test]
    async fn test_sequential_submits_preserve_order() {
        let store = SessionStore::new();
        let session = store.create();
        let endpoint = Arc::new(ScriptedEndpoint::replying(vec![Ok("A".into()), Ok("B".into())]));

        session.submit("a", Arc::clone(&endpoint)).await.unwrap();
        session.submit("b", Arc::clone(&endpoint)).await.unwrap();

        let state = session.snapshot();
        let queries: Vec<&str> = state.history().iter().map(Turn::query).collect();
        assert_eq!(queries, ["a", "b"]);
        assert_eq!(state.history()[1].response(), "B");
    }

    #[tokio::test]
    async fn test_raw_query_is_sent_and_recorded() {
        let store = SessionStore::new();
        let session = store.create();
        let endpoint = Arc::new(ScriptedEndpoint::replying(vec![Ok("ok".into())]));

        session.submit("  padded  ", Arc::clone(&endpoint)).await.unwrap();

        assert_eq!(endpoint.queries.lock().unwrap().as_slice(), ["  padded  "]);
        assert_eq!(session.snapshot().history()[0].query(), "  padded  ");
    }

    #[tokio::test]
    async fn test_loading_while_in_flight_and_second_submit_refused() {
        let store = SessionStore::new();
        let session = store.create();
        let (tx, rx) = oneshot::channel();
        let endpoint = Arc::new(GatedEndpoint {
            gate: Mutex::new(Some(rx)),
        });

        let task = {
            let session = session.clone();
            let endpoint = Arc::clone(&endpoint);
            tokio::spawn(async move { session.submit("slow", endpoint).await })
        };

        while !session.is_loading() {
            tokio::task::yield_now().await;
        }

        let refused = session.submit("again", Arc::clone(&endpoint)).await.unwrap_err();
        assert_eq!(refused.kind(), ErrorKind::Busy);
        assert!(session.is_loading());
        assert!(session.snapshot().error_message().is_none());
        assert_eq!(session.snapshot().draft_query(), "slow");

        tx.send("done".to_string()).unwrap();
        let turn = task.await.unwrap().unwrap();

        assert_eq!(turn.response(), "done");
        assert!(!session.is_loading());
        assert_eq!(session.history_len(), 1);
    }

    #[tokio::test]
    async fn test_dropped_submit_still_settles() {
        let store = SessionStore::new();
        let session = store.create();
        let (tx, rx) = oneshot::channel();
        let endpoint = Arc::new(GatedEndpoint {
            gate: Mutex::new(Some(rx)),
        });

        let dropped =
            tokio::time::timeout(Duration::from_millis(20), session.submit("hello", endpoint)).await;
        assert!(dropped.is_err());
        assert!(session.is_loading());

        tx.send("late".to_string()).unwrap();
        for _ in 0..100 {
            if !session.is_loading() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert!(!session.is_loading());
        assert_eq!(session.snapshot().history(), &[Turn::new("hello", "late")]);

        let next = Arc::new(ScriptedEndpoint::replying(vec![Ok("again".into())]));
        session.submit("more", next).await.unwrap();
        assert_eq!(session.history_len(), 2);
    }

    #[tokio::test]
    async fn test_dropped_submit_with_abandoned_request_fails_and_expires() {
        let store = SessionStore::new();
        let session = store.create();
        let (tx, rx) = oneshot::channel::<String>();
        let endpoint = Arc::new(GatedEndpoint {
            gate: Mutex::new(Some(rx)),
        });

        let dropped =
            tokio::time::timeout(Duration::from_millis(20), session.submit("hello", endpoint)).await;
        assert!(dropped.is_err());

        drop(tx);
        for _ in 0..100 {
            if !session.is_loading() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let state = session.snapshot();
        assert!(!state.is_loading());
        assert_eq!(state.error_message(), Some(TRANSPORT_FAILURE_MESSAGE));
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(store.cleanup_expired_with_timeout(Duration::ZERO), 1);
    }

    /// Endpoint whose request task panics.
    #[derive(Debug)]
    struct PanickingEndpoint;

    #[async_trait::async_trait]
    impl ChatEndpoint for PanickingEndpoint {
        async fn ask(&self, _query: &str) -> Result<String, ChatError> {
            panic!("endpoint blew up");
        }
    }

    #[tokio::test]
    async fn test_panicking_request_clears_loading() {
        let store = SessionStore::new();
        let session = store.create();

        let err = session
            .submit("boom", Arc::new(PanickingEndpoint))
            .await
            .unwrap_err();

        assert!(matches!(err, ChatError::Task(_)));
        assert_eq!(err.kind(), ErrorKind::Transport);
        let state = session.snapshot();
        assert!(!state.is_loading());
        assert_eq!(state.error_message(), Some(TRANSPORT_FAILURE_MESSAGE));
        assert_eq!(state.draft_query(), "boom");
    }

    #[tokio::test]
    async fn test_retry_after_failure_succeeds() {
        let store = SessionStore::new();
        let session = store.create();
        let endpoint = Arc::new(ScriptedEndpoint::replying(vec![
            Err(ChatError::Status { status: 502 }),
            Ok("second time lucky".into()),
        ]));

        assert!(session.submit("q", Arc::clone(&endpoint)).await.is_err());
        session.submit("q", Arc::clone(&endpoint)).await.unwrap();

        let state = session.snapshot();
        assert!(state.error_message().is_none());
        assert_eq!(state.history(), &[Turn::new("q", "second time lucky")]);
        assert_eq!(endpoint.calls(), 2);
    }

    #[test]
    fn test_session_store() {
        let store = SessionStore::new();
        assert!(store.is_empty());

        let session = store.create();
        assert_eq!(store.len(), 1);

        let retrieved = store.get(session.id()).unwrap();
        assert_eq!(retrieved.id(), session.id());

        retrieved.edit_draft("shared");
        assert_eq!(session.snapshot().draft_query(), "shared");

        assert!(store.remove(session.id()).is_some());
        assert!(store.is_empty());
        assert!(store.get(session.id()).is_none());
    }

    #[test]
    fn test_cleanup_expired() {
        let store = SessionStore::new();
        let _ = store.create();
        let _ = store.create();

        assert_eq!(store.cleanup_expired_with_timeout(DEFAULT_SESSION_TIMEOUT), 0);
        assert_eq!(store.len(), 2);

        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(store.cleanup_expired_with_timeout(Duration::ZERO), 2);
        assert!(store.is_empty());
    }
}
