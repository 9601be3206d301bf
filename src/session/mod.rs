//! In-memory per-session generation history.
//!
//! Each session keeps a bounded window of recent generations; appending
//! past the window evicts the oldest entry. Entries for one session are
//! serialized through that session's lock, so concurrent appends never
//! interleave within a window.


use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub request_text: String,
    pub generated_template: String,
    pub compliance_score: f64,
    pub created_at: DateTime<Utc>,
}

type History = Arc<Mutex<VecDeque<HistoryEntry>>>;

pub struct SessionStore {
    sessions: RwLock<HashMap<String, History>>,
    window: usize,
}

impl SessionStore {
    #[inline]
    pub fn new(window: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            window: window.max(1),
        }
    }

    async fn history_for(&self, session_id: &str) -> History {
        {
            let sessions = self.sessions.read().await;
            if let Some(history) = sessions.get(session_id) {
                return Arc::clone(history);
            }
        }

        let mut sessions = self.sessions.write().await;
        Arc::clone(
            sessions
                .entry(session_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(VecDeque::new()))),
        )
    }

    /// Append an entry, evicting the oldest when the window is full.
    pub async fn append(&self, session_id: &str, entry: HistoryEntry) {
        let history = self.history_for(session_id).await;
        let mut history = history.lock().await;

        if history.len() == self.window {
            history.pop_front();
        }
        history.push_back(entry);

        debug!(
            "Session '{}' history now holds {} entries",
            session_id,
            history.len()
        );
    }

    /// Snapshot of the session's history, oldest first. Unknown sessions
    /// yield an empty history.
    pub async fn history(&self, session_id: &str) -> Vec<HistoryEntry> {
        let sessions = self.sessions.read().await;
        match sessions.get(session_id) {
            Some(history) => history.lock().await.iter().cloned().collect(),
            None => Vec::new(),
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
