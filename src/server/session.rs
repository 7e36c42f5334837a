// Session management for concurrent chat clients

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use uuid::Uuid;

use crate::llm::ChatTurn;

/// Per-session conversation state.
///
/// Sessions hold request-scoped context only; nothing here survives a
/// process restart.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Unique session identifier
    pub id: String,
    /// Conversation turns, oldest first
    pub turns: Vec<ChatTurn>,
    /// Session creation time
    pub created_at: DateTime<Utc>,
    /// Last activity timestamp
    pub last_activity: DateTime<Utc>,
}

impl SessionState {
    /// Create a new session.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            turns: Vec::new(),
            created_at: Utc::now(),
            last_activity: Utc::now(),
        }
    }

    /// Append a turn to the conversation.
    pub fn push_turn(&mut self, turn: ChatTurn) {
        self.turns.push(turn);
    }

    /// The most recent turns, capped at `max` for prompt building.
    ///
    /// Older turns stay in the session until it expires but never reach the
    /// provider.
    pub fn recent_turns(&self, max: usize) -> &[ChatTurn] {
        let start = self.turns.len().saturating_sub(max);
        &self.turns[start..]
    }

    /// Update last activity timestamp.
    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Check if session has expired.
    pub fn is_expired(&self, timeout_minutes: u64) -> bool {
        let elapsed = Utc::now().signed_duration_since(self.last_activity);
        elapsed.num_minutes() >= timeout_minutes as i64
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Concurrent session manager using DashMap.
pub struct SessionManager {
    /// Active sessions (thread-safe concurrent HashMap)
    sessions: Arc<DashMap<String, SessionState>>,
    /// Maximum number of concurrent sessions
    max_sessions: usize,
    /// Session timeout in minutes
    timeout_minutes: u64,
}

impl SessionManager {
    /// Create a new session manager and start its cleanup task.
    pub fn new(max_sessions: usize, timeout_minutes: u64) -> Self {
        let manager = Self {
            sessions: Arc::new(DashMap::new()),
            max_sessions,
            timeout_minutes,
        };

        manager.start_cleanup_task();

        manager
    }

    /// Get an existing session by id, or create a fresh one.
    pub fn get_or_create(&self, session_id: Option<&str>) -> anyhow::Result<SessionState> {
        if let Some(id) = session_id {
            if let Some(mut session) = self.sessions.get_mut(id) {
                session.touch();
                return Ok(session.clone());
            }
            // Unknown id: fall through and create a new session.
        }

        if self.sessions.len() >= self.max_sessions {
            anyhow::bail!(
                "Maximum session limit reached ({}/{})",
                self.sessions.len(),
                self.max_sessions
            );
        }

        let session = SessionState::new();
        let id = session.id.clone();
        self.sessions.insert(id.clone(), session.clone());

        tracing::info!(session_id = %id, "Created new session");
        Ok(session)
    }

    /// Look up a session without creating one.
    pub fn get(&self, session_id: &str) -> Option<SessionState> {
        self.sessions.get(session_id).map(|entry| entry.clone())
    }

    /// Replace a session's stored state.
    pub fn update(&self, session_id: &str, session: SessionState) -> anyhow::Result<()> {
        if let Some(mut entry) = self.sessions.get_mut(session_id) {
            *entry = session;
            Ok(())
        } else {
            anyhow::bail!("Session not found: {}", session_id)
        }
    }

    /// Delete a session.
    pub fn delete(&self, session_id: &str) -> bool {
        self.sessions.remove(session_id).is_some()
    }

    /// Get active session count.
    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }

    /// Start the background cleanup task removing expired sessions.
    fn start_cleanup_task(&self) {
        let sessions = Arc::clone(&self.sessions);
        let timeout_minutes = self.timeout_minutes;

        tokio::spawn(async move {
            let mut interval = time::interval(Duration::from_secs(60));

            loop {
                interval.tick().await;
                cleanup_expired(&sessions, timeout_minutes);
            }
        });
    }
}

/// Remove every session idle for longer than the timeout.
fn cleanup_expired(sessions: &DashMap<String, SessionState>, timeout_minutes: u64) {
    let expired: Vec<String> = sessions
        .iter()
        .filter(|entry| entry.value().is_expired(timeout_minutes))
        .map(|entry| entry.key().clone())
        .collect();

    let mut removed = 0;
    for session_id in expired {
        if sessions.remove(&session_id).is_some() {
            removed += 1;
            tracing::debug!(session_id = %session_id, "Removed expired session");
        }
    }

    if removed > 0 {
        tracing::info!(
            removed,
            active = sessions.len(),
            "Cleaned up expired sessions"
        );
    }
}
