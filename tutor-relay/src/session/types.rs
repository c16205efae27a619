//! Conversation turns and the per-session turn sequence.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// Topic-priming instruction, always the first turn of a session
    Priming,
    /// Student message
    User,
    /// Model (or canned) reply
    Assistant,
}

impl TurnRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Priming => "priming",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One message in a conversation. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    role: TurnRole,
    text: String,
}

impl Turn {
    pub fn new(role: TurnRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    pub fn priming(text: impl Into<String>) -> Self {
        Self::new(TurnRole::Priming, text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(TurnRole::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, text)
    }

    pub fn role(&self) -> TurnRole {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Server-held conversation context for one session identifier.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    turns: Vec<Turn>,
    pub created_at: DateTime<Utc>,
    pub last_touched: DateTime<Utc>,
}

impl Session {
    /// Create a session whose first turn is the priming instruction.
    pub fn primed(id: impl Into<String>, priming_text: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            turns: vec![Turn::priming(priming_text)],
            created_at: now,
            last_touched: now,
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Whether the priming turn is still at index 0.
    pub fn is_primed(&self) -> bool {
        self.turns
            .first()
            .is_some_and(|t| t.role() == TurnRole::Priming)
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// The last `n` turns.
    pub fn recent(&self, n: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }

    /// Trim the sequence to at most `max_turns` turns.
    ///
    /// The priming turn is pinned: it stays at index 0 and the remaining
    /// `max_turns - 1` slots hold the most recent turns. Returns the number
    /// of evicted turns.
    pub fn enforce_ceiling(&mut self, max_turns: usize) -> usize {
        let len = self.turns.len();
        if len <= max_turns {
            return 0;
        }

        if max_turns == 0 {
            self.turns.clear();
            return len;
        }

        if self.is_primed() {
            let keep_recent = max_turns - 1;
            let drain_end = len - keep_recent;
            self.turns.drain(1..drain_end);
        } else {
            self.turns.drain(..len - max_turns);
        }

        len - self.turns.len()
    }

    /// Update last activity timestamp.
    pub fn touch(&mut self) {
        self.last_touched = Utc::now();
    }

    /// Check if the session has been untouched for longer than `max_idle_secs`.
    pub fn is_idle(&self, max_idle_secs: i64) -> bool {
        Utc::now() - self.last_touched > Duration::seconds(max_idle_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with_exchanges(exchanges: usize) -> Session {
        let mut session = Session::primed("s1", "prime");
        for i in 0..exchanges {
            session.push(Turn::user(format!("q{i}")));
            session.push(Turn::assistant(format!("a{i}")));
        }
        session
    }

    #[test]
    fn test_primed_session_starts_with_priming_turn() {
        let session = Session::primed("abc", "prime");
        assert_eq!(session.len(), 1);
        assert!(session.is_primed());
        assert_eq!(session.turns()[0].text(), "prime");
    }

    #[test]
    fn test_ceiling_noop_when_under_limit() {
        let mut session = session_with_exchanges(2);
        assert_eq!(session.enforce_ceiling(10), 0);
        assert_eq!(session.len(), 5);
    }

    #[test]
    fn test_ceiling_pins_priming_turn() {
        let mut session = session_with_exchanges(6);
        assert_eq!(session.len(), 13);

        let evicted = session.enforce_ceiling(10);
        assert_eq!(evicted, 3);
        assert_eq!(session.len(), 10);
        assert!(session.is_primed());

        // Most recent nine turns survive in order.
        let texts: Vec<&str> = session.turns()[1..].iter().map(Turn::text).collect();
        assert_eq!(texts, ["a1", "q2", "a2", "q3", "a3", "q4", "a4", "q5", "a5"]);
    }

    #[test]
    fn test_ceiling_without_priming_keeps_tail() {
        let mut session = Session::primed("s", "prime");
        session.enforce_ceiling(0);
        for i in 0..5 {
            session.push(Turn::user(format!("q{i}")));
        }
        session.enforce_ceiling(3);
        let texts: Vec<&str> = session.turns().iter().map(Turn::text).collect();
        assert_eq!(texts, ["q2", "q3", "q4"]);
    }

    #[test]
    fn test_recent_window() {
        let session = session_with_exchanges(3);
        let recent = session.recent(4);
        assert_eq!(recent.len(), 4);
        assert_eq!(recent[0].text(), "q1");
        assert_eq!(session.recent(100).len(), session.len());
    }

    #[test]
    fn test_idle_detection() {
        let mut session = Session::primed("s", "prime");
        assert!(!session.is_idle(60));

        session.last_touched = Utc::now() - Duration::seconds(120);
        assert!(session.is_idle(60));

        session.touch();
        assert!(!session.is_idle(60));
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&Turn::assistant("ok")).unwrap();
        assert!(json.contains("\"assistant\""));
    }
}
