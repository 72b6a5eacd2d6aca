// Chat session domain model
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::intent::QueryIntent;

#[derive(Debug, Clone, Serialize)]
pub struct ChatTurn {
    pub query: String,
    pub intent: QueryIntent,
    pub reply: String,
    pub at: DateTime<Utc>,
}

/// Per-user conversation state, handed explicitly to the chat service.
/// Only the most recent `max_history` turns are kept.
#[derive(Debug, Clone, Serialize)]
pub struct ChatSession {
    pub id: String,
    pub history: Vec<ChatTurn>,
    #[serde(skip)]
    max_history: usize,
}

impl ChatSession {
    pub fn with_history_limit(id: String, max_history: usize) -> Self {
        Self {
            id,
            history: Vec::new(),
            max_history: max_history.max(1),
        }
    }

    pub fn record(&mut self, query: &str, intent: QueryIntent, reply: &str) {
        self.history.push(ChatTurn {
            query: query.to_string(),
            intent,
            reply: reply.to_string(),
            at: Utc::now(),
        });
        if self.history.len() > self.max_history {
            let excess = self.history.len() - self.max_history;
            self.history.drain(..excess);
        }
    }
}
