//! Bounded conversation history.

use chrono::{DateTime, Utc};
use std::collections::VecDeque;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    pub at: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            at: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Fixed-capacity FIFO of turns. The oldest turn is dropped on overflow.
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    turns: VecDeque<ConversationTurn>,
    capacity: usize,
}

impl ConversationMemory {
    pub fn new(capacity: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn append(&mut self, turn: ConversationTurn) {
        if self.capacity == 0 {
            return;
        }
        while self.turns.len() >= self.capacity {
            self.turns.pop_front();
        }
        self.turns.push_back(turn);
    }

    /// Turns oldest first.
    pub fn snapshot(&self) -> Vec<ConversationTurn> {
        self.turns.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overflow_keeps_most_recent_in_order() {
        let mut memory = ConversationMemory::new(4);
        for i in 0..7 {
            memory.append(ConversationTurn::user(format!("m{}", i)));
        }
        let contents: Vec<_> = memory.snapshot().into_iter().map(|t| t.content).collect();
        assert_eq!(contents, vec!["m3", "m4", "m5", "m6"]);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut memory = ConversationMemory::new(2);
        memory.append(ConversationTurn::user("hi"));
        let snapshot = memory.snapshot();
        memory.append(ConversationTurn::assistant("hello"));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(memory.len(), 2);
    }

    #[test]
    fn test_clear_and_zero_capacity() {
        let mut memory = ConversationMemory::new(3);
        memory.append(ConversationTurn::new(Role::Tool, "✅ done"));
        memory.clear();
        assert!(memory.is_empty());

        let mut none = ConversationMemory::new(0);
        none.append(ConversationTurn::user("x"));
        assert!(none.is_empty());
    }
}
