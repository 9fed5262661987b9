//! Per-user contexts with lazy creation and idle eviction.

use super::state::SessionState;
use crate::agent::ConversationMemory;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

/// Chat platform user id.
pub type UserId = i64;

/// Everything the bot keeps about one user.
#[derive(Debug)]
pub struct UserContext {
    pub state: SessionState,
    pub memory: ConversationMemory,
    last_seen: Instant,
}

impl UserContext {
    fn new(memory_capacity: usize) -> Self {
        Self {
            state: SessionState::new(),
            memory: ConversationMemory::new(memory_capacity),
            last_seen: Instant::now(),
        }
    }

    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    /// Drop the session state and the conversation history.
    pub fn clear(&mut self) {
        self.state.reset();
        self.memory.clear();
    }
}

/// Shared handle to one user's context.
///
/// Holding the lock for a whole event keeps at most one invocation per user
/// in flight.
pub type SharedContext = Arc<Mutex<UserContext>>;

pub struct SessionStore {
    users: Mutex<HashMap<UserId, SharedContext>>,
    memory_capacity: usize,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(memory_capacity: usize, idle_timeout: Duration) -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
            memory_capacity,
            idle_timeout,
        }
    }

    /// The context for `user`, created on first contact.
    pub async fn context(&self, user: UserId) -> SharedContext {
        let mut users = self.users.lock().await;
        users
            .entry(user)
            .or_insert_with(|| {
                debug!("New session for user {}", user);
                Arc::new(Mutex::new(UserContext::new(self.memory_capacity)))
            })
            .clone()
    }

    /// Drop contexts idle for longer than the timeout.
    ///
    /// A context is in use while any handle besides the map's exists, locked
    /// or not; those are kept.
    pub async fn evict_idle(&self) -> usize {
        let mut users = self.users.lock().await;
        let before = users.len();
        let timeout = self.idle_timeout;
        users.retain(|_, ctx| {
            if Arc::strong_count(ctx) > 1 {
                return true;
            }
            match ctx.try_lock() {
                Ok(guard) => guard.last_seen.elapsed() < timeout,
                Err(_) => true,
            }
        });
        let evicted = before - users.len();
        if evicted > 0 {
            debug!("Evicted {} idle session(s)", evicted);
        }
        evicted
    }

    /// Forget `user`'s context unless another event still holds it.
    pub async fn remove(&self, user: UserId) -> bool {
        let mut users = self.users.lock().await;
        match users.get(&user) {
            Some(ctx) if Arc::strong_count(ctx) == 1 => users.remove(&user).is_some(),
            _ => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.users.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.lock().await.is_empty()
    }
}
