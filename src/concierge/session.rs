//! Visitor-facing concierge sessions
//!
//! A session pairs one relay with the caller-side transcript. The registry
//! keys sessions by visitor chat id.

use super::{ConciergeRelay, Responder, GREETING};
use crate::error::EstateError;
use crate::models::ChatMessage;
use crate::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

pub struct ConciergeSession {
    relay: ConciergeRelay,
    transcript: Vec<ChatMessage>,
}

impl ConciergeSession {
    pub fn new(relay: ConciergeRelay) -> Self {
        Self {
            relay,
            transcript: vec![ChatMessage::model(GREETING)],
        }
    }

    /// Append the visitor message, relay it, append the reply
    pub async fn send(&mut self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Err(EstateError::InvalidInput("message must not be empty".to_string()));
        }

        self.transcript.push(ChatMessage::user(text));
        let reply = self.relay.send(text).await;
        self.transcript.push(ChatMessage::model(reply.clone()));

        Ok(reply)
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn relay(&self) -> &ConciergeRelay {
        &self.relay
    }
}

pub const DEFAULT_MAX_SESSIONS: usize = 1024;

struct SessionEntry {
    session: Arc<Mutex<ConciergeSession>>,
    last_used: u64,
}

#[derive(Default)]
struct Sessions {
    entries: HashMap<Uuid, SessionEntry>,
    clock: u64,
}

impl Sessions {
    fn touch(&mut self, chat_id: Uuid) -> Option<Arc<Mutex<ConciergeSession>>> {
        self.clock += 1;
        let now = self.clock;
        self.entries.get_mut(&chat_id).map(|entry| {
            entry.last_used = now;
            Arc::clone(&entry.session)
        })
    }

    fn evict_least_recent(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(id, _)| *id);

        if let Some(id) = oldest {
            // A send still in flight keeps its own Arc to the session.
            self.entries.remove(&id);
            debug!("Evicted concierge session {}", id);
        }
    }
}

/// In-memory sessions keyed by chat id, capped at `max_sessions` with the
/// least recently used session evicted first.
pub struct SessionRegistry {
    responder: Arc<dyn Responder>,
    max_sessions: usize,
    sessions: Mutex<Sessions>,
}

impl SessionRegistry {
    pub fn new(responder: Arc<dyn Responder>) -> Self {
        Self::with_max_sessions(responder, DEFAULT_MAX_SESSIONS)
    }

    pub fn with_max_sessions(responder: Arc<dyn Responder>, max_sessions: usize) -> Self {
        Self {
            responder,
            max_sessions: max_sessions.max(1),
            sessions: Mutex::new(Sessions::default()),
        }
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    pub async fn get(&self, chat_id: Uuid) -> Option<Arc<Mutex<ConciergeSession>>> {
        self.sessions.lock().await.touch(chat_id)
    }

    pub async fn get_or_create(&self, chat_id: Uuid) -> Arc<Mutex<ConciergeSession>> {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.touch(chat_id) {
            return session;
        }

        while sessions.entries.len() >= self.max_sessions {
            sessions.evict_least_recent();
        }

        info!("Opening concierge session {}", chat_id);
        let relay = ConciergeRelay::new(Arc::clone(&self.responder));
        let session = Arc::new(Mutex::new(ConciergeSession::new(relay)));
        let last_used = sessions.clock;
        sessions.entries.insert(
            chat_id,
            SessionEntry {
                session: Arc::clone(&session),
                last_used,
            },
        );

        session
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Parse a chat id, deriving a stable UUID from non-UUID strings and
/// minting a fresh one when none is given.
pub fn resolve_chat_id(value: Option<&str>) -> Uuid {
    match value {
        Some(v) if !v.trim().is_empty() => {
            Uuid::parse_str(v.trim()).unwrap_or_else(|_| stable_uuid_from_string(v.trim()))
        }
        _ => Uuid::new_v4(),
    }
}

fn stable_uuid_from_string(input: &str) -> Uuid {
    use sha2::{Digest, Sha256};

    let hash = Sha256::digest(input.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hash[..16]);

    // Set UUID version (4) and variant (RFC4122) bits.
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    Uuid::from_bytes(bytes)
}
