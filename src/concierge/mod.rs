//! Concierge session relay
//!
//! Keeps one ongoing conversation with an external responder and relays
//! visitor messages into it. Every failure degrades to a fixed,
//! presentable string; `send` never returns an error.

use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub mod session;
pub use session::{ConciergeSession, SessionRegistry};

/// First transcript entry shown to a visitor
pub const GREETING: &str = "Welcome to Cubana Millennium City. I am your personal concierge. How may I assist you with your investment today?";

/// Substituted when the responder answers with nothing
pub const EMPTY_REPLY: &str = "I apologize, I am momentarily distracted by the beauty of the estate. Could you please repeat that?";

/// Returned on any upstream failure
pub const FALLBACK_REPLY: &str = "I am currently experiencing a high volume of VIP inquiries. Please try again in a moment.";

pub const DEFAULT_TEMPERATURE: f32 = 0.7;

const SYSTEM_INSTRUCTION: &str = r#"You are the "Millennium Concierge", a highly sophisticated, polite, and knowledgeable AI assistant for the Cubana Millennium City real estate project in Asaba, Nigeria.
Your tone is luxurious, professional, and inviting. You represent the brand of Obi Cubana.

Key Facts to Know:
- Project Name: Cubana Millennium City.
- Location: Asaba, Delta State, near the famous Witchtech Junction.
- Completion Date: Vision 2026.
- Key Features: Monstrous City Gate, 24/7 Power, Advanced Security, Commercial Hubs, International School.
- Vibe: "Where Legacy Meets Luxury". Modern, tech-enabled, secure.
- Pricing: Premium. Plots range from 500sqm to 1000sqm.
- Goal: Convert the user into a lead by answering their questions and gently encouraging them to "Book a Virtual Tour" or "Request Exclusive Access".

Do not make up false pricing if not strictly known, give ranges or ask them to contact sales for the latest catalogue.
Keep responses concise (under 100 words) unless asked for details."#;

/// Instruction payload and sampling temperature a conversation is created with
#[derive(Debug, Clone, PartialEq)]
pub struct Persona {
    pub instruction: String,
    pub temperature: f32,
}

impl Default for Persona {
    fn default() -> Self {
        Self {
            instruction: SYSTEM_INSTRUCTION.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// Creates conversation handles with the external responder
#[async_trait]
pub trait Responder: Send + Sync {
    async fn create_conversation(&self, persona: &Persona) -> Result<Box<dyn Conversation>>;
}

/// An ongoing multi-turn exchange held by the responder
#[async_trait]
pub trait Conversation: Send + Sync {
    /// Send the next turn. `Ok(None)` means the responder produced no text.
    async fn turn(&mut self, text: &str) -> Result<Option<String>>;
}

enum RelayState {
    Uninitialized,
    Active(Box<dyn Conversation>),
    Degraded { reason: String },
}

impl RelayState {
    fn name(&self) -> &'static str {
        match self {
            RelayState::Uninitialized => "uninitialized",
            RelayState::Active(_) => "active",
            RelayState::Degraded { .. } => "degraded",
        }
    }
}

/// Relay over a single lazily created conversation handle.
///
/// `send` takes `&mut self`, so one relay only ever has one turn in flight.
pub struct ConciergeRelay {
    responder: Arc<dyn Responder>,
    persona: Persona,
    state: RelayState,
}

impl ConciergeRelay {
    pub fn new(responder: Arc<dyn Responder>) -> Self {
        Self::with_persona(responder, Persona::default())
    }

    pub fn with_persona(responder: Arc<dyn Responder>, persona: Persona) -> Self {
        Self {
            responder,
            persona,
            state: RelayState::Uninitialized,
        }
    }

    pub fn state_name(&self) -> &'static str {
        self.state.name()
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, RelayState::Active(_))
    }

    /// Last handle creation failure, while degraded
    pub fn degraded_reason(&self) -> Option<&str> {
        match &self.state {
            RelayState::Degraded { reason } => Some(reason),
            _ => None,
        }
    }

    /// Relay `text` as the next turn and return the reply or a fixed fallback
    pub async fn send(&mut self, text: &str) -> String {
        if text.trim().is_empty() {
            debug!("Ignoring blank concierge message");
            return EMPTY_REPLY.to_string();
        }

        let Some(conversation) = self.ensure_conversation().await else {
            return FALLBACK_REPLY.to_string();
        };

        match conversation.turn(text).await {
            Ok(Some(reply)) if !reply.is_empty() => reply,
            Ok(_) => {
                debug!("Responder returned an empty reply");
                EMPTY_REPLY.to_string()
            }
            Err(e) => {
                // The handle is kept; the next send retries on it.
                warn!("Concierge turn failed: {}", e);
                FALLBACK_REPLY.to_string()
            }
        }
    }

    async fn ensure_conversation(&mut self) -> Option<&mut Box<dyn Conversation>> {
        if !self.is_active() {
            match self.responder.create_conversation(&self.persona).await {
                Ok(conversation) => {
                    info!("Concierge conversation established (was {})", self.state.name());
                    self.state = RelayState::Active(conversation);
                }
                Err(e) => {
                    warn!("Concierge conversation unavailable: {}", e);
                    self.state = RelayState::Degraded {
                        reason: e.to_string(),
                    };
                    return None;
                }
            }
        }

        match &mut self.state {
            RelayState::Active(conversation) => Some(conversation),
            _ => None,
        }
    }
}
