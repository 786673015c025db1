//! Estate Intelligence
//!
//! Backend for the Cubana Millennium City marketing site:
//! - Deterministic price projection over an injected growth curve and
//!   currency rate table
//! - A concierge relay holding one ongoing conversation with Gemini,
//!   degrading to fixed replies whenever the upstream fails
//! - An axum API serving both to the frontend

pub mod api;
pub mod catalog;
pub mod concierge;
pub mod config;
pub mod error;
pub mod gemini;
pub mod models;
pub mod projection;

pub use error::{EstateError, Result};

// Re-export common types
pub use models::*;
pub use projection::ProjectionEngine;
pub use concierge::{ConciergeRelay, Conversation, Persona, Responder};
