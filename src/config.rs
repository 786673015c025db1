//! Runtime configuration
//!
//! Read from the process environment after `.env` has been loaded.

use crate::catalog::Catalog;
use crate::concierge::session::DEFAULT_MAX_SESSIONS;
use crate::error::EstateError;
use crate::gemini::DEFAULT_HISTORY_TURNS;
use crate::Result;
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub port: u16,
    pub catalog_path: Option<PathBuf>,
    pub max_sessions: usize,
    pub history_turns: usize,
}

impl AppConfig {
    /// Load `.env` (if present) and read configuration from the environment
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let gemini_api_key = env::var("GEMINI_API_KEY").unwrap_or_default();
        if gemini_api_key.trim().is_empty() {
            warn!("GEMINI_API_KEY is missing. Concierge replies will use the fallback message.");
        }

        let port = match env::var("PORT").or_else(|_| env::var("API_PORT")) {
            Ok(raw) => parse_setting("port", &raw)?,
            Err(_) => DEFAULT_PORT,
        };

        let max_sessions = match env::var("CONCIERGE_MAX_SESSIONS") {
            Ok(raw) => parse_setting("CONCIERGE_MAX_SESSIONS", &raw)?,
            Err(_) => DEFAULT_MAX_SESSIONS,
        };

        let history_turns = match env::var("CONCIERGE_HISTORY_TURNS") {
            Ok(raw) => parse_setting("CONCIERGE_HISTORY_TURNS", &raw)?,
            Err(_) => DEFAULT_HISTORY_TURNS,
        };

        let catalog_path = env::var("CATALOG_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            gemini_api_key,
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_base_url: env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_string()),
            port,
            catalog_path,
            max_sessions,
            history_turns,
        })
    }

    /// The configured catalog file, or the built-in catalog when none is set
    pub fn load_catalog(&self) -> Result<Catalog> {
        match &self.catalog_path {
            Some(path) => {
                info!("Loading catalog from {}", path.display());
                Catalog::from_path(path)
            }
            None => {
                info!("Using built-in catalog");
                Ok(Catalog::default())
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: String::new(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            port: DEFAULT_PORT,
            catalog_path: None,
            max_sessions: DEFAULT_MAX_SESSIONS,
            history_turns: DEFAULT_HISTORY_TURNS,
        }
    }
}

fn parse_setting<T>(name: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| EstateError::Config(format!("invalid {} {:?}: {}", name, raw, e)))
}
