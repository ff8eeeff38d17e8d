//! Process configuration, read from the environment once at startup.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::gateway::retry::RetryPolicy;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEV_SESSION_SECRET: &str = "world-domination-dev-secret";

/// Where the user and score stores keep their data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Storage {
    Memory,
    Directory(PathBuf),
}

impl Storage {
    /// `memory://` (or empty) keeps everything in process; a plain path or a
    /// `file://` URL is a journal directory. Other URL schemes are not served.
    pub fn parse(url: &str) -> Storage {
        let url = url.trim();
        if url.is_empty() || url.starts_with("memory:") {
            return Storage::Memory;
        }
        if let Some(path) = url.strip_prefix("file://") {
            return Storage::Directory(PathBuf::from(path));
        }
        if let Some((scheme, _)) = url.split_once("://") {
            log::warn!("DATABASE_URL scheme {scheme:?} is not supported; keeping data in memory");
            return Storage::Memory;
        }
        Storage::Directory(PathBuf::from(url))
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub model_base_url: String,
    pub storage: Storage,
    pub session_secret: String,
    pub session_ttl: Duration,
    pub ai_max_attempts: u32,
    pub ai_retry_base: Duration,
    pub ai_timeout: Duration,
    pub bcrypt_cost: u32,
    pub game_duration: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            model_base_url: DEFAULT_BASE_URL.to_string(),
            storage: Storage::Memory,
            session_secret: DEV_SESSION_SECRET.to_string(),
            session_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            ai_max_attempts: 3,
            ai_retry_base: Duration::from_millis(1000),
            ai_timeout: Duration::from_secs(60),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            game_duration: crate::world::GAME_DURATION,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = AppConfig::default();
        let session_secret = match env_any(&["SESSION_SECRET", "JWT_SECRET"]) {
            Some(secret) => secret,
            None => {
                log::warn!("SESSION_SECRET not set; falling back to the development secret");
                defaults.session_secret.clone()
            }
        };
        AppConfig {
            api_key: env_any(&["GEMINI_API_KEY", "API_KEY"]),
            model: env_any(&["GEMINI_MODEL"]).unwrap_or(defaults.model),
            model_base_url: env_any(&["GEMINI_BASE_URL"]).unwrap_or(defaults.model_base_url),
            storage: env_any(&["DATABASE_URL"])
                .map(|url| Storage::parse(&url))
                .unwrap_or(defaults.storage),
            session_secret,
            session_ttl: Duration::from_secs(parse_or(
                "SESSION_TTL_SECS",
                defaults.session_ttl.as_secs(),
            )),
            ai_max_attempts: parse_or("AI_MAX_ATTEMPTS", defaults.ai_max_attempts).max(1),
            ai_retry_base: Duration::from_millis(parse_or(
                "AI_RETRY_BASE_MS",
                defaults.ai_retry_base.as_millis() as u64,
            )),
            ai_timeout: Duration::from_secs(parse_or(
                "AI_TIMEOUT_SECS",
                defaults.ai_timeout.as_secs(),
            )),
            bcrypt_cost: parse_or("BCRYPT_COST", defaults.bcrypt_cost).clamp(4, 31),
            game_duration: Duration::from_secs(parse_or(
                "GAME_DURATION_SECS",
                defaults.game_duration.as_secs(),
            )),
        }
    }

    /// In-memory stores, the cheapest bcrypt cost and near-instant retries.
    pub fn for_tests() -> Self {
        AppConfig {
            api_key: Some("test-key".to_string()),
            bcrypt_cost: 4,
            ai_retry_base: Duration::from_millis(5),
            ai_timeout: Duration::from_secs(5),
            session_secret: "test-secret".to_string(),
            ..AppConfig::default()
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.ai_max_attempts,
            base_delay: self.ai_retry_base,
            deadline: self.ai_timeout,
        }
    }
}

fn env_any(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.trim().is_empty())
}

fn parse_or<T: FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                log::warn!("{name}={raw:?} is not a valid value; using {default}");
                default
            }
        },
        Err(_) => default,
    }
}
