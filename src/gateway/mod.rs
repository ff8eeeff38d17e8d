//! AI Gateway: prompt in, validated game data out.
//!
//! Every call is a fresh request to the external model. Each attempt covers both
//! the request and the parse of its reply, so a malformed reply is retried the
//! same way an overloaded upstream is. Nothing is persisted here.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::game::{Choice, Difficulty, GameState, ScoreDetails, StartingCivilizations, TurnResponse};

pub mod client;
pub mod prompts;
pub mod retry;
pub mod schema;

pub use client::{GeminiClient, ModelClient, ModelRequest};
pub use retry::RetryPolicy;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("model API returned HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("received malformed JSON from the model: {0}")]
    MalformedResponse(String),
    #[error("could not reach the model API: {0}")]
    Transport(String),
    #[error("model call did not finish within {0:?}")]
    Timeout(Duration),
    #[error("no API key configured for the model")]
    MissingApiKey,
    #[error("could not serialize prompt input: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GatewayError {
    pub fn is_retriable(&self) -> bool {
        match self {
            GatewayError::Http { status, .. } => *status == 429 || *status == 503,
            GatewayError::MalformedResponse(_) => true,
            _ => false,
        }
    }

    /// Upstream asked us to back off and kept doing so until we gave up.
    pub fn is_overloaded(&self) -> bool {
        matches!(self, GatewayError::Http { status: 429 | 503, .. })
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        GatewayError::Transport(e.to_string())
    }
}

/// Removes a surrounding markdown code fence, if the model added one.
pub fn strip_code_fence(text: &str) -> &str {
    let mut s = text.trim();
    if let Some(rest) = s.strip_prefix("```json") {
        s = rest;
    } else if let Some(rest) = s.strip_prefix("```") {
        s = rest;
    }
    if let Some(rest) = s.trim_end().strip_suffix("```") {
        s = rest;
    }
    s.trim()
}

pub fn parse_model_json<T: DeserializeOwned>(text: &str) -> Result<T, GatewayError> {
    let cleaned = strip_code_fence(text);
    serde_json::from_str(cleaned).map_err(|e| {
        let excerpt: String = cleaned.chars().take(500).collect();
        log::error!("failed to parse model JSON ({e}): {excerpt}");
        GatewayError::MalformedResponse(e.to_string())
    })
}

fn parse_turn(text: &str) -> Result<TurnResponse, GatewayError> {
    let turn: TurnResponse = parse_model_json(text)?;
    turn.check().map_err(GatewayError::MalformedResponse)?;
    let unknown = crate::world::unknown_territories(&turn.game_state);
    if !unknown.is_empty() {
        log::warn!("model placed territories outside the world map: {unknown:?}");
    }
    Ok(turn)
}

/// Managed Rocket state; cheap to clone.
#[derive(Clone)]
pub struct Gateway {
    client: Arc<dyn ModelClient>,
    policy: RetryPolicy,
}

impl Gateway {
    pub fn new(client: Arc<dyn ModelClient>, policy: RetryPolicy) -> Self {
        Gateway { client, policy }
    }

    async fn call<T, P>(&self, request: ModelRequest, parse: P) -> Result<T, GatewayError>
    where
        T: Send,
        P: Fn(&str) -> Result<T, GatewayError> + Sync,
    {
        let client = &self.client;
        let request = &request;
        let parse = &parse;
        retry::run(&self.policy, move |_attempt| async move {
            let text = client.generate(request).await?;
            parse(&text)
        })
        .await
    }

    pub async fn starting_civilizations(&self, year: i64) -> Result<Vec<String>, GatewayError> {
        let request = ModelRequest {
            prompt: prompts::starting_civilizations(year),
            response_schema: schema::starting_civilizations(),
        };
        let parsed: StartingCivilizations = self.call(request, parse_model_json).await?;
        Ok(parsed.civilizations)
    }

    pub async fn initialize_game(
        &self,
        country: &str,
        year: i64,
        difficulty: Difficulty,
    ) -> Result<TurnResponse, GatewayError> {
        let request = ModelRequest {
            prompt: prompts::initialize_game(country, year, difficulty)?,
            response_schema: schema::turn(),
        };
        self.call(request, parse_turn).await
    }

    pub async fn process_turn(
        &self,
        state: &GameState,
        choice: &Choice,
        difficulty: Difficulty,
    ) -> Result<TurnResponse, GatewayError> {
        let request = ModelRequest {
            prompt: prompts::process_turn(state, choice, difficulty)?,
            response_schema: schema::turn(),
        };
        self.call(request, parse_turn).await
    }

    pub async fn calculate_score(&self, final_state: &GameState) -> Result<ScoreDetails, GatewayError> {
        let request = ModelRequest {
            prompt: prompts::calculate_score(final_state)?,
            response_schema: schema::score(),
        };
        self.call(request, parse_model_json).await
    }
}
