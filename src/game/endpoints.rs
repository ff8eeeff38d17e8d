use chrono::Utc;
use rocket::http::Status as HttpStatus;
use rocket::serde::json::{self, Json};
use rocket::serde::Deserialize;
use rocket::State;
use rocket_okapi::{openapi, JsonSchema};
use uuid::Uuid;

use crate::accounts::token::AuthenticatedUser;
use crate::config::AppConfig;
use crate::error::{json_body, ApiError};
use crate::game::session::{GameSession, SessionError, SessionView, SharedSessions};
use crate::game::{
    Choice, Difficulty, GameState, ScoreDetails, StartingCivilizations, TurnResponse,
};
use crate::gateway::Gateway;
use crate::scores::{NewScore, Score, SharedScores};

pub const INITIALIZE_FAILED: &str =
    "Failed to initialize your empire. The scrolls of destiny are unclear.";
pub const TURN_FAILED: &str = "Failed to process your choice. The winds of fate are turbulent.";
pub const SCORE_FAILED: &str =
    "Failed to calculate your final score. Your legacy is too grand to measure.";
pub const CIVILIZATIONS_FAILED: &str =
    "Failed to retrieve civilizations for that era. The historical records are incomplete.";

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct CivilizationsRequest {
    pub year: i64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct InitializeRequest {
    pub country: String,
    pub year: i64,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct ProcessTurnRequest {
    pub current_state: GameState,
    pub choice: Choice,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct CalculateScoreRequest {
    pub final_state: GameState,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct ChoiceRequest {
    pub choice_id: String,
}

fn require_country(country: &str) -> Result<&str, ApiError> {
    let country = country.trim();
    if country.is_empty() {
        return Err(ApiError::Validation("A country or empire is required.".to_string()));
    }
    Ok(country)
}

fn parse_session_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| SessionError::NotFound.into())
}

/// Suggest starting civilizations for a year
#[openapi]
#[post("/game/starting-civilizations", format = "json", data = "<body>")]
pub async fn starting_civilizations(
    gateway: &State<Gateway>,
    body: Result<Json<CivilizationsRequest>, json::Error<'_>>,
) -> Result<Json<StartingCivilizations>, ApiError> {
    let body = json_body(body)?;
    let civilizations = gateway
        .starting_civilizations(body.year)
        .await
        .map_err(|e| ApiError::upstream(CIVILIZATIONS_FAILED, e))?;
    Ok(Json(StartingCivilizations { civilizations }))
}

/// Generate the opening turn of a new game
#[openapi]
#[post("/game/initialize", format = "json", data = "<body>")]
pub async fn initialize(
    gateway: &State<Gateway>,
    body: Result<Json<InitializeRequest>, json::Error<'_>>,
) -> Result<Json<TurnResponse>, ApiError> {
    let body = json_body(body)?;
    let country = require_country(&body.country)?;
    let turn = gateway
        .initialize_game(country, body.year, body.difficulty)
        .await
        .map_err(|e| ApiError::upstream(INITIALIZE_FAILED, e))?;
    Ok(Json(turn))
}

/// Play one choice against a client-held game state
#[openapi]
#[post("/game/process-turn", format = "json", data = "<body>")]
pub async fn process_turn(
    gateway: &State<Gateway>,
    body: Result<Json<ProcessTurnRequest>, json::Error<'_>>,
) -> Result<Json<TurnResponse>, ApiError> {
    let body = json_body(body)?;
    if body.choice.text.trim().is_empty() {
        return Err(ApiError::Validation("The chosen action has no text.".to_string()));
    }
    let turn = gateway
        .process_turn(&body.current_state, &body.choice, body.difficulty)
        .await
        .map_err(|e| ApiError::upstream(TURN_FAILED, e))?;
    Ok(Json(turn))
}

/// Score a finished game state
#[openapi]
#[post("/game/calculate-score", format = "json", data = "<body>")]
pub async fn calculate_score(
    gateway: &State<Gateway>,
    body: Result<Json<CalculateScoreRequest>, json::Error<'_>>,
) -> Result<Json<ScoreDetails>, ApiError> {
    let body = json_body(body)?;
    let details = gateway
        .calculate_score(&body.final_state)
        .await
        .map_err(|e| ApiError::upstream(SCORE_FAILED, e))?;
    Ok(Json(details))
}

/// Start a server-held game for the signed-in user
#[openapi]
#[post("/games", format = "json", data = "<body>")]
pub async fn create_game(
    auth: AuthenticatedUser,
    gateway: &State<Gateway>,
    sessions: &State<SharedSessions>,
    config: &State<AppConfig>,
    body: Result<Json<InitializeRequest>, json::Error<'_>>,
) -> Result<(HttpStatus, Json<SessionView>), ApiError> {
    let body = json_body(body)?;
    let country = require_country(&body.country)?;
    let opening = gateway
        .initialize_game(country, body.year, body.difficulty)
        .await
        .map_err(|e| ApiError::upstream(INITIALIZE_FAILED, e))?;
    let now = Utc::now();
    let session = GameSession::new(auth.user_id, body.difficulty, opening, config.game_duration, now);
    log::info!("user {} started game {} as {country}", auth.user_id, session.id);
    let mut sessions = sessions.lock().await;
    let swept = sessions.sweep(now);
    if swept > 0 {
        log::info!("dropped {swept} abandoned games");
    }
    let view = sessions.insert(session);
    Ok((HttpStatus::Created, Json(view)))
}

/// Current turn of one of the signed-in user's games
#[openapi]
#[get("/games/<id>")]
pub async fn get_game(
    auth: AuthenticatedUser,
    sessions: &State<SharedSessions>,
    id: &str,
) -> Result<Json<SessionView>, ApiError> {
    let id = parse_session_id(id)?;
    let sessions = sessions.lock().await;
    Ok(Json(sessions.get(&id, &auth.user_id)?.view()))
}

/// Play one of the offered choices
#[openapi]
#[post("/games/<id>/choices", format = "json", data = "<body>")]
pub async fn play_choice(
    auth: AuthenticatedUser,
    gateway: &State<Gateway>,
    sessions: &State<SharedSessions>,
    id: &str,
    body: Result<Json<ChoiceRequest>, json::Error<'_>>,
) -> Result<Json<SessionView>, ApiError> {
    let id = parse_session_id(id)?;
    let body = json_body(body)?;
    let ticket = sessions
        .lock()
        .await
        .get(&id, &auth.user_id)?
        .ticket(&body.choice_id, Utc::now())?;

    let next = gateway
        .process_turn(&ticket.state, &ticket.choice, ticket.difficulty)
        .await
        .map_err(|e| ApiError::upstream(TURN_FAILED, e))?;

    let mut sessions = sessions.lock().await;
    let session = sessions.get_mut(&id, &auth.user_id)?;
    session.advance(ticket.turn, next, Utc::now())?;
    Ok(Json(session.view()))
}

/// Score one of the signed-in user's games and record the result
#[openapi]
#[post("/games/<id>/finish")]
pub async fn finish_game(
    auth: AuthenticatedUser,
    gateway: &State<Gateway>,
    sessions: &State<SharedSessions>,
    scores: &State<SharedScores>,
    id: &str,
) -> Result<(HttpStatus, Json<Score>), ApiError> {
    let id = parse_session_id(id)?;
    let final_state = sessions
        .lock()
        .await
        .get_mut(&id, &auth.user_id)?
        .begin_finish()?;

    let details = match gateway.calculate_score(&final_state).await {
        Ok(details) => details,
        Err(e) => {
            if let Ok(session) = sessions.lock().await.get_mut(&id, &auth.user_id) {
                session.reopen();
            }
            return Err(ApiError::upstream(SCORE_FAILED, e));
        }
    };

    sessions.lock().await.remove(&id, &auth.user_id)?;
    let score = scores.lock().await.add(NewScore {
        user_id: auth.user_id,
        score: details.score,
        title: details.title,
        analysis: details.analysis,
        final_state,
        date: None,
    });
    log::info!("game {id} finished with {} points", score.score);
    Ok((HttpStatus::Created, Json(score)))
}
