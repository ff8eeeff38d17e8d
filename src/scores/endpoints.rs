use chrono::{DateTime, Utc};
use rocket::http::Status as HttpStatus;
use rocket::serde::json::{self, Json};
use rocket::serde::Deserialize;
use rocket::{FromForm, State};
use rocket_okapi::{openapi, JsonSchema};

use crate::accounts::{parse_user_id, SharedUsers};
use crate::error::{json_body, ApiError};
use crate::game::GameState;
use crate::scores::{LeaderboardPage, LeaderboardQuery, NewScore, Score, ScoreError, SharedScores};

/// Body of `POST /scores`. Every field but `date` is required.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct ScoreSubmission {
    pub user_id: Option<String>,
    pub score: Option<f64>,
    pub title: Option<String>,
    pub analysis: Option<String>,
    pub final_state: Option<GameState>,
    pub date: Option<DateTime<Utc>>,
}

impl ScoreSubmission {
    fn check(self) -> Result<NewScore, ScoreError> {
        let non_empty = |s: Option<String>| s.filter(|s| !s.trim().is_empty());
        match (
            self.user_id,
            self.score,
            non_empty(self.title),
            non_empty(self.analysis),
            self.final_state,
        ) {
            (Some(user_id), Some(score), Some(title), Some(analysis), Some(final_state))
                if score.is_finite() =>
            {
                let user_id = parse_user_id(&user_id).map_err(|_| ScoreError::InvalidUserId)?;
                Ok(NewScore {
                    user_id,
                    score: score.round() as i64,
                    title,
                    analysis,
                    final_state,
                    date: self.date,
                })
            }
            _ => Err(ScoreError::MissingFields),
        }
    }
}

/// `page` and `limit` arrive as text so a non-number is rejected instead of
/// falling back to the default.
#[derive(Debug, FromForm, JsonSchema)]
pub struct LeaderboardParams {
    #[schemars(with = "Option<i64>")]
    pub page: Option<String>,
    #[schemars(with = "Option<i64>")]
    pub limit: Option<String>,
    #[field(name = "userId")]
    #[schemars(rename = "userId")]
    pub user_id: Option<String>,
}

fn whole_number(raw: Option<&str>, invalid: ScoreError) -> Result<Option<i64>, ScoreError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(|_| invalid),
    }
}

/// Save a finished game's score
#[openapi]
#[post("/scores", format = "json", data = "<body>")]
pub async fn save_score(
    users: &State<SharedUsers>,
    scores: &State<SharedScores>,
    body: Result<Json<ScoreSubmission>, json::Error<'_>>,
) -> Result<(HttpStatus, Json<Score>), ApiError> {
    let new = json_body(body)?.check()?;
    if users.lock().await.get(&new.user_id).is_none() {
        return Err(ScoreError::UnknownUser.into());
    }
    let score = scores.lock().await.add(new);
    log::info!("saved score {} for user {}", score.score, score.user_id);
    Ok((HttpStatus::Created, Json(score)))
}

/// List a user's scores, newest first
#[openapi]
#[get("/scores/user/<user_id>")]
pub async fn list_user_scores(
    scores: &State<SharedScores>,
    user_id: &str,
) -> Result<Json<Vec<Score>>, ApiError> {
    let user_id = parse_user_id(user_id)?;
    Ok(Json(scores.lock().await.for_user(&user_id)))
}

/// Best score per active user, paginated
#[openapi]
#[get("/leaderboard?<params..>")]
pub async fn get_leaderboard(
    users: &State<SharedUsers>,
    scores: &State<SharedScores>,
    params: LeaderboardParams,
) -> Result<Json<LeaderboardPage>, ApiError> {
    let user_id = params
        .user_id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .map(parse_user_id)
        .transpose()?;
    let page = whole_number(params.page.as_deref(), ScoreError::InvalidPage)?;
    let limit = whole_number(params.limit.as_deref(), ScoreError::InvalidLimit)?;
    let query = LeaderboardQuery::new(page, limit, user_id)?;
    let active = users.lock().await.active_names();
    Ok(Json(scores.lock().await.leaderboard(&active, query)))
}
