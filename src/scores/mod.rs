//! Finished-game results and the best-score-per-user leaderboard.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rocket::futures::lock::Mutex;
use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;
use thiserror::Error;
use uuid::Uuid;

use crate::error::ApiError;
use crate::game::GameState;
use crate::persistence::{self, Journal};

pub mod endpoints;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

pub type SharedScores = Arc<Mutex<ScoreStore>>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScoreError {
    #[error("Missing required score fields.")]
    MissingFields,
    #[error("Invalid user ID format.")]
    InvalidUserId,
    #[error("User not found")]
    UnknownUser,
    #[error("page must be at least 1")]
    InvalidPage,
    #[error("limit must be between 1 and 100")]
    InvalidLimit,
}

impl From<ScoreError> for ApiError {
    fn from(e: ScoreError) -> Self {
        match e {
            ScoreError::UnknownUser => ApiError::NotFound(e.to_string()),
            _ => ApiError::Validation(e.to_string()),
        }
    }
}

/// One finished game. Never modified after it is saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct Score {
    pub id: Uuid,
    pub user_id: Uuid,
    pub score: i64,
    pub title: String,
    pub analysis: String,
    pub final_state: GameState,
    pub date: DateTime<Utc>,
}

/// Checked input for [`ScoreStore::add`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewScore {
    pub user_id: Uuid,
    pub score: i64,
    pub title: String,
    pub analysis: String,
    pub final_state: GameState,
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub user_id: Uuid,
    pub username: String,
    pub high_score: i64,
    pub title: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: usize,
    pub total_pages: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct LeaderboardPage {
    pub leaderboard: Vec<LeaderboardEntry>,
    pub pagination: Pagination,
    /// 1-based position of the requested user, if they are on the board.
    pub user_rank: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaderboardQuery {
    pub page: u32,
    pub limit: u32,
    pub user_id: Option<Uuid>,
}

impl Default for LeaderboardQuery {
    fn default() -> Self {
        LeaderboardQuery {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            user_id: None,
        }
    }
}

impl LeaderboardQuery {
    pub fn new(page: Option<i64>, limit: Option<i64>, user_id: Option<Uuid>) -> Result<Self, ScoreError> {
        let page = match page {
            None => 1,
            Some(p) if p >= 1 => u32::try_from(p).map_err(|_| ScoreError::InvalidPage)?,
            Some(_) => return Err(ScoreError::InvalidPage),
        };
        let limit = match limit {
            None => DEFAULT_PAGE_SIZE,
            Some(l) if (1..=i64::from(MAX_PAGE_SIZE)).contains(&l) => l as u32,
            Some(_) => return Err(ScoreError::InvalidLimit),
        };
        Ok(LeaderboardQuery {
            page,
            limit,
            user_id,
        })
    }
}

#[derive(Debug, Default)]
pub struct ScoreStore {
    scores: Vec<Score>,
    journal: Option<Journal<Score>>,
}

impl ScoreStore {
    pub fn new() -> Self {
        ScoreStore::default()
    }

    pub fn open(dir: &Path) -> Result<Self, persistence::JournalError> {
        let (scores, journal) = persistence::open_in::<Score>(dir, "scores.jsonl")?;
        log::info!("loaded {} scores from {}", scores.len(), journal.path().display());
        Ok(ScoreStore {
            scores,
            journal: Some(journal),
        })
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn add(&mut self, new: NewScore) -> Score {
        let score = Score {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            score: new.score,
            title: new.title,
            analysis: new.analysis,
            final_state: new.final_state,
            date: new.date.unwrap_or_else(Utc::now),
        };
        if let Some(journal) = &self.journal {
            journal.append(&score);
        }
        self.scores.push(score.clone());
        score
    }

    /// Newest first.
    pub fn for_user(&self, user_id: &Uuid) -> Vec<Score> {
        let mut scores: Vec<Score> = self
            .scores
            .iter()
            .filter(|s| &s.user_id == user_id)
            .cloned()
            .collect();
        scores.sort_by(|a, b| b.date.cmp(&a.date));
        scores
    }

    /// Best score per user among `active` users, highest first.
    ///
    /// `active` maps the ids of users who may appear to their usernames.
    pub fn ranking(&self, active: &HashMap<Uuid, String>) -> Vec<LeaderboardEntry> {
        let mut best: HashMap<Uuid, &Score> = HashMap::new();
        for score in self.scores.iter().filter(|s| active.contains_key(&s.user_id)) {
            best.entry(score.user_id)
                .and_modify(|current| {
                    if score.score > current.score
                        || (score.score == current.score && score.date < current.date)
                    {
                        *current = score;
                    }
                })
                .or_insert(score);
        }
        let mut entries: Vec<LeaderboardEntry> = best
            .into_values()
            .filter_map(|s| {
                Some(LeaderboardEntry {
                    user_id: s.user_id,
                    username: active.get(&s.user_id)?.clone(),
                    high_score: s.score,
                    title: s.title.clone(),
                    date: s.date,
                })
            })
            .collect();
        entries.sort_by(compare_entries);
        entries
    }

    pub fn leaderboard(&self, active: &HashMap<Uuid, String>, query: LeaderboardQuery) -> LeaderboardPage {
        let ranking = self.ranking(active);
        let total = ranking.len();
        let limit = query.limit.max(1) as usize;
        let user_rank = query
            .user_id
            .and_then(|id| ranking.iter().position(|e| e.user_id == id))
            .map(|idx| idx + 1);
        let offset = (query.page.max(1) as usize - 1).saturating_mul(limit);
        let leaderboard = ranking.into_iter().skip(offset).take(limit).collect();
        LeaderboardPage {
            leaderboard,
            pagination: Pagination {
                page: query.page,
                limit: query.limit,
                total,
                total_pages: total.div_ceil(limit),
            },
            user_rank,
        }
    }

    pub fn close(&self) {
        if let Some(journal) = &self.journal {
            journal.close();
        }
    }
}

fn compare_entries(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    b.high_score
        .cmp(&a.high_score)
        .then_with(|| a.date.cmp(&b.date))
        .then_with(|| a.username.cmp(&b.username))
}
