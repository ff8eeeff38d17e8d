//! Playthroughs held on the server, one per `POST /games`.
//!
//! Gateway calls take seconds, so the registry lock is never held across one.
//! A turn is applied only if nobody else advanced the session in the meantime.
//! A session leaves the registry once its score is saved, or once it has sat
//! unfinished for [`FINISH_WINDOW`] past its deadline.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rocket::futures::lock::Mutex;
use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;
use thiserror::Error;
use uuid::Uuid;

use crate::error::ApiError;
use crate::game::{Choice, Difficulty, GameState, TurnResponse};

pub type SharedSessions = Arc<Mutex<SessionRegistry>>;

/// How long after its deadline a session can still be finished and scored.
pub const FINISH_WINDOW: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Game not found")]
    NotFound,
    #[error("This game is already finished.")]
    Finished,
    #[error("Time is up. Finish the game to see your score.")]
    TimeUp,
    #[error("Choice {0} is not on offer this turn.")]
    UnknownChoice(String),
    #[error("This turn was already played.")]
    TurnAdvanced,
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::NotFound => ApiError::NotFound(e.to_string()),
            SessionError::UnknownChoice(_) => ApiError::Validation(e.to_string()),
            SessionError::Finished | SessionError::TimeUp | SessionError::TurnAdvanced => {
                ApiError::Conflict(e.to_string())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameSession {
    pub id: Uuid,
    pub owner: Uuid,
    pub difficulty: Difficulty,
    /// Number of choices played so far.
    pub turn: u32,
    pub current: TurnResponse,
    pub started_at: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    pub finished: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct SessionView {
    pub id: Uuid,
    pub difficulty: Difficulty,
    pub turn: u32,
    pub description: String,
    pub summary: Vec<String>,
    pub game_state: GameState,
    pub choices: Vec<Choice>,
    pub started_at: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    pub finished: bool,
}

/// What a turn needs from the session, copied out so the lock can be released.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnTicket {
    pub turn: u32,
    pub difficulty: Difficulty,
    pub state: GameState,
    pub choice: Choice,
}

impl GameSession {
    pub fn new(
        owner: Uuid,
        difficulty: Difficulty,
        opening: TurnResponse,
        duration: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        let deadline = i64::try_from(duration.as_secs())
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .and_then(|d| now.checked_add_signed(d))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        GameSession {
            id: Uuid::new_v4(),
            owner,
            difficulty,
            turn: 0,
            current: opening,
            started_at: now,
            deadline,
            finished: false,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.deadline
    }

    /// Past the deadline and the finish window, so nobody can score it any more.
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        chrono::Duration::from_std(FINISH_WINDOW)
            .ok()
            .and_then(|window| self.deadline.checked_add_signed(window))
            .is_some_and(|cutoff| now >= cutoff)
    }

    pub fn ensure_playable(&self, now: DateTime<Utc>) -> Result<(), SessionError> {
        if self.finished {
            return Err(SessionError::Finished);
        }
        if self.is_expired(now) {
            return Err(SessionError::TimeUp);
        }
        Ok(())
    }

    pub fn ticket(&self, choice_id: &str, now: DateTime<Utc>) -> Result<TurnTicket, SessionError> {
        self.ensure_playable(now)?;
        let choice = self
            .current
            .find_choice(choice_id)
            .cloned()
            .ok_or_else(|| SessionError::UnknownChoice(choice_id.to_string()))?;
        Ok(TurnTicket {
            turn: self.turn,
            difficulty: self.difficulty,
            state: self.current.game_state.clone(),
            choice,
        })
    }

    /// Replaces the whole turn, but only on top of the turn the ticket was cut
    /// from and only while the game is still running at `now`.
    pub fn advance(
        &mut self,
        ticket_turn: u32,
        next: TurnResponse,
        now: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        self.ensure_playable(now)?;
        if self.turn != ticket_turn {
            return Err(SessionError::TurnAdvanced);
        }
        self.current = next;
        self.turn += 1;
        Ok(())
    }

    /// Closes the session to play and hands out the state to score.
    ///
    /// Undone with [`GameSession::reopen`] when scoring fails.
    pub fn begin_finish(&mut self) -> Result<GameState, SessionError> {
        if self.finished {
            return Err(SessionError::Finished);
        }
        self.finished = true;
        Ok(self.current.game_state.clone())
    }

    pub fn reopen(&mut self) {
        self.finished = false;
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            id: self.id,
            difficulty: self.difficulty,
            turn: self.turn,
            description: self.current.description.clone(),
            summary: self.current.summary.clone(),
            game_state: self.current.game_state.clone(),
            choices: self.current.choices.clone(),
            started_at: self.started_at,
            deadline: self.deadline,
            finished: self.finished,
        }
    }
}

#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<Uuid, GameSession>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        SessionRegistry::default()
    }

    pub fn insert(&mut self, session: GameSession) -> SessionView {
        let view = session.view();
        self.sessions.insert(session.id, session);
        view
    }

    /// Someone else's session is reported as missing.
    pub fn get(&self, id: &Uuid, owner: &Uuid) -> Result<&GameSession, SessionError> {
        self.sessions
            .get(id)
            .filter(|s| &s.owner == owner)
            .ok_or(SessionError::NotFound)
    }

    pub fn get_mut(&mut self, id: &Uuid, owner: &Uuid) -> Result<&mut GameSession, SessionError> {
        self.sessions
            .get_mut(id)
            .filter(|s| &s.owner == owner)
            .ok_or(SessionError::NotFound)
    }

    pub fn remove(&mut self, id: &Uuid, owner: &Uuid) -> Result<GameSession, SessionError> {
        self.get(id, owner)?;
        self.sessions.remove(id).ok_or(SessionError::NotFound)
    }

    /// Drops sessions that can no longer be played or finished. Returns how many went.
    pub fn sweep(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| !s.is_stale(now));
        before - self.sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::ChoiceType;

    fn opening() -> TurnResponse {
        TurnResponse {
            description: "A small kingdom by the sea.".to_string(),
            summary: vec!["Strong navy".to_string()],
            game_state: crate::game::tests::sample_state(),
            choices: vec![Choice {
                id: "choice_1".to_string(),
                text: "Explore the coast".to_string(),
                choice_type: ChoiceType::Economy,
                stability_range: None,
                mitigation_tools: None,
            }],
        }
    }

    fn session(now: DateTime<Utc>) -> GameSession {
        GameSession::new(
            Uuid::new_v4(),
            Difficulty::Medium,
            opening(),
            Duration::from_secs(900),
            now,
        )
    }

    #[test]
    fn ticket_requires_an_offered_choice() {
        let now = Utc::now();
        let s = session(now);
        assert_eq!(
            s.ticket("choice_9", now),
            Err(SessionError::UnknownChoice("choice_9".to_string()))
        );
        let ticket = s.ticket("choice_1", now).expect("ticket");
        assert_eq!(ticket.turn, 0);
        assert_eq!(ticket.choice.text, "Explore the coast");
    }

    #[test]
    fn no_turns_after_the_deadline() {
        let now = Utc::now();
        let s = session(now);
        assert_eq!(s.deadline - s.started_at, chrono::Duration::seconds(900));
        let late = now + chrono::Duration::seconds(900);
        assert_eq!(s.ticket("choice_1", late), Err(SessionError::TimeUp));
    }

    #[test]
    fn advance_replaces_the_turn_once() {
        let now = Utc::now();
        let mut s = session(now);
        let mut next = opening();
        next.game_state.year = 1505;
        next.description = "The coast is mapped.".to_string();

        s.advance(0, next.clone(), now).expect("advance");
        assert_eq!(s.turn, 1);
        assert_eq!(s.view().game_state.year, 1505);
        assert_eq!(s.view().description, "The coast is mapped.");
        // A second reply for the same ticket loses.
        assert_eq!(s.advance(0, next, now), Err(SessionError::TurnAdvanced));
    }

    #[test]
    fn reply_arriving_after_the_deadline_is_discarded() {
        let now = Utc::now();
        let mut s = session(now);
        let ticket = s.ticket("choice_1", now).expect("ticket");
        let late = s.deadline + chrono::Duration::seconds(1);
        assert_eq!(
            s.advance(ticket.turn, opening(), late),
            Err(SessionError::TimeUp)
        );
        assert_eq!(s.turn, 0);
    }

    #[test]
    fn finished_session_is_closed() {
        let now = Utc::now();
        let mut s = session(now);
        s.finished = true;
        assert_eq!(s.ticket("choice_1", now), Err(SessionError::Finished));
        assert_eq!(s.advance(0, opening(), now), Err(SessionError::Finished));
    }

    #[test]
    fn finishing_is_claimed_once_until_reopened() {
        let now = Utc::now();
        let mut s = session(now);
        let ticket = s.ticket("choice_1", now).expect("ticket");
        assert_eq!(s.begin_finish().map(|state| state.year), Ok(s.current.game_state.year));
        assert_eq!(s.begin_finish(), Err(SessionError::Finished));
        // A turn in flight when the game was claimed must not land.
        assert_eq!(
            s.advance(ticket.turn, opening(), now),
            Err(SessionError::Finished)
        );
        s.reopen();
        assert!(s.begin_finish().is_ok());
    }

    #[test]
    fn finished_sessions_leave_the_registry() {
        let mut registry = SessionRegistry::new();
        let now = Utc::now();
        let sessions: Vec<GameSession> = (0..3).map(|_| session(now)).collect();
        for s in &sessions {
            registry.insert(s.clone());
        }
        assert_eq!(registry.len(), 3);

        let first = &sessions[0];
        assert_eq!(
            registry.remove(&first.id, &Uuid::new_v4()).map(|s| s.id),
            Err(SessionError::NotFound)
        );
        assert_eq!(registry.remove(&first.id, &first.owner).map(|s| s.id), Ok(first.id));
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.get(&first.id, &first.owner).map(|s| s.id),
            Err(SessionError::NotFound)
        );
    }

    #[test]
    fn sweep_drops_sessions_past_the_finish_window() {
        let mut registry = SessionRegistry::new();
        let now = Utc::now();
        let old = session(now - chrono::Duration::hours(2));
        let recent = session(now - chrono::Duration::minutes(30));
        let (old_id, old_owner) = (old.id, old.owner);
        let (recent_id, recent_owner) = (recent.id, recent.owner);
        registry.insert(old);
        registry.insert(recent);

        assert_eq!(registry.sweep(now), 1);
        assert!(registry.get(&old_id, &old_owner).is_err());
        // Expired but still inside the window: it can still be finished.
        let kept = registry.get(&recent_id, &recent_owner).expect("kept");
        assert!(kept.is_expired(now));
        assert!(!kept.is_stale(now));
        assert_eq!(registry.sweep(now), 0);
    }

    #[test]
    fn registry_hides_other_owners_sessions() {
        let mut registry = SessionRegistry::new();
        let s = session(Utc::now());
        let (id, owner) = (s.id, s.owner);
        registry.insert(s);
        assert!(registry.get(&id, &owner).is_ok());
        assert_eq!(
            registry.get(&id, &Uuid::new_v4()).map(|s| s.id),
            Err(SessionError::NotFound)
        );
        assert_eq!(registry.len(), 1);
    }
}
