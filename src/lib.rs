//! # World Domination
//!
//! JSON API behind a turn-based strategy game whose world, narrative, choices
//! and final score are all generated by an external language model.
//!
//! ## Overview
//!
//! The service keeps user accounts, finished-game scores with a leaderboard,
//! and optional server-held game sessions. Everything about the game itself
//! comes from the AI gateway, which prompts the model with a declared output
//! schema, validates the reply and retries transient failures.
//!
//! ## Architecture
//!
//! The API is built using the Rocket web framework with OpenAPI documentation
//! support. Stores are managed as `Arc<Mutex<T>>` so concurrent requests can
//! share them, and can be backed by JSON-lines journals on disk. Rocket's own
//! graceful shutdown (SIGINT, SIGTERM) drains requests, then a shutdown fairing
//! flushes the journals.

// Rocket makes this a bit tricky to support
#![allow(clippy::module_name_repetitions)]
#[macro_use]
extern crate rocket;

use std::sync::Arc;

use rocket::fairing::AdHoc;
use rocket::futures::lock::Mutex;
use rocket::serde::json::Json;
use rocket_okapi::openapi_get_routes;
use rocket_okapi::swagger_ui::{make_swagger_ui, SwaggerUIConfig};

pub mod accounts;
pub mod config;
pub mod error;
pub mod game;
pub mod gateway;
pub mod persistence;
pub mod scores;
pub mod status_messages;
pub mod world;

use crate::accounts::token::TokenSigner;
use crate::accounts::{SharedUsers, UserStore};
use crate::config::{AppConfig, Storage};
use crate::game::session::{SessionRegistry, SharedSessions};
use crate::gateway::{Gateway, GeminiClient, ModelClient};
use crate::scores::{ScoreStore, SharedScores};
use crate::status_messages::{new_status, Status};

/// Builds the server from environment configuration, talking to Gemini.
///
/// # Example
///
/// ```no_run
/// use world_domination::rocket_initialize;
///
/// #[rocket::main]
/// async fn main() {
///     rocket_initialize().launch().await.expect("Failed to launch rocket");
/// }
/// ```
pub fn rocket_initialize() -> rocket::Rocket<rocket::Build> {
    let config = AppConfig::from_env();
    let client = GeminiClient::new(
        &config.model_base_url,
        &config.model,
        config.api_key.clone(),
    );
    rocket_initialize_with(config, Arc::new(client))
}

/// Builds the server around any model client. Tests pass a scripted one.
pub fn rocket_initialize_with(
    config: AppConfig,
    model: Arc<dyn ModelClient>,
) -> rocket::Rocket<rocket::Build> {
    use crate::accounts::endpoints::okapi_add_operation_for_delete_user_;
    use crate::accounts::endpoints::okapi_add_operation_for_login_;
    use crate::accounts::endpoints::okapi_add_operation_for_signup_;
    use crate::accounts::endpoints::okapi_add_operation_for_update_password_;
    use crate::accounts::endpoints::{delete_user, login, signup, update_password};
    use crate::game::endpoints::okapi_add_operation_for_calculate_score_;
    use crate::game::endpoints::okapi_add_operation_for_create_game_;
    use crate::game::endpoints::okapi_add_operation_for_finish_game_;
    use crate::game::endpoints::okapi_add_operation_for_get_game_;
    use crate::game::endpoints::okapi_add_operation_for_initialize_;
    use crate::game::endpoints::okapi_add_operation_for_play_choice_;
    use crate::game::endpoints::okapi_add_operation_for_process_turn_;
    use crate::game::endpoints::okapi_add_operation_for_starting_civilizations_;
    use crate::game::endpoints::{
        calculate_score, create_game, finish_game, get_game, initialize, play_choice,
        process_turn, starting_civilizations,
    };
    use crate::scores::endpoints::okapi_add_operation_for_get_leaderboard_;
    use crate::scores::endpoints::okapi_add_operation_for_list_user_scores_;
    use crate::scores::endpoints::okapi_add_operation_for_save_score_;
    use crate::scores::endpoints::{get_leaderboard, list_user_scores, save_score};

    #[allow(clippy::no_effect_underscore_binding)]
    let _ = env_logger::try_init();

    if config.api_key.is_none() {
        log::warn!("GEMINI_API_KEY is not set; game endpoints will fail until it is");
    }

    let (users, scores) = open_stores(&config.storage);
    let users: SharedUsers = Arc::new(Mutex::new(users));
    let scores: SharedScores = Arc::new(Mutex::new(scores));
    let sessions: SharedSessions = Arc::new(Mutex::new(SessionRegistry::new()));
    let gateway = Gateway::new(model, config.retry_policy());
    let signer = TokenSigner::new(&config.session_secret, config.session_ttl);

    rocket::build()
        .mount(
            "/",
            openapi_get_routes![
                signup,
                login,
                update_password,
                delete_user,
                save_score,
                list_user_scores,
                get_leaderboard,
                starting_civilizations,
                initialize,
                process_turn,
                calculate_score,
                create_game,
                get_game,
                play_choice,
                finish_game
            ],
        )
        .mount("/swagger", make_swagger_ui(&get_docs()))
        .register("/", catchers![unauthorized, not_found, unprocessable, internal_error])
        .manage(users)
        .manage(scores)
        .manage(sessions)
        .manage(gateway)
        .manage(signer)
        .manage(config)
        .attach(AdHoc::on_shutdown("journal-shutdown", |rocket| {
            Box::pin(async move {
                // Runs once in-flight requests have drained, so nothing appends after this
                if let Some(users) = rocket.state::<SharedUsers>() {
                    users.lock().await.close();
                }
                if let Some(scores) = rocket.state::<SharedScores>() {
                    scores.lock().await.close();
                }
                log::info!("journals flushed");
            })
        }))
}

/// A store that cannot be replayed starts empty and in memory only, so the
/// unreadable journal is left untouched on disk.
fn open_stores(storage: &Storage) -> (UserStore, ScoreStore) {
    match storage {
        Storage::Memory => (UserStore::new(), ScoreStore::new()),
        Storage::Directory(dir) => {
            let users = UserStore::open(dir).unwrap_or_else(|e| {
                log::error!("could not load users: {e}");
                UserStore::new()
            });
            let scores = ScoreStore::open(dir).unwrap_or_else(|e| {
                log::error!("could not load scores: {e}");
                ScoreStore::new()
            });
            (users, scores)
        }
    }
}

#[catch(401)]
fn unauthorized() -> Json<Status> {
    new_status("Authentication required.".to_string())
}

#[catch(404)]
fn not_found() -> Json<Status> {
    new_status("Not found".to_string())
}

#[catch(422)]
fn unprocessable() -> Json<Status> {
    new_status("Invalid request body.".to_string())
}

#[catch(500)]
fn internal_error() -> Json<Status> {
    new_status("Internal server error".to_string())
}

fn get_docs() -> SwaggerUIConfig {
    SwaggerUIConfig {
        url: "/openapi.json".to_string(),
        ..Default::default()
    }
}
