// Shared by several test binaries; not every helper is used by each one.
#![allow(dead_code)]

use std::borrow::Cow;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rocket::http::uncased::Uncased;
use rocket::http::{Header, Status};
use rocket::local::blocking::Client;
use serde_json::{json, Value};

use world_domination::config::AppConfig;
use world_domination::gateway::{GatewayError, ModelClient, ModelRequest};
use world_domination::rocket_initialize_with;

/// Model client that replays a fixed script of replies, in order.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, GatewayError>>>,
    calls: AtomicUsize,
}

impl ScriptedModel {
    pub fn push_ok(&self, reply: Value) {
        self.replies
            .lock()
            .expect("script lock")
            .push_back(Ok(reply.to_string()));
    }

    pub fn push_text(&self, reply: &str) {
        self.replies
            .lock()
            .expect("script lock")
            .push_back(Ok(reply.to_string()));
    }

    pub fn push_status(&self, status: u16) {
        self.replies
            .lock()
            .expect("script lock")
            .push_back(Err(GatewayError::Http {
                status,
                message: format!("scripted HTTP {status}"),
            }));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn generate(&self, _request: &ModelRequest) -> Result<String, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.replies
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::Transport("script exhausted".to_string())))
    }
}

pub fn client() -> (Client, Arc<ScriptedModel>) {
    client_with(AppConfig::for_tests())
}

pub fn client_with(config: AppConfig) -> (Client, Arc<ScriptedModel>) {
    let model = Arc::new(ScriptedModel::default());
    let rocket = rocket_initialize_with(config, model.clone());
    let client = Client::tracked(rocket).expect("valid rocket instance");
    (client, model)
}

pub fn json_content() -> Header<'static> {
    Header {
        name: Uncased::from("Content-Type"),
        value: Cow::from("application/json"),
    }
}

pub fn bearer(token: &str) -> Header<'static> {
    Header::new("Authorization", format!("Bearer {token}"))
}

pub fn post_json(client: &Client, uri: &str, body: Value) -> (Status, Value) {
    let response = client
        .post(uri.to_string())
        .header(json_content())
        .body(body.to_string())
        .dispatch();
    let status = response.status();
    (status, response.into_json::<Value>().unwrap_or(Value::Null))
}

pub fn get_json(client: &Client, uri: &str) -> (Status, Value) {
    let response = client.get(uri.to_string()).dispatch();
    let status = response.status();
    (status, response.into_json::<Value>().unwrap_or(Value::Null))
}

/// Signs a fresh user up and returns `(userId, token)`.
pub fn signup(client: &Client, username: &str) -> (String, String) {
    let (status, body) = post_json(
        client,
        "/auth/signup",
        json!({ "username": username, "password": "secret1" }),
    );
    assert_eq!(status, Status::Created, "signup failed: {body}");
    let id = body["user"]["id"].as_str().expect("user id").to_string();
    let token = body["token"].as_str().expect("token").to_string();
    (id, token)
}

pub fn game_state(country: &str, year: i64, territories: &[&str]) -> Value {
    json!({
        "year": year,
        "rulerTitle": "Emperor",
        "countryName": country,
        "population": 4.5,
        "military": 300,
        "economy": 250,
        "technology": 120,
        "territories": territories,
        "resources": { "food": 100, "iron": 40, "gold": 75, "knowledge": 20 }
    })
}

/// A model reply for initialize or process-turn.
pub fn turn_reply(country: &str, year: i64, choices: &[(&str, &str)]) -> Value {
    let choices: Vec<Value> = choices
        .iter()
        .map(|(id, text)| json!({ "id": id, "text": text, "type": "military" }))
        .collect();
    json!({
        "description": format!("{country} stands at a crossroads in {year}."),
        "summary": ["Army of 300", "Treasury steady"],
        "gameState": game_state(country, year, &["Western Europe"]),
        "choices": choices
    })
}

pub fn score_reply(score: f64, title: &str) -> Value {
    json!({ "score": score, "title": title, "analysis": "A reign worth remembering." })
}
