mod common;

use std::time::Duration;

use common::{bearer, client, client_with, get_json, json_content, score_reply, signup, turn_reply};
use rocket::http::Status;
use rocket::local::blocking::Client;
use serde_json::{json, Value};
use world_domination::config::AppConfig;

fn authed_post(client: &Client, uri: &str, token: &str, body: Value) -> (Status, Value) {
    let response = client
        .post(uri.to_string())
        .header(json_content())
        .header(bearer(token))
        .body(body.to_string())
        .dispatch();
    let status = response.status();
    (status, response.into_json::<Value>().unwrap_or(Value::Null))
}

fn authed_get(client: &Client, uri: &str, token: &str) -> (Status, Value) {
    let response = client.get(uri.to_string()).header(bearer(token)).dispatch();
    let status = response.status();
    (status, response.into_json::<Value>().unwrap_or(Value::Null))
}

fn new_game_body() -> Value {
    json!({ "country": "Rome", "year": -200, "difficulty": "medium" })
}

#[test]
fn full_game_from_start_to_leaderboard() {
    let (client, model) = client();
    let (user_id, token) = signup(&client, "Caesar");

    model.push_ok(turn_reply("Rome", -200, &[("choice_1", "March on Gaul"), ("choice_2", "Build roads")]));
    let (status, game) = authed_post(&client, "/games", &token, new_game_body());
    assert_eq!(status, Status::Created, "{game}");
    assert_eq!(game["turn"], 0);
    assert_eq!(game["finished"], false);
    let id = game["id"].as_str().expect("game id").to_string();

    let (status, fetched) = authed_get(&client, &format!("/games/{id}"), &token);
    assert_eq!(status, Status::Ok);
    assert_eq!(fetched["gameState"]["countryName"], "Rome");

    model.push_ok(turn_reply("Rome", -190, &[("choice_3", "Cross the Rubicon")]));
    let (status, played) = authed_post(
        &client,
        &format!("/games/{id}/choices"),
        &token,
        json!({ "choiceId": "choice_2" }),
    );
    assert_eq!(status, Status::Ok, "{played}");
    assert_eq!(played["turn"], 1);
    assert_eq!(played["gameState"]["year"], -190);
    assert_eq!(played["choices"][0]["id"], "choice_3");

    model.push_ok(score_reply(6400.0, "Regional Power"));
    let (status, score) = authed_post(&client, &format!("/games/{id}/finish"), &token, json!({}));
    assert_eq!(status, Status::Created, "{score}");
    assert_eq!(score["score"], 6400);
    assert_eq!(score["userId"], user_id.as_str());
    assert_eq!(score["finalState"]["year"], -190);

    let (_, board) = get_json(&client, &format!("/leaderboard?userId={user_id}"));
    assert_eq!(board["leaderboard"][0]["highScore"], 6400);
    assert_eq!(board["userRank"], 1);

    let (status, _) = authed_post(&client, &format!("/games/{id}/finish"), &token, json!({}));
    assert_eq!(status, Status::NotFound);
    let (status, _) = authed_post(
        &client,
        &format!("/games/{id}/choices"),
        &token,
        json!({ "choiceId": "choice_3" }),
    );
    assert_eq!(status, Status::NotFound);
}

#[test]
fn finished_games_are_released() {
    let (client, model) = client();
    let (_, token) = signup(&client, "Caesar");
    let mut ids = Vec::new();
    for year in [-200, -100, 0] {
        model.push_ok(turn_reply("Rome", year, &[("choice_1", "March on Gaul")]));
        let (status, game) = authed_post(&client, "/games", &token, new_game_body());
        assert_eq!(status, Status::Created, "{game}");
        ids.push(game["id"].as_str().expect("game id").to_string());
    }
    for id in &ids {
        model.push_ok(score_reply(900.0, "Petty Kingdom"));
        let (status, _) = authed_post(&client, &format!("/games/{id}/finish"), &token, json!({}));
        assert_eq!(status, Status::Created);
    }
    for id in &ids {
        let (status, _) = authed_get(&client, &format!("/games/{id}"), &token);
        assert_eq!(status, Status::NotFound);
    }
}

#[test]
fn failed_scoring_keeps_the_game_open() {
    let (client, model) = client();
    let (_, token) = signup(&client, "Caesar");
    model.push_ok(turn_reply("Rome", -200, &[("choice_1", "March on Gaul")]));
    let (_, game) = authed_post(&client, "/games", &token, new_game_body());
    let id = game["id"].as_str().expect("game id").to_string();

    model.push_status(400);
    let (status, _) = authed_post(&client, &format!("/games/{id}/finish"), &token, json!({}));
    assert_eq!(status, Status::InternalServerError);

    let (status, view) = authed_get(&client, &format!("/games/{id}"), &token);
    assert_eq!(status, Status::Ok);
    assert_eq!(view["finished"], false);

    model.push_ok(score_reply(2500.0, "Regional Power"));
    let (status, score) = authed_post(&client, &format!("/games/{id}/finish"), &token, json!({}));
    assert_eq!(status, Status::Created, "{score}");
    assert_eq!(score["score"], 2500);
}

#[test]
fn failed_turn_leaves_the_session_untouched() {
    let (client, model) = client();
    let (_, token) = signup(&client, "Caesar");
    model.push_ok(turn_reply("Rome", -200, &[("choice_1", "March on Gaul")]));
    let (_, game) = authed_post(&client, "/games", &token, new_game_body());
    let id = game["id"].as_str().expect("game id").to_string();

    for _ in 0..3 {
        model.push_status(503);
    }
    let (status, body) = authed_post(
        &client,
        &format!("/games/{id}/choices"),
        &token,
        json!({ "choiceId": "choice_1" }),
    );
    assert_eq!(status, Status::ServiceUnavailable, "{body}");

    let (_, after) = authed_get(&client, &format!("/games/{id}"), &token);
    assert_eq!(after["turn"], 0);
    assert_eq!(after["gameState"], game["gameState"]);
    assert_eq!(after["choices"], game["choices"]);
}

#[test]
fn unknown_choice_is_rejected_before_any_model_call() {
    let (client, model) = client();
    let (_, token) = signup(&client, "Caesar");
    model.push_ok(turn_reply("Rome", -200, &[("choice_1", "March on Gaul")]));
    let (_, game) = authed_post(&client, "/games", &token, new_game_body());
    let id = game["id"].as_str().expect("game id").to_string();

    let (status, _) = authed_post(
        &client,
        &format!("/games/{id}/choices"),
        &token,
        json!({ "choiceId": "choice_42" }),
    );
    assert_eq!(status, Status::BadRequest);
    assert_eq!(model.calls(), 1);
}

#[test]
fn games_belong_to_their_player() {
    let (client, model) = client();
    let (_, caesar) = signup(&client, "Caesar");
    let (_, brutus) = signup(&client, "Brutus");
    model.push_ok(turn_reply("Rome", -200, &[("choice_1", "March on Gaul")]));
    let (_, game) = authed_post(&client, "/games", &caesar, new_game_body());
    let id = game["id"].as_str().expect("game id").to_string();

    let (status, _) = authed_get(&client, &format!("/games/{id}"), &brutus);
    assert_eq!(status, Status::NotFound);
    let (status, _) = authed_get(&client, "/games/not-a-game", &caesar);
    assert_eq!(status, Status::NotFound);
    let anonymous = client.get(format!("/games/{id}")).dispatch();
    assert_eq!(anonymous.status(), Status::Unauthorized);
}

#[test]
fn time_limit_stops_play_but_not_scoring() {
    let config = AppConfig {
        game_duration: Duration::ZERO,
        ..AppConfig::for_tests()
    };
    let (client, model) = client_with(config);
    let (_, token) = signup(&client, "Caesar");
    model.push_ok(turn_reply("Rome", -200, &[("choice_1", "March on Gaul")]));
    let (_, game) = authed_post(&client, "/games", &token, new_game_body());
    let id = game["id"].as_str().expect("game id").to_string();

    let (status, _) = authed_post(
        &client,
        &format!("/games/{id}/choices"),
        &token,
        json!({ "choiceId": "choice_1" }),
    );
    assert_eq!(status, Status::Conflict);

    model.push_ok(score_reply(1200.0, "Fallen Empire"));
    let (status, _) = authed_post(&client, &format!("/games/{id}/finish"), &token, json!({}));
    assert_eq!(status, Status::Created);
}
