mod common;

use common::{bearer, client, json_content, post_json, signup};
use rocket::http::Status;
use serde_json::{json, Value};

#[test]
fn short_username_is_rejected() {
    let (client, _) = client();
    let (status, body) = post_json(
        &client,
        "/auth/signup",
        json!({ "username": "ab", "password": "secret1" }),
    );
    assert_eq!(status, Status::BadRequest);
    assert_eq!(body["message"], "Username must be at least 3 characters long.");
}

#[test]
fn short_password_is_rejected() {
    let (client, _) = client();
    let (status, _) = post_json(
        &client,
        "/auth/signup",
        json!({ "username": "Caesar", "password": "12345" }),
    );
    assert_eq!(status, Status::BadRequest);
}

#[test]
fn signup_returns_user_and_token() {
    let (client, _) = client();
    let (status, body) = post_json(
        &client,
        "/auth/signup",
        json!({ "username": "Caesar", "password": "secret1" }),
    );
    assert_eq!(status, Status::Created);
    assert_eq!(body["user"]["username"], "Caesar");
    assert_eq!(body["user"]["isActive"], true);
    assert!(body["user"].get("passwordHash").is_none());
    assert!(!body["token"].as_str().unwrap_or_default().is_empty());
}

#[test]
fn duplicate_username_conflicts() {
    let (client, _) = client();
    signup(&client, "Caesar");
    let (status, _) = post_json(
        &client,
        "/auth/signup",
        json!({ "username": " Caesar ", "password": "another1" }),
    );
    assert_eq!(status, Status::Conflict);
}

#[test]
fn login_checks_password_without_revealing_usernames() {
    let (client, _) = client();
    let (id, _) = signup(&client, "Caesar");

    let (wrong, wrong_body) = post_json(
        &client,
        "/auth/login",
        json!({ "username": "Caesar", "password": "secret2" }),
    );
    let (unknown, unknown_body) = post_json(
        &client,
        "/auth/login",
        json!({ "username": "Brutus", "password": "secret1" }),
    );
    assert_eq!(wrong, Status::Unauthorized);
    assert_eq!(unknown, Status::Unauthorized);
    assert_eq!(wrong_body, unknown_body);

    let (ok, body) = post_json(
        &client,
        "/auth/login",
        json!({ "username": "Caesar", "password": "secret1" }),
    );
    assert_eq!(ok, Status::Ok);
    assert_eq!(body["user"]["id"], id.as_str());
}

#[test]
fn login_requires_both_fields() {
    let (client, _) = client();
    let (status, _) = post_json(&client, "/auth/login", json!({ "username": "Caesar" }));
    assert_eq!(status, Status::BadRequest);
}

#[test]
fn password_update_needs_the_owners_token() {
    let (client, _) = client();
    let (caesar_id, caesar_token) = signup(&client, "Caesar");
    let (_, brutus_token) = signup(&client, "Brutus");
    let body = json!({ "userId": caesar_id, "newPassword": "newsecret" }).to_string();

    let anonymous = client
        .put("/auth/update-password")
        .header(json_content())
        .body(body.clone())
        .dispatch();
    assert_eq!(anonymous.status(), Status::Unauthorized);

    let impostor = client
        .put("/auth/update-password")
        .header(json_content())
        .header(bearer(&brutus_token))
        .body(body.clone())
        .dispatch();
    assert_eq!(impostor.status(), Status::Unauthorized);

    let owner = client
        .put("/auth/update-password")
        .header(json_content())
        .header(bearer(&caesar_token))
        .body(body)
        .dispatch();
    assert_eq!(owner.status(), Status::Ok);

    let (old, _) = post_json(
        &client,
        "/auth/login",
        json!({ "username": "Caesar", "password": "secret1" }),
    );
    let (new, _) = post_json(
        &client,
        "/auth/login",
        json!({ "username": "Caesar", "password": "newsecret" }),
    );
    assert_eq!(old, Status::Unauthorized);
    assert_eq!(new, Status::Ok);
}

#[test]
fn password_update_validates_ids_and_length() {
    let (client, _) = client();
    let (_, token) = signup(&client, "Caesar");
    let (other_id, _) = signup(&client, "Brutus");
    let put = |body: Value| {
        client
            .put("/auth/update-password")
            .header(json_content())
            .header(bearer(&token))
            .body(body.to_string())
            .dispatch()
            .status()
    };
    assert_eq!(
        put(json!({ "userId": "not-a-uuid", "newPassword": "newsecret" })),
        Status::BadRequest
    );
    // Unknown and someone else's ids look the same to the caller.
    assert_eq!(
        put(json!({ "userId": uuid::Uuid::new_v4(), "newPassword": "newsecret" })),
        Status::Unauthorized
    );
    assert_eq!(
        put(json!({ "userId": other_id, "newPassword": "newsecret" })),
        Status::Unauthorized
    );
    assert_eq!(
        put(json!({ "userId": uuid::Uuid::new_v4(), "newPassword": "short" })),
        Status::BadRequest
    );
}

#[test]
fn soft_deleted_user_is_locked_out() {
    let (client, _) = client();
    let (id, token) = signup(&client, "Caesar");

    let response = client
        .delete("/auth/delete-user")
        .header(json_content())
        .header(bearer(&token))
        .body(json!({ "userId": id }).to_string())
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
    let user: Value = response.into_json().expect("user body");
    assert_eq!(user["isActive"], false);

    let (login, _) = post_json(
        &client,
        "/auth/login",
        json!({ "username": "Caesar", "password": "secret1" }),
    );
    assert_eq!(login, Status::Unauthorized);

    // The old token dies with the account.
    let again = client
        .delete("/auth/delete-user")
        .header(json_content())
        .header(bearer(&token))
        .body(json!({ "userId": id }).to_string())
        .dispatch();
    assert_eq!(again.status(), Status::Unauthorized);

    // And the name stays taken.
    let (status, _) = post_json(
        &client,
        "/auth/signup",
        json!({ "username": "Caesar", "password": "secret1" }),
    );
    assert_eq!(status, Status::Conflict);
}

#[test]
fn forged_token_is_rejected() {
    let (client, _) = client();
    let (id, token) = signup(&client, "Caesar");
    let forged = format!("{}0", token);
    let response = client
        .delete("/auth/delete-user")
        .header(json_content())
        .header(bearer(&forged))
        .body(json!({ "userId": id }).to_string())
        .dispatch();
    assert_eq!(response.status(), Status::Unauthorized);
    let body: Value = response.into_json().expect("status body");
    assert_eq!(body["message"], "Authentication required.");
}

#[test]
fn accounts_can_only_be_deleted_by_their_owner() {
    let (client, _) = client();
    let (caesar_id, _) = signup(&client, "Caesar");
    let (_, brutus) = signup(&client, "Brutus");
    let delete = |user_id: String| {
        let response = client
            .delete("/auth/delete-user")
            .header(json_content())
            .header(bearer(&brutus))
            .body(json!({ "userId": user_id }).to_string())
            .dispatch();
        let status = response.status();
        (status, response.into_json::<Value>().expect("status body"))
    };

    let (existing, existing_body) = delete(caesar_id);
    let (unknown, unknown_body) = delete(uuid::Uuid::new_v4().to_string());
    assert_eq!(existing, Status::Unauthorized);
    assert_eq!(existing_body["message"], "You can only delete your own account.");
    assert_eq!(unknown, Status::Unauthorized);
    assert_eq!(existing_body, unknown_body);

    let (login, _) = post_json(
        &client,
        "/auth/login",
        json!({ "username": "Caesar", "password": "secret1" }),
    );
    assert_eq!(login, Status::Ok);
}
