use rocket::http::Status as HttpStatus;
use rocket::serde::json::{self, Json};
use rocket::serde::{Deserialize, Serialize};
use rocket::State;
use rocket_okapi::{openapi, JsonSchema};

use crate::accounts::token::{AuthenticatedUser, TokenSigner};
use crate::accounts::{
    parse_user_id, password, validate_password, validate_signup, AccountError, SharedUsers, User,
};
use crate::config::AppConfig;
use crate::error::{json_body, ApiError};

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct DeleteUserRequest {
    #[serde(default)]
    pub user_id: String,
}

/// Create an account and sign it in
#[openapi]
#[post("/auth/signup", format = "json", data = "<body>")]
pub async fn signup(
    users: &State<SharedUsers>,
    signer: &State<TokenSigner>,
    config: &State<AppConfig>,
    body: Result<Json<Credentials>, json::Error<'_>>,
) -> Result<(HttpStatus, Json<AuthResponse>), ApiError> {
    let body = json_body(body)?;
    let username = validate_signup(&body.username, &body.password)?;
    if users.lock().await.is_taken(&username) {
        return Err(AccountError::UsernameTaken.into());
    }
    let hash = password::hash(body.password, config.bcrypt_cost).await?;
    // Re-checked under the lock: another signup may have won while hashing.
    let user = users.lock().await.insert(&username, hash)?;
    log::info!("new user {} ({})", user.username, user.id);
    let token = signer
        .issue(user.id)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok((HttpStatus::Created, Json(AuthResponse { user, token })))
}

/// Sign in with username and password
#[openapi]
#[post("/auth/login", format = "json", data = "<body>")]
pub async fn login(
    users: &State<SharedUsers>,
    signer: &State<TokenSigner>,
    body: Result<Json<Credentials>, json::Error<'_>>,
) -> Result<Json<AuthResponse>, ApiError> {
    let body = json_body(body)?;
    if body.username.trim().is_empty() || body.password.is_empty() {
        return Err(AccountError::MissingCredentials.into());
    }
    let record = users.lock().await.find_by_name(body.username.trim()).cloned();
    let record = match record {
        Some(record) if record.is_active => record,
        _ => return Err(AccountError::InvalidCredentials.into()),
    };
    if !password::verify(body.password, record.password_hash.clone()).await? {
        return Err(AccountError::InvalidCredentials.into());
    }
    let token = signer
        .issue(record.id)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(AuthResponse {
        user: record.to_user(),
        token,
    }))
}

/// Replace the signed-in user's password
#[openapi]
#[put("/auth/update-password", format = "json", data = "<body>")]
pub async fn update_password(
    auth: AuthenticatedUser,
    users: &State<SharedUsers>,
    config: &State<AppConfig>,
    body: Result<Json<UpdatePasswordRequest>, json::Error<'_>>,
) -> Result<Json<User>, ApiError> {
    let body = json_body(body)?;
    if body.user_id.trim().is_empty() || body.new_password.is_empty() {
        return Err(ApiError::Validation(
            "User ID and new password are required".to_string(),
        ));
    }
    validate_password(&body.new_password)?;
    let user_id = parse_user_id(&body.user_id)?;
    // Ownership first, so other users' ids never reveal whether they exist.
    if user_id != auth.user_id {
        return Err(ApiError::Unauthorized(
            "You can only change your own password.".to_string(),
        ));
    }
    if users.lock().await.get(&user_id).is_none() {
        return Err(AccountError::UserNotFound.into());
    }
    let hash = password::hash(body.new_password, config.bcrypt_cost).await?;
    let user = users.lock().await.set_password_hash(&user_id, hash)?;
    Ok(Json(user))
}

/// Deactivate the signed-in user's account
#[openapi]
#[delete("/auth/delete-user", format = "json", data = "<body>")]
pub async fn delete_user(
    auth: AuthenticatedUser,
    users: &State<SharedUsers>,
    body: Result<Json<DeleteUserRequest>, json::Error<'_>>,
) -> Result<Json<User>, ApiError> {
    let body = json_body(body)?;
    if body.user_id.trim().is_empty() {
        return Err(ApiError::Validation("User ID is required".to_string()));
    }
    let user_id = parse_user_id(&body.user_id)?;
    if user_id != auth.user_id {
        return Err(ApiError::Unauthorized(
            "You can only delete your own account.".to_string(),
        ));
    }
    let mut users = users.lock().await;
    if users.get(&user_id).is_none() {
        return Err(AccountError::UserNotFound.into());
    }
    let user = users.deactivate(&user_id)?;
    log::info!("deactivated user {} ({})", user.username, user.id);
    Ok(Json(user))
}
