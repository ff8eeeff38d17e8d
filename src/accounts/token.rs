//! Signed session tokens and the request guard that checks them.
//!
//! A token is `<userId>.<expiresUnix>.<hex HMAC-SHA256 of the first two parts>`.

use std::time::Duration;

use chrono::Utc;
use hmac::{Hmac, Mac};
use okapi::openapi3::{Object, SecurityRequirement, SecurityScheme, SecuritySchemeData};
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome, Request};
use rocket_okapi::gen::OpenApiGenerator;
use rocket_okapi::request::{OpenApiFromRequest, RequestHeaderInput};
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

use super::SharedUsers;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("missing bearer token")]
    Missing,
    #[error("malformed token")]
    Malformed,
    #[error("bad token signature")]
    BadSignature,
    #[error("token expired")]
    Expired,
    #[error("user is unknown or inactive")]
    InactiveUser,
    #[error("signing key rejected")]
    SigningKey,
}

#[derive(Clone)]
pub struct TokenSigner {
    key: Vec<u8>,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        TokenSigner {
            key: secret.as_bytes().to_vec(),
            ttl,
        }
    }

    fn mac(&self, payload: &str) -> Result<HmacSha256, TokenError> {
        let mut mac =
            HmacSha256::new_from_slice(&self.key).map_err(|_| TokenError::SigningKey)?;
        mac.update(payload.as_bytes());
        Ok(mac)
    }

    pub fn issue(&self, user_id: Uuid) -> Result<String, TokenError> {
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        self.issue_until(user_id, Utc::now().timestamp().saturating_add(ttl))
    }

    pub fn issue_until(&self, user_id: Uuid, expires_unix: i64) -> Result<String, TokenError> {
        let payload = format!("{user_id}.{expires_unix}");
        let signature = hex::encode(self.mac(&payload)?.finalize().into_bytes());
        Ok(format!("{payload}.{signature}"))
    }

    pub fn verify(&self, token: &str) -> Result<Uuid, TokenError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    pub fn verify_at(&self, token: &str, now_unix: i64) -> Result<Uuid, TokenError> {
        let (payload, signature) = token.rsplit_once('.').ok_or(TokenError::Malformed)?;
        let (user_id, expires) = payload.split_once('.').ok_or(TokenError::Malformed)?;
        let signature = hex::decode(signature).map_err(|_| TokenError::Malformed)?;
        self.mac(payload)?
            .verify_slice(&signature)
            .map_err(|_| TokenError::BadSignature)?;
        let expires: i64 = expires.parse().map_err(|_| TokenError::Malformed)?;
        if now_unix >= expires {
            return Err(TokenError::Expired);
        }
        Uuid::parse_str(user_id).map_err(|_| TokenError::Malformed)
    }
}

/// A request carrying a valid bearer token for an active user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthenticatedUser {
    type Error = TokenError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let token = match req
            .headers()
            .get_one("Authorization")
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(token) => token.trim(),
            None => return Outcome::Error((Status::Unauthorized, TokenError::Missing)),
        };
        let (signer, users) = match (
            req.rocket().state::<TokenSigner>(),
            req.rocket().state::<SharedUsers>(),
        ) {
            (Some(signer), Some(users)) => (signer, users),
            _ => {
                log::error!("token signer or user store is not managed");
                return Outcome::Error((Status::InternalServerError, TokenError::Missing));
            }
        };
        let user_id = match signer.verify(token) {
            Ok(id) => id,
            Err(TokenError::SigningKey) => {
                log::error!("token signer rejected its key");
                return Outcome::Error((Status::InternalServerError, TokenError::SigningKey));
            }
            Err(e) => {
                log::info!("rejected token: {e}");
                return Outcome::Error((Status::Unauthorized, e));
            }
        };
        if !users.lock().await.is_active(&user_id) {
            return Outcome::Error((Status::Unauthorized, TokenError::InactiveUser));
        }
        Outcome::Success(AuthenticatedUser { user_id })
    }
}

impl<'a> OpenApiFromRequest<'a> for AuthenticatedUser {
    fn from_request_input(
        _gen: &mut OpenApiGenerator,
        _name: String,
        _required: bool,
    ) -> rocket_okapi::Result<RequestHeaderInput> {
        let scheme = SecurityScheme {
            description: Some("Session token returned by signup or login.".to_string()),
            data: SecuritySchemeData::Http {
                scheme: "bearer".to_string(),
                bearer_format: Some("token".to_string()),
            },
            extensions: Object::default(),
        };
        let mut requirement = SecurityRequirement::new();
        requirement.insert("BearerAuth".to_string(), Vec::new());
        Ok(RequestHeaderInput::Security(
            "BearerAuth".to_string(),
            scheme,
            requirement,
        ))
    }
}
