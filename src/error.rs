//! The single error type every endpoint returns.

use okapi::openapi3::Responses;
use rocket::http::Status as HttpStatus;
use rocket::request::Request;
use rocket::response::{self, status::Custom, Responder};
use rocket::serde::json::Json;
use rocket_okapi::gen::OpenApiGenerator;
use rocket_okapi::response::OpenApiResponderInner;
use rocket_okapi::util::add_schema_response;
use thiserror::Error;

use crate::gateway::GatewayError;
use crate::status_messages::{new_status, new_status_with_error, Status};

pub const OVERLOADED_MESSAGE: &str =
    "The AI strategist is currently overwhelmed. Please try again in a moment.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{message}: {detail}")]
    Upstream {
        overloaded: bool,
        message: String,
        detail: String,
    },
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Wraps a gateway failure with the operation's user-facing fallback text.
    pub fn upstream(fallback: &str, err: GatewayError) -> ApiError {
        log::error!("{fallback} ({err})");
        let overloaded = err.is_overloaded();
        ApiError::Upstream {
            overloaded,
            message: if overloaded {
                OVERLOADED_MESSAGE.to_string()
            } else {
                fallback.to_string()
            },
            detail: err.to_string(),
        }
    }

    pub fn status(&self) -> HttpStatus {
        match self {
            ApiError::Validation(_) => HttpStatus::BadRequest,
            ApiError::Unauthorized(_) => HttpStatus::Unauthorized,
            ApiError::NotFound(_) => HttpStatus::NotFound,
            ApiError::Conflict(_) => HttpStatus::Conflict,
            ApiError::Upstream {
                overloaded: true, ..
            } => HttpStatus::ServiceUnavailable,
            ApiError::Upstream { .. } | ApiError::Internal(_) => HttpStatus::InternalServerError,
        }
    }

    fn body(self) -> Json<Status> {
        match self {
            ApiError::Validation(message)
            | ApiError::Unauthorized(message)
            | ApiError::NotFound(message)
            | ApiError::Conflict(message) => new_status(message),
            ApiError::Upstream {
                message, detail, ..
            } => new_status_with_error(message, detail),
            ApiError::Internal(detail) => {
                new_status_with_error("Internal server error".to_string(), detail)
            }
        }
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        if status.code >= 500 {
            log::error!("{} {}: {self}", req.method(), req.uri());
        }
        Custom(status, self.body()).respond_to(req)
    }
}

impl OpenApiResponderInner for ApiError {
    fn responses(gen: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        let mut responses = Responses::default();
        let schema = gen.json_schema::<Status>();
        for code in [400, 401, 404, 409, 500, 503] {
            add_schema_response(&mut responses, code, "application/json", schema.clone())?;
        }
        Ok(responses)
    }
}

/// Turns a rejected JSON body into a 400 instead of Rocket's 422.
pub fn json_body<T>(body: Result<Json<T>, rocket::serde::json::Error<'_>>) -> Result<T, ApiError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(e) => Err(ApiError::Validation(format!("Invalid request body: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn overload_maps_to_503_with_try_again_message() {
        let err = ApiError::upstream(
            "Failed to process your choice. The winds of fate are turbulent.",
            GatewayError::Http {
                status: 429,
                message: "quota".to_string(),
            },
        );
        assert_eq!(err.status(), HttpStatus::ServiceUnavailable);
        let Json(body) = err.body();
        assert_eq!(body.message, OVERLOADED_MESSAGE);
        assert!(body.error.unwrap_or_default().contains("429"));
    }

    #[test]
    fn other_gateway_failures_use_the_fallback() {
        let fallback = "Failed to calculate your final score. Your legacy is too grand to measure.";
        let err = ApiError::upstream(fallback, GatewayError::Timeout(Duration::from_secs(60)));
        assert_eq!(err.status(), HttpStatus::InternalServerError);
        assert_eq!(err.body().message, fallback);
    }

    #[test]
    fn client_errors_carry_only_a_message() {
        let Json(body) = ApiError::Conflict("Username already exists".to_string()).body();
        assert_eq!(body.message, "Username already exists");
        assert!(body.error.is_none());
    }
}
