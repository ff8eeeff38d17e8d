use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

/// Body of every non-2xx response.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct Status {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn new_status(message: String) -> Json<Status> {
    Json(Status {
        message,
        error: None,
    })
}

pub fn new_status_with_error(message: String, error: String) -> Json<Status> {
    Json(Status {
        message,
        error: Some(error),
    })
}
