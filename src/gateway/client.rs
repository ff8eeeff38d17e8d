use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};

use super::GatewayError;

/// One structured-output request to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub prompt: String,
    pub response_schema: Value,
}

/// The only seam to the external model. Returns the raw reply text.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn generate(&self, request: &ModelRequest) -> Result<String, GatewayError>;
}

/// Gemini `generateContent` over HTTPS.
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(base_url: &str, model: &str, api_key: Option<String>) -> Self {
        GeminiClient {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn generate(&self, request: &ModelRequest) -> Result<String, GatewayError> {
        let api_key = self.api_key.as_deref().ok_or(GatewayError::MissingApiKey)?;
        let body = json!({
            "contents": [
                { "role": "user", "parts": [ { "text": request.prompt } ] }
            ],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": request.response_schema,
            }
        });

        let resp = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        let text = resp.text().await?;
        read_reply(status, &text)
    }
}

fn read_reply(status: StatusCode, body: &str) -> Result<String, GatewayError> {
    if !status.is_success() {
        return Err(GatewayError::Http {
            status: status.as_u16(),
            message: error_message(body),
        });
    }
    extract_text(body)
}

/// Concatenates the text parts of the first candidate.
pub fn extract_text(body: &str) -> Result<String, GatewayError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| GatewayError::MalformedResponse(format!("envelope: {e}")))?;
    let parts = value
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .ok_or_else(|| GatewayError::MalformedResponse("reply has no candidates".to_string()))?;
    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect();
    if text.trim().is_empty() {
        return Err(GatewayError::MalformedResponse(
            "no response text from model".to_string(),
        ));
    }
    Ok(text)
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")?
                .get("message")?
                .as_str()
                .map(|s| s.to_string())
        })
        .unwrap_or_else(|| body.chars().take(200).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_joined_text_parts() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"{\"a\":"},{"text":"1}"}]}}]}"#;
        assert_eq!(extract_text(body).expect("text"), "{\"a\":1}");
    }

    #[test]
    fn empty_reply_is_malformed() {
        let body = r#"{"candidates":[{"content":{"parts":[]}}]}"#;
        assert!(matches!(
            extract_text(body),
            Err(GatewayError::MalformedResponse(_))
        ));
        assert!(matches!(
            extract_text(r#"{"promptFeedback":{}}"#),
            Err(GatewayError::MalformedResponse(_))
        ));
    }

    #[test]
    fn any_success_status_carries_a_reply() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"{}"}]}}]}"#;
        assert_eq!(read_reply(StatusCode::OK, body).expect("text"), "{}");
        assert_eq!(read_reply(StatusCode::CREATED, body).expect("text"), "{}");
        assert!(matches!(
            read_reply(StatusCode::TOO_MANY_REQUESTS, r#"{"error":{"message":"slow down"}}"#),
            Err(GatewayError::Http { status: 429, ref message }) if message == "slow down"
        ));
    }

    #[test]
    fn error_message_prefers_api_error_field() {
        let body = r#"{"error":{"code":503,"message":"The model is overloaded."}}"#;
        assert_eq!(error_message(body), "The model is overloaded.");
        assert_eq!(error_message("upstream gone"), "upstream gone");
    }

    #[tokio::test]
    async fn missing_api_key_fails_before_any_request() {
        let client = GeminiClient::new("http://127.0.0.1:9", "m", None);
        let request = ModelRequest {
            prompt: "hi".to_string(),
            response_schema: json!({}),
        };
        assert!(matches!(
            client.generate(&request).await,
            Err(GatewayError::MissingApiKey)
        ));
    }
}
