//! HTTP model client
//!
//! Reference adapter speaking the OpenAI-compatible chat-completions
//! protocol. One request per prompt, no retries: transport and non-OK HTTP
//! responses are fatal to the session by design. JSON-mode calls reuse the
//! text path and run the reply through the domain's JSON extraction; an
//! extraction failure becomes the parse-error envelope, never an error.

use async_trait::async_trait;
use conclave_application::{ClientError, CompletionOptions, ModelClient};
use conclave_domain::{JsonReply, json::extract_json};
use serde_json::{Value, json};
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct HttpModelClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl HttpModelClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: None,
            model: model.into(),
        }
    }

    /// Endpoint and key from `CONCLAVE_API_BASE_URL` / `CONCLAVE_API_KEY`.
    pub fn from_env(model: impl Into<String>) -> Self {
        let base_url = std::env::var("CONCLAVE_API_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let mut client = Self::new(base_url, model);
        if let Ok(key) = std::env::var("CONCLAVE_API_KEY") {
            client.api_key = Some(key);
        }
        client
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    async fn chat(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, ClientError> {
        let mut body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_prompt},
            ],
        });
        if let Some(temperature) = options.temperature {
            body["temperature"] = json!(temperature);
        }
        if let Some(max_tokens) = options.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        let mut request = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ClientError::ConnectionError(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ClientError::AuthError(format!("HTTP {status}")));
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ClientError::RequestFailed(format!("HTTP {status}: {detail}")));
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| ClientError::RequestFailed(e.to_string()))?;
        let content = value["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                ClientError::RequestFailed("response carries no message content".to_string())
            })?;
        debug!(model = %self.model, bytes = content.len(), "completion received");
        Ok(content.to_string())
    }
}

#[async_trait]
impl ModelClient for HttpModelClient {
    async fn complete_text(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, ClientError> {
        self.chat(system_prompt, user_prompt, options).await
    }

    async fn complete_json(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &CompletionOptions,
    ) -> Result<JsonReply, ClientError> {
        let raw = self.chat(system_prompt, user_prompt, options).await?;
        match extract_json(&raw) {
            Ok(value) => Ok(JsonReply::Value(value)),
            Err(message) => Ok(JsonReply::parse_error(message, raw)),
        }
    }
}
