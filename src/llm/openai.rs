use super::{CompletionRequest, LlmClient, LlmClientError, ResponseFormat};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};

/// Chat client for OpenAI-compatible `/chat/completions` endpoints.
pub struct OpenAiChatClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiChatClient {
    /// Create a client against `base_url` (for example `https://api.openai.com/v1`).
    pub fn new(base_url: String, api_key: String, model: String) -> Result<Self, LlmClientError> {
        let http = Client::builder()
            .user_agent("legalyze/chat")
            .build()
            .map_err(|error| LlmClientError::ProviderUnavailable(error.to_string()))?;
        Ok(Self {
            http,
            base_url,
            api_key,
            model,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn payload(&self, request: &CompletionRequest) -> Value {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system.as_ref() {
            messages.push(json!({ "role": "system", "content": system }));
        }
        messages.push(json!({ "role": "user", "content": request.prompt }));

        let mut payload = json!({
            "model": self.model,
            "messages": messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });
        if request.response_format == ResponseFormat::JsonObject
            && let Some(object) = payload.as_object_mut()
        {
            object.insert(
                "response_format".into(),
                json!({ "type": "json_object" }),
            );
        }
        payload
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl LlmClient for OpenAiChatClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmClientError> {
        let payload = self.payload(&request);
        tracing::debug!(
            model = %self.model,
            max_tokens = request.max_tokens,
            json = request.response_format == ResponseFormat::JsonObject,
            "Requesting chat completion"
        );

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                LlmClientError::ProviderUnavailable(format!(
                    "failed to reach {}: {error}",
                    self.base_url
                ))
            })?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(LlmClientError::ProviderUnavailable(
                "API key rejected (401)".into(),
            ));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmClientError::GenerationFailed(format!(
                "chat completion returned {status}: {body}"
            )));
        }

        let body: ChatCompletionResponse = response.json().await.map_err(|error| {
            LlmClientError::InvalidResponse(format!("failed to decode completion: {error}"))
        })?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| LlmClientError::InvalidResponse("completion had no content".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    fn client(base_url: String) -> OpenAiChatClient {
        OpenAiChatClient::new(base_url, "sk-test".into(), "gpt-4o".into()).expect("client")
    }

    #[tokio::test]
    async fn sends_json_mode_and_returns_content() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat/completions")
                    .header("authorization", "Bearer sk-test")
                    .json_body_partial(
                        r#"{"model":"gpt-4o","max_tokens":150,"response_format":{"type":"json_object"}}"#,
                    );
                then.status(200).json_body(json!({
                    "choices": [
                        { "message": { "role": "assistant", "content": " {\"document_type\":\"Lease\"} " } }
                    ]
                }));
            })
            .await;

        let reply = client(server.base_url())
            .complete(CompletionRequest::new("Classify", 0.2, 150).json())
            .await
            .expect("completion");

        mock.assert();
        assert_eq!(reply, "{\"document_type\":\"Lease\"}");
    }

    #[tokio::test]
    async fn includes_system_message_first() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions").json_body_partial(
                    r#"{"messages":[{"role":"system","content":"be brief"},{"role":"user","content":"hi"}]}"#,
                );
                then.status(200).json_body(json!({
                    "choices": [{ "message": { "content": "hello" } }]
                }));
            })
            .await;

        let reply = client(server.base_url())
            .complete(CompletionRequest::new("hi", 0.3, 10).with_system("be brief"))
            .await
            .expect("completion");

        mock.assert();
        assert_eq!(reply, "hello");
    }

    #[tokio::test]
    async fn surfaces_error_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(500).body("boom");
            })
            .await;

        let error = client(server.base_url())
            .complete(CompletionRequest::new("hi", 0.3, 10))
            .await
            .expect_err("error response");

        assert!(
            matches!(error, LlmClientError::GenerationFailed(ref message) if message.contains("500"))
        );
    }

    #[tokio::test]
    async fn rejects_empty_choices() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200).json_body(json!({ "choices": [] }));
            })
            .await;

        let error = client(server.base_url())
            .complete(CompletionRequest::new("hi", 0.3, 10))
            .await
            .expect_err("empty choices");

        assert!(matches!(error, LlmClientError::InvalidResponse(_)));
    }
}
