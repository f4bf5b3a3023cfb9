//! Chat completions client

use super::models::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use super::relay::{spawn_relay, RelayStream};
use super::LlmError;
use crate::config::LlmSettings;
use crate::network::{HttpClient, ProviderRequest};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Client for an OpenAI-compatible chat completions endpoint
#[derive(Clone)]
pub struct LlmClient {
    client: HttpClient,
    settings: LlmSettings,
}

impl LlmClient {
    pub fn new(client: HttpClient, settings: LlmSettings) -> Self {
        Self { client, settings }
    }

    fn request(&self, messages: &[ChatMessage], stream: bool) -> Result<ProviderRequest, LlmError> {
        let body = ChatCompletionRequest {
            model: &self.settings.model,
            messages,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            stream,
        };
        let body = serde_json::to_value(&body).map_err(|e| LlmError::Decode(e.to_string()))?;

        Ok(ProviderRequest::post(&self.settings.endpoint)
            .header("Content-Type", "application/json")
            .bearer(self.settings.api_key.clone().unwrap_or_default())
            .json(body))
    }

    /// Run a buffered completion and return the first choice's content
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let request = self.request(messages, false)?;
        debug!("Requesting completion from {}", self.settings.model);

        let timeout = Duration::from_secs_f64(self.settings.request_timeout);
        let response = self
            .client
            .execute_with_timeout(request, timeout)
            .await
            .map_err(|e| {
                warn!("Completion request failed: {}", e);
                LlmError::Network(e)
            })?;

        if !response.is_success() {
            warn!(
                "Completion API error: HTTP {}: {}",
                response.status, response.text
            );
            return Err(LlmError::Status {
                status: response.status,
            });
        }

        let data: ChatCompletionResponse = response
            .json()
            .map_err(|e| LlmError::Decode(e.to_string()))?;

        match data.into_content() {
            Some(content) if !content.trim().is_empty() => Ok(content),
            _ => Err(LlmError::EmptyCompletion),
        }
    }

    /// Start a streamed completion and relay its content deltas.
    ///
    /// Fails before any byte is relayed when the provider answers with a
    /// non-success status.
    pub async fn stream(&self, messages: &[ChatMessage]) -> Result<RelayStream, LlmError> {
        let request = self.request(messages, true)?;
        debug!("Requesting streamed completion from {}", self.settings.model);

        let response = self.client.execute_streaming(request).await.map_err(|e| {
            warn!("Streaming request failed: {}", e);
            LlmError::Network(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!("Streaming API error: HTTP {}: {}", status.as_u16(), text);
            return Err(LlmError::Status {
                status: status.as_u16(),
            });
        }

        info!("Relaying streamed completion from {}", self.settings.model);
        Ok(spawn_relay(response.bytes_stream()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutgoingSettings;
    use bytes::Bytes;
    use futures::StreamExt;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> LlmClient {
        let settings = LlmSettings {
            endpoint: format!("{}/chat/completions", server.uri()),
            api_key: Some("test-key".to_string()),
            ..Default::default()
        };
        LlmClient::new(HttpClient::new().unwrap(), settings)
    }

    #[tokio::test]
    async fn test_complete() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "deepseek-chat",
                "max_tokens": 1000,
                "temperature": 0.7,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "Rust is a language."}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let content = client_for(&server)
            .complete(&[ChatMessage::user("what is rust")])
            .await
            .unwrap();
        assert_eq!(content, "Rust is a language.");
    }

    #[tokio::test]
    async fn test_complete_outlives_outgoing_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({
                        "choices": [{"message": {"role": "assistant", "content": "slow answer"}}]
                    }))
                    .set_delay(std::time::Duration::from_millis(300)),
            )
            .mount(&server)
            .await;

        let outgoing = OutgoingSettings {
            request_timeout: 0.05,
            ..Default::default()
        };
        let settings = LlmSettings {
            endpoint: format!("{}/chat/completions", server.uri()),
            request_timeout: 5.0,
            ..Default::default()
        };
        let client = LlmClient::new(HttpClient::with_settings(&outgoing).unwrap(), settings);

        let content = client.complete(&[ChatMessage::user("x")]).await.unwrap();
        assert_eq!(content, "slow answer");
    }

    #[tokio::test]
    async fn test_complete_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(std::time::Duration::from_millis(500)))
            .mount(&server)
            .await;

        let settings = LlmSettings {
            endpoint: format!("{}/chat/completions", server.uri()),
            request_timeout: 0.05,
            ..Default::default()
        };
        let client = LlmClient::new(HttpClient::new().unwrap(), settings);

        let err = client.complete(&[ChatMessage::user("x")]).await.unwrap_err();
        assert!(matches!(err, LlmError::Network(ref e) if e.is_timeout()));
    }

    #[tokio::test]
    async fn test_complete_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .complete(&[ChatMessage::user("x")])
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Status { status: 401 }));
    }

    #[tokio::test]
    async fn test_complete_empty_choices() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .complete(&[ChatMessage::user("x")])
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::EmptyCompletion));
    }

    #[tokio::test]
    async fn test_stream_relays_deltas() {
        let server = MockServer::start().await;
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"**Sunny**\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\" today\"}}]}\n\n",
            "data: [DONE]\n\n",
        );
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"stream": true})))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .mount(&server)
            .await;

        let stream = client_for(&server)
            .stream(&[ChatMessage::user("weather")])
            .await
            .unwrap();
        let chunks: Vec<Bytes> = stream.map(|item| item.unwrap()).collect().await;
        let text: String = chunks
            .iter()
            .map(|b| std::str::from_utf8(b).unwrap())
            .collect();

        assert_eq!(text, "**Sunny** today");
    }

    #[tokio::test]
    async fn test_stream_status_error_before_streaming() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .stream(&[ChatMessage::user("x")])
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Status { status: 503 }));
    }
}
