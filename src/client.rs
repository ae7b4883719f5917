use std::time::{Duration, Instant};

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::inference::{ChatBackend, ChunkStream};
use crate::observability::{CLIENT_REQUESTS, CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS};
use crate::sse::process_sse;
use crate::types::{ChatCompletion, ChatCompletionParams};

/// Base URL of Groq's OpenAI-compatible API.
pub const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for the Groq chat completions API.
#[derive(Debug, Clone)]
pub struct GroqClient {
    authorization: HeaderValue,
    client: ReqwestClient,
    endpoint: Url,
    timeout: Duration,
}

impl GroqClient {
    /// Create a new Groq client with the default endpoint and timeout.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_options(api_key, None, None)
    }

    /// Create a new client with custom settings.
    ///
    /// `base_url` is the API root; `chat/completions` is resolved against it.
    pub fn with_options(
        api_key: impl Into<String>,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::authentication(
                "API key not provided; set GROQ_API_KEY",
            ));
        }
        let mut authorization = HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
            .map_err(|_| Error::authentication("API key contains invalid characters"))?;
        authorization.set_sensitive(true);

        let endpoint = chat_completions_url(base_url.as_deref().unwrap_or(DEFAULT_API_URL))?;

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::configuration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            authorization,
            client,
            endpoint,
            timeout,
        })
    }

    /// Returns the chat completions URL requests are sent to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Returns the request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(header::AUTHORIZATION, self.authorization.clone());
        headers
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        #[derive(Deserialize)]
        struct ErrorResponse {
            error: Option<ErrorDetail>,
        }

        #[derive(Deserialize)]
        struct ErrorDetail {
            #[serde(rename = "type")]
            error_type: Option<String>,
            message: Option<String>,
            param: Option<String>,
        }

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::inference_transport(
                    format!("Failed to read error response: {e}"),
                    Some(Box::new(e)),
                );
            }
        };

        let detail = serde_json::from_str::<ErrorResponse>(&error_body)
            .ok()
            .and_then(|e| e.error);
        let error_type = detail.as_ref().and_then(|e| e.error_type.clone());
        let error_param = detail.as_ref().and_then(|e| e.param.clone());
        let error_message = detail
            .and_then(|e| e.message)
            .unwrap_or(error_body);

        match status_code {
            400 => Error::validation(error_message, error_param),
            401 => Error::authentication(error_message),
            408 | 504 => Error::timeout(error_message, None),
            429 => Error::rate_limit(error_message, retry_after),
            _ => Error::api(status_code, error_type, error_message),
        }
    }

    async fn post(&self, params: &ChatCompletionParams, accept: &'static str) -> Result<Response> {
        let mut headers = self.default_headers();
        headers.insert(header::ACCEPT, HeaderValue::from_static(accept));

        CLIENT_REQUESTS.click();
        let started = Instant::now();
        let result = self
            .client
            .post(self.endpoint.clone())
            .headers(headers)
            .json(params)
            .send()
            .await;
        CLIENT_REQUEST_DURATION.add(started.elapsed().as_secs_f64());

        let response = result.map_err(|e| {
            CLIENT_REQUEST_ERRORS.click();
            if e.is_timeout() {
                Error::timeout(
                    format!("Request timed out: {e}"),
                    Some(self.timeout.as_secs_f64()),
                )
            } else {
                Error::inference_transport(format!("Request failed: {e}"), Some(Box::new(e)))
            }
        })?;

        if !response.status().is_success() {
            CLIENT_REQUEST_ERRORS.click();
            let err = Self::process_error_response(response).await;
            warn!(error = %err, "chat completions request rejected");
            return Err(err);
        }
        debug!(status = response.status().as_u16(), "chat completions request accepted");
        Ok(response)
    }

    /// Send a request and get a non-streaming response.
    pub async fn send(&self, mut params: ChatCompletionParams) -> Result<ChatCompletion> {
        params.stream = false;
        let response = self.post(&params, "application/json").await?;
        response.json::<ChatCompletion>().await.map_err(|e| {
            if e.is_timeout() {
                Error::timeout(
                    format!("Timed out reading response: {e}"),
                    Some(self.timeout.as_secs_f64()),
                )
            } else {
                Error::serialization(format!("Failed to parse response: {e}"), Some(Box::new(e)))
            }
        })
    }

    /// Send a request and get a streaming response.
    ///
    /// Returns a stream of completion chunks that can be processed incrementally.
    pub async fn stream(&self, mut params: ChatCompletionParams) -> Result<ChunkStream> {
        params.stream = true;
        let response = self.post(&params, "text/event-stream").await?;
        Ok(Box::pin(process_sse(response.bytes_stream())))
    }
}

#[async_trait::async_trait]
impl ChatBackend for GroqClient {
    async fn stream_chat(&self, params: ChatCompletionParams) -> Result<ChunkStream> {
        self.stream(params).await
    }

    async fn complete_chat(&self, params: ChatCompletionParams) -> Result<ChatCompletion> {
        self.send(params).await
    }
}

fn chat_completions_url(base_url: &str) -> Result<Url> {
    let mut base = Url::parse(base_url)
        .map_err(|e| Error::configuration(format!("invalid base url '{base_url}': {e}")))?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("chat/completions")
        .map_err(|e| Error::configuration(format!("invalid base url '{base_url}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChatCompletionChunk, ChatMessageParam};
    use futures::StreamExt;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn params() -> ChatCompletionParams {
        ChatCompletionParams::new(
            "meta-llama/llama-4-scout-17b-16e-instruct",
            vec![ChatMessageParam::user("Hello")],
            0.5,
            128,
        )
        .with_top_p(1.0)
    }

    fn client_for(server: &MockServer) -> GroqClient {
        GroqClient::with_options("test-key", Some(server.uri()), Some(Duration::from_secs(5)))
            .unwrap()
    }

    #[test]
    fn client_creation() {
        let client = GroqClient::new("test-key").unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            "https://api.groq.com/openai/v1/chat/completions"
        );
        assert_eq!(client.timeout(), DEFAULT_TIMEOUT);

        let client = GroqClient::with_options(
            "test-key",
            Some("https://custom-api.example.com/v2".to_string()),
            Some(Duration::from_secs(30)),
        )
        .unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            "https://custom-api.example.com/v2/chat/completions"
        );
        assert_eq!(client.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn missing_api_key_is_an_authentication_error() {
        let err = GroqClient::new("  ").unwrap_err();
        assert!(err.is_authentication());
    }

    #[test]
    fn invalid_base_url_is_a_configuration_error() {
        let err = GroqClient::with_options("key", Some("not a url".to_string()), None).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[tokio::test]
    async fn stream_sends_bearer_auth_and_decodes_chunks() {
        let server = MockServer::start().await;
        let body = concat!(
            "data: {\"id\":\"c1\",\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\",\"content\":\"\"}}]}\n\n",
            "data: {\"id\":\"c1\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hi\"}}]}\n\n",
            "data: {\"id\":\"c1\",\"choices\":[{\"index\":0,\"delta\":{},\"finish_reason\":\"stop\"}],",
            "\"x_groq\":{\"usage\":{\"prompt_tokens\":5,\"completion_tokens\":1,\"total_tokens\":6}}}\n\n",
            "data: [DONE]\n\n",
        );
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({"stream": true, "top_p": 1.0, "max_completion_tokens": 128})))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(body),
            )
            .expect(1)
            .mount(&server)
            .await;

        let chunks: Vec<_> = client_for(&server)
            .stream(params())
            .await
            .unwrap()
            .collect()
            .await;
        assert_eq!(chunks.len(), 3);
        let chunks: Vec<ChatCompletionChunk> = chunks.into_iter().map(|c| c.unwrap()).collect();
        assert_eq!(chunks[1].content(), Some("Hi"));
        assert_eq!(chunks[2].finish_reason(), Some("stop"));
        assert_eq!(chunks[2].usage().map(|u| u.total_tokens), Some(6));
    }

    #[tokio::test]
    async fn send_returns_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({"stream": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl-1",
                "model": "meta-llama/llama-4-scout-17b-16e-instruct",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": "Hello there"},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 4, "completion_tokens": 2, "total_tokens": 6}
            })))
            .mount(&server)
            .await;

        let completion = client_for(&server).send(params()).await.unwrap();
        assert_eq!(completion.text(), "Hello there");
        assert_eq!(completion.usage.map(|u| u.total_tokens), Some(6));
    }

    #[tokio::test]
    async fn error_statuses_map_to_error_kinds() {
        for status in [400u16, 401, 429, 504, 503] {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/chat/completions"))
                .respond_with(
                    ResponseTemplate::new(status)
                        .insert_header("retry-after", "7")
                        .set_body_json(json!({
                            "error": {"message": "nope", "type": "invalid_request_error"}
                        })),
                )
                .mount(&server)
                .await;

            let Err(err) = client_for(&server).stream(params()).await else {
                panic!("status {status} opened a stream");
            };
            let expected = match status {
                400 => err.is_validation(),
                401 => err.is_authentication(),
                429 => matches!(err, Error::RateLimit { retry_after: Some(7), .. }),
                504 => err.is_timeout(),
                _ => err.status_code() == Some(status),
            };
            assert!(expected, "status {status} produced {err:?}");
            assert!(err.to_string().contains("nope"));
        }
    }

    #[tokio::test]
    async fn unparseable_error_body_is_kept_as_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .mount(&server)
            .await;

        let err = client_for(&server).send(params()).await.unwrap_err();
        assert_eq!(err.status_code(), Some(500));
        assert!(err.to_string().contains("upstream exploded"));
    }

    #[tokio::test]
    async fn slow_endpoint_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let client =
            GroqClient::with_options("test-key", Some(server.uri()), Some(Duration::from_millis(200)))
                .unwrap();
        let err = client.send(params()).await.unwrap_err();
        assert!(err.is_timeout());
    }
}
