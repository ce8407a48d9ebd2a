use async_trait::async_trait;
use llm::builder::{LLMBackend, LLMBuilder};
use llm::chat::ChatMessage;
use url::Url;

use coderev_core::{AzureSettings, ChatRole, ChatTurn};

/// One outbound chat completion. Implementations return the raw text of the
/// first choice, or a human-readable error.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, model: &str, messages: &[ChatTurn]) -> Result<String, String>;
}

/// Azure OpenAI chat completions through the `llm` crate.
#[derive(Debug, Clone)]
pub struct LlmClient {
    settings: AzureSettings,
}

impl LlmClient {
    pub fn new(settings: AzureSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl CompletionClient for LlmClient {
    async fn complete(&self, model: &str, messages: &[ChatTurn]) -> Result<String, String> {
        generate(&self.settings, model, messages).await
    }
}

/// Check that `endpoint` is an absolute http(s) URL. The `llm` Azure backend
/// panics on anything it cannot parse, so this must run before `build()`.
pub fn parse_endpoint(endpoint: &str) -> Result<Url, String> {
    let url = Url::parse(endpoint).map_err(|e| format!("invalid endpoint {endpoint:?}: {e}"))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        _ => Err(format!(
            "invalid endpoint {endpoint:?}: expected an http(s) URL with a host"
        )),
    }
}

pub async fn generate(
    settings: &AzureSettings,
    model: &str,
    turns: &[ChatTurn],
) -> Result<String, String> {
    // The builder takes the system prompt separately from the chat history.
    let system = turns
        .iter()
        .filter(|t| t.role == ChatRole::System)
        .map(|t| t.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    let endpoint = settings.endpoint.trim_end_matches('/');
    parse_endpoint(endpoint)?;

    let mut builder = LLMBuilder::new()
        .backend(LLMBackend::AzureOpenAI)
        .base_url(endpoint)
        .api_version(&settings.api_version)
        .deployment_id(model)
        .model(model);

    if !system.is_empty() {
        builder = builder.system(system);
    }
    if !settings.api_key.is_empty() {
        builder = builder.api_key(&settings.api_key);
    }

    let llm = builder.build().map_err(|e| format!("build LLM: {e}"))?;

    let messages: Vec<ChatMessage> = turns
        .iter()
        .filter_map(|t| match t.role {
            ChatRole::System => None,
            ChatRole::User => Some(ChatMessage::user().content(&t.content).build()),
            ChatRole::Assistant => Some(ChatMessage::assistant().content(&t.content).build()),
        })
        .collect();

    let response = llm.chat(&messages).await.map_err(|e| format!("chat: {e}"))?;

    response
        .text()
        .ok_or_else(|| "LLM returned no text".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings_for(server: &MockServer) -> AzureSettings {
        with_endpoint(server.uri())
    }

    fn with_endpoint(endpoint: String) -> AzureSettings {
        AzureSettings {
            api_key: "test-key".to_string(),
            endpoint,
            deployment: "gpt-test".to_string(),
            api_version: "2024-02-01".to_string(),
        }
    }

    fn turns() -> Vec<ChatTurn> {
        vec![
            ChatTurn::system("You are a helpful coding assistant."),
            ChatTurn::user("User provided code:\nint x = 1;"),
            ChatTurn::assistant("Find the bugs."),
        ]
    }

    fn completion_body(content: &str) -> serde_json::Value {
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1_700_000_000,
            "model": "gpt-test",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 3, "total_tokens": 13}
        })
    }

    async fn mount_chat_completions(server: &MockServer, content: &str) {
        Mock::given(method("POST"))
            .and(path("/openai/v1/chat/completions"))
            .and(query_param("api-version", "2024-02-01"))
            .and(header("api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(content)))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn returns_first_choice_text() {
        let server = MockServer::start().await;
        mount_chat_completions(&server, "  Looks fine.  ").await;

        let client = LlmClient::new(settings_for(&server));
        let text = client.complete("gpt-test", &turns()).await.unwrap();
        assert_eq!(text.trim(), "Looks fine.");

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[0]["content"], "You are a helpful coding assistant.");
        let contents: Vec<&str> = messages
            .iter()
            .filter_map(|m| m["content"].as_str())
            .collect();
        assert!(contents.contains(&"User provided code:\nint x = 1;"));
        assert!(contents.contains(&"Find the bugs."));
    }

    #[tokio::test]
    async fn endpoint_with_trailing_slash_hits_the_same_path() {
        let server = MockServer::start().await;
        mount_chat_completions(&server, "ok").await;

        let client = LlmClient::new(with_endpoint(format!("{}/", server.uri())));
        let text = client.complete("gpt-test", &turns()).await.unwrap();
        assert_eq!(text, "ok");
    }

    #[tokio::test]
    async fn endpoint_without_scheme_is_an_error() {
        let client = LlmClient::new(with_endpoint("myres.openai.azure.com".to_string()));
        let err = client.complete("gpt-test", &turns()).await.unwrap_err();
        assert!(err.starts_with("invalid endpoint"), "unexpected error: {err}");
    }

    #[test]
    fn parse_endpoint_accepts_only_http_urls() {
        assert!(parse_endpoint("https://myres.openai.azure.com").is_ok());
        assert!(parse_endpoint("http://127.0.0.1:8080").is_ok());
        assert!(parse_endpoint("myres.openai.azure.com").is_err());
        assert!(parse_endpoint("ftp://myres.openai.azure.com").is_err());
        assert!(parse_endpoint("").is_err());
    }

    #[tokio::test]
    async fn server_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = LlmClient::new(settings_for(&server));
        let err = client.complete("gpt-test", &turns()).await.unwrap_err();
        assert!(err.starts_with("chat: "), "unexpected error: {err}");
    }
}
