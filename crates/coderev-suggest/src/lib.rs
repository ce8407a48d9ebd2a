pub mod engine;
pub mod prompt;

use coderev_core::{AzureSettings, ChatTurn, CriteriaRegistry};

pub use engine::{CompletionClient, LlmClient};

/// Every way a review request can fail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReviewError {
    #[error("missing configuration: {}", .0.join(", "))]
    ConfigMissing(Vec<&'static str>),
    #[error("unknown criterion: {0:?}")]
    UnknownCriterion(String),
    #[error("completion failed: {0}")]
    CompletionFailure(String),
    #[error("malformed form submission: {0}")]
    MalformedForm(String),
}

impl ReviewError {
    /// Whether the request got as far as calling the completion API.
    pub fn reached_upstream(&self) -> bool {
        matches!(self, ReviewError::CompletionFailure(_))
    }
}

/// Run one completion and return the trimmed text of the first choice.
/// Failures are logged here and surfaced as [`ReviewError::CompletionFailure`].
pub async fn complete_chat(
    client: &dyn CompletionClient,
    model: &str,
    messages: &[ChatTurn],
) -> Result<String, ReviewError> {
    tracing::debug!(model, turns = messages.len(), "sending chat completion");

    match client.complete(model, messages).await {
        Ok(raw) => {
            let text = raw.trim();
            if text.is_empty() {
                tracing::error!(model, "completion returned empty text");
                return Err(ReviewError::CompletionFailure(
                    "LLM returned empty text".to_string(),
                ));
            }
            tracing::debug!(model, chars = text.len(), "received completion");
            Ok(text.to_string())
        }
        Err(e) => {
            tracing::error!(model, error = %e, "error while calling chat completion API");
            Err(ReviewError::CompletionFailure(e))
        }
    }
}

/// Sanitize `code`, prime the model with `criterion`'s instruction and ask for a review.
pub async fn review(
    client: &dyn CompletionClient,
    settings: &AzureSettings,
    registry: &CriteriaRegistry,
    code: &str,
    criterion: &str,
) -> Result<String, ReviewError> {
    let missing = settings.missing_vars();
    if !missing.is_empty() {
        return Err(ReviewError::ConfigMissing(missing));
    }

    let code = coderev_core::strip_comments(code);
    let instruction = registry
        .instruction(criterion)
        .ok_or_else(|| ReviewError::UnknownCriterion(criterion.to_string()))?;

    let messages = prompt::build_messages(&code, instruction);
    complete_chat(client, &settings.deployment, &messages).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    /// Records every call and replies with a canned result.
    struct FakeClient {
        reply: Result<String, String>,
        calls: Mutex<Vec<(String, Vec<ChatTurn>)>>,
    }

    impl FakeClient {
        fn replying(reply: Result<&str, &str>) -> Self {
            Self {
                reply: reply.map(str::to_string).map_err(str::to_string),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(String, Vec<ChatTurn>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionClient for FakeClient {
        async fn complete(&self, model: &str, messages: &[ChatTurn]) -> Result<String, String> {
            self.calls
                .lock()
                .unwrap()
                .push((model.to_string(), messages.to_vec()));
            self.reply.clone()
        }
    }

    fn settings() -> AzureSettings {
        AzureSettings {
            api_key: "key".to_string(),
            endpoint: "https://example.openai.azure.com/".to_string(),
            deployment: "gpt-test".to_string(),
            ..AzureSettings::default()
        }
    }

    #[tokio::test]
    async fn optimization_request_end_to_end() {
        let client = FakeClient::replying(Ok("Use int16 instead."));
        let registry = CriteriaRegistry::builtin();

        let output = review(
            &client,
            &settings(),
            &registry,
            "int x = 1; // set x",
            "Code optimization",
        )
        .await
        .unwrap();

        assert_eq!(output, "Use int16 instead.");
        let calls = client.calls();
        assert_eq!(calls.len(), 1);
        let (model, messages) = &calls[0];
        assert_eq!(model, "gpt-test");
        assert_eq!(
            messages,
            &vec![
                ChatTurn::system("You are a helpful coding assistant."),
                ChatTurn::user("User provided code:\nint x = 1;"),
                ChatTurn::assistant(registry.instruction("Code optimization").unwrap()),
            ]
        );
    }

    #[tokio::test]
    async fn output_is_trimmed() {
        let client = FakeClient::replying(Ok("\n  done \n"));
        let out = review(
            &client,
            &settings(),
            &CriteriaRegistry::builtin(),
            "x",
            "Code analysis",
        )
        .await
        .unwrap();
        assert_eq!(out, "done");
    }

    #[tokio::test]
    async fn unknown_criterion_skips_the_call() {
        let client = FakeClient::replying(Ok("unused"));
        let err = review(
            &client,
            &settings(),
            &CriteriaRegistry::builtin(),
            "x",
            "Code golf",
        )
        .await
        .unwrap_err();
        assert_eq!(err, ReviewError::UnknownCriterion("Code golf".to_string()));
        assert!(!err.reached_upstream());
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_config_skips_the_call() {
        let client = FakeClient::replying(Ok("unused"));
        let err = review(
            &client,
            &AzureSettings::default(),
            &CriteriaRegistry::builtin(),
            "x",
            "Code analysis",
        )
        .await
        .unwrap_err();
        assert_eq!(
            err,
            ReviewError::ConfigMissing(vec![
                "AZURE_OPENAI_API_KEY",
                "AZURE_OPENAI_ENDPOINT",
                "DEPLOYMENT_NAME",
            ])
        );
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn client_error_becomes_completion_failure() {
        let client = FakeClient::replying(Err("chat: connection refused"));
        let err = review(
            &client,
            &settings(),
            &CriteriaRegistry::builtin(),
            "x",
            "Code debugging",
        )
        .await
        .unwrap_err();
        assert_eq!(
            err,
            ReviewError::CompletionFailure("chat: connection refused".to_string())
        );
        assert!(err.reached_upstream());
    }

    #[tokio::test]
    async fn schemeless_endpoint_is_a_completion_failure() {
        let settings = AzureSettings {
            endpoint: "myres.openai.azure.com".to_string(),
            ..settings()
        };
        let client = LlmClient::new(settings.clone());
        let err = review(
            &client,
            &settings,
            &CriteriaRegistry::builtin(),
            "x",
            "Code analysis",
        )
        .await
        .unwrap_err();
        assert!(
            matches!(err, ReviewError::CompletionFailure(ref msg) if msg.starts_with("invalid endpoint")),
            "unexpected error: {err:?}"
        );
    }

    #[tokio::test]
    async fn blank_completion_is_a_failure() {
        let client = FakeClient::replying(Ok("   "));
        let err = complete_chat(&client, "gpt-test", &[]).await.unwrap_err();
        assert!(matches!(err, ReviewError::CompletionFailure(_)));
    }
}
