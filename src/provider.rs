use crate::config::ProviderConfig;
use crate::models::SamplingPair;
use anyhow::{Context, Result};
use async_openai::{Client, config::OpenAIConfig, types::CreateChatCompletionRequestArgs};
use std::future::Future;

/// Remote text-generation dependency. One call per sampling pair; the
/// dispatcher treats every error as isolated to that pair.
pub trait GenerationProvider: Send + Sync + 'static {
    /// Generate text for a prompt under the given sampling controls
    fn generate(
        &self,
        prompt: &str,
        model: &str,
        pair: SamplingPair,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// OpenAI-compatible chat-completion provider
#[derive(Debug)]
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
    max_tokens: u32,
}

impl OpenAiProvider {
    /// Build a provider from configuration, reading the API key from the
    /// configured environment variable
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let api_key = std::env::var(&config.env_var_api_key)
            .with_context(|| format!("Environment variable {} not found", config.env_var_api_key))?;

        let openai_config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(&config.api_endpoint);

        Ok(Self {
            client: Client::with_config(openai_config),
            max_tokens: config.max_tokens,
        })
    }

    /// Build the chat completion request carrying the sampling pair
    fn build_request(
        &self,
        prompt: &str,
        model: &str,
        pair: SamplingPair,
    ) -> Result<async_openai::types::CreateChatCompletionRequest> {
        let user_message = async_openai::types::ChatCompletionRequestUserMessageArgs::default()
            .content(prompt.to_string())
            .build()
            .context("Failed to build user message")?
            .into();

        CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages([user_message])
            .temperature(pair.temperature as f32)
            .top_p(pair.top_p as f32)
            .max_tokens(self.max_tokens as u16)
            .build()
            .context("Failed to build chat completion request")
    }

    /// Extract the generated text from the API response
    fn extract_text(
        response: async_openai::types::CreateChatCompletionResponse,
    ) -> Result<String> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .context("Provider returned no completion choices")?;
        choice
            .message
            .content
            .context("Provider returned a completion without content")
    }
}

impl GenerationProvider for OpenAiProvider {
    async fn generate(&self, prompt: &str, model: &str, pair: SamplingPair) -> Result<String> {
        let request = self.build_request(prompt, model, pair)?;
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .context("Failed to generate response")?;
        Self::extract_text(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;

    fn test_config(endpoint: &str, env_var: &str) -> ProviderConfig {
        ProviderConfig {
            api_endpoint: endpoint.to_string(),
            env_var_api_key: env_var.to_string(),
            max_tokens: 64,
            max_in_flight: 2,
            request_timeout_secs: 5,
        }
    }

    #[test]
    fn test_from_config_missing_env_var() {
        let config = test_config("https://api.openai.com/v1", "SWEEP_EVAL_MISSING_KEY");
        unsafe {
            std::env::remove_var(&config.env_var_api_key);
        }
        let result = OpenAiProvider::from_config(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_generate_parses_completion_text() {
        let mut server = mockito::Server::new_async().await;
        let body = r#"{
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "created": 0,
            "model": "gpt-4",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Hello there"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 3, "completion_tokens": 2, "total_tokens": 5}
        }"#;
        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await;

        unsafe {
            std::env::set_var("SWEEP_EVAL_TEST_KEY", "test-key");
        }
        let config = test_config(&server.url(), "SWEEP_EVAL_TEST_KEY");
        let provider = OpenAiProvider::from_config(&config).unwrap();

        let pair = SamplingPair::new(0.7, 0.9).unwrap();
        let text = provider.generate("Say hello", "gpt-4", pair).await.unwrap();
        assert_eq!(text, "Hello there");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_surfaces_server_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(500)
            .with_body("internal error")
            .create_async()
            .await;

        unsafe {
            std::env::set_var("SWEEP_EVAL_ERR_KEY", "test-key");
        }
        let config = test_config(&server.url(), "SWEEP_EVAL_ERR_KEY");
        let provider = OpenAiProvider::from_config(&config).unwrap();

        let pair = SamplingPair::new(0.7, 0.9).unwrap();
        let result = provider.generate("Say hello", "gpt-4", pair).await;
        assert!(result.is_err());
    }
}
