//! Query interpretation through a hosted chat-completion model

use super::{interpretation_prompt, parse_interpretation};
use crate::core::filter::Interpretation;
use crate::core::service::QueryInterpreter;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<PromptMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct PromptMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Interpreter backed by an OpenAI-compatible chat completion endpoint
#[derive(Clone)]
pub struct GenerativeInterpreter {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl GenerativeInterpreter {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = CompletionRequest {
            model: &self.model,
            messages: vec![
                PromptMessage {
                    role: "system",
                    content: "You turn marketplace searches into JSON filters.",
                },
                PromptMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.0,
        };

        tracing::debug!(
            model = %self.model,
            prompt_length = prompt.len(),
            "calling interpreter model"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send interpretation request")?
            .error_for_status()
            .context("Interpretation request rejected")?;

        let completion: CompletionResponse = response
            .json()
            .await
            .context("Failed to parse interpretation response")?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("No completion returned"))
    }
}

#[async_trait]
impl QueryInterpreter for GenerativeInterpreter {
    async fn interpret(&self, query: &str) -> Result<Option<Interpretation>> {
        let reply = self.complete(&interpretation_prompt(query)).await?;
        parse_interpretation(&reply).map(Some)
    }
}
