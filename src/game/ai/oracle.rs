//! Text-generation service client
//!
//! The oracle is opaque: it receives a PGN-style prompt and returns whatever
//! text the model produced. [`Oracle`] is the seam the move generator is
//! written against; [`OpenAiOracle`] talks to an OpenAI-compatible
//! `/completions` endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::resource::SamplingConfig;
use crate::core::{BotError, BotResult};

/// Completion source for move candidates
#[async_trait]
pub trait Oracle: Send + Sync {
    /// One completion for `prompt`
    async fn complete(&self, prompt: &str, sampling: &SamplingConfig) -> BotResult<String>;
}

/// Connection settings for [`OpenAiOracle`]
#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    /// Deadline for a single completion request
    pub timeout: Duration,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    text: String,
}

/// OpenAI completions client
pub struct OpenAiOracle {
    http: reqwest::Client,
    config: OracleConfig,
}

impl OpenAiOracle {
    pub fn new(config: OracleConfig) -> BotResult<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/completions", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl Oracle for OpenAiOracle {
    async fn complete(&self, prompt: &str, sampling: &SamplingConfig) -> BotResult<String> {
        let request = CompletionRequest {
            model: &self.config.model,
            prompt,
            temperature: sampling.temperature,
            max_tokens: sampling.max_tokens,
        };

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    BotError::OracleTimeout {
                        seconds: self.config.timeout.as_secs_f32(),
                    }
                } else {
                    BotError::Http(err)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BotError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: CompletionResponse = response.json().await?;
        let text = body
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.text.trim().to_string())
            .ok_or_else(|| BotError::Oracle {
                message: "completion response had no choices".to_string(),
            })?;

        debug!("[AI] Oracle returned {:?}", text);
        Ok(text)
    }
}
