//! OpenRouter chat-completions client.
//!
//! Speaks the OpenAI-compatible `/chat/completions` API with multimodal
//! user turns (text part + base64 `data:` image URL).

use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shotcoach_models::HistoryMessage;
use tracing::{debug, info_span, Instrument};

use crate::client::{AdviceCall, AdviceRequest, Advisor};
use crate::config::AdvisorConfig;
use crate::error::{AdvisorError, AdvisorResult};

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

// =============================================================================
// Client
// =============================================================================

/// HTTP advisor backed by OpenRouter (or any OpenAI-compatible endpoint).
#[derive(Clone)]
pub struct OpenRouterClient {
    http: Client,
    config: AdvisorConfig,
    url: String,
}

impl OpenRouterClient {
    pub fn new(config: AdvisorConfig) -> AdvisorResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(AdvisorError::not_configured("API key cannot be empty"));
        }

        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(concat!("shotcoach-advisor/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AdvisorError::not_configured(format!("HTTP client: {}", e)))?;

        let url = config.chat_completions_url();
        Ok(Self { http, config, url })
    }

    /// Create from environment variables.
    pub fn from_env() -> AdvisorResult<Self> {
        Self::new(AdvisorConfig::from_env()?)
    }

    pub fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    fn build_messages(request: &AdviceRequest) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(request.history.len() + 2);

        if let Some(system) = &request.system {
            messages.push(ChatMessage {
                role: "system",
                content: MessageContent::Text(system.clone()),
            });
        }

        messages.extend(request.history.iter().map(history_message));

        let mut parts = vec![ContentPart::Text {
            text: request.prompt.clone(),
        }];
        if !request.image.is_empty() {
            parts.push(ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: data_url(&request.image),
                },
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: MessageContent::Parts(parts),
        });

        messages
    }

    async fn complete(&self, call: AdviceCall, request: &AdviceRequest) -> AdvisorResult<String> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: Self::build_messages(request),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let span = info_span!("advisor_call", call = %call, model = %self.config.model);
        let started = Instant::now();
        let result = self.send(&body, request.timeout).instrument(span).await;

        debug!(
            call = %call,
            elapsed_ms = started.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "Advisor call finished"
        );

        result
    }

    async fn send(&self, body: &ChatRequest<'_>, timeout: Duration) -> AdvisorResult<String> {
        let mut builder = self
            .http
            .post(&self.url)
            .bearer_auth(&self.config.api_key)
            .timeout(timeout)
            .json(body);
        if let Some(site_url) = &self.config.site_url {
            builder = builder.header("HTTP-Referer", site_url.as_str());
        }
        if let Some(site_name) = &self.config.site_name {
            builder = builder.header("X-Title", site_name.as_str());
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdvisorError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        let parsed: ChatResponse = serde_json::from_str(&text)?;
        extract_content(parsed)
    }
}

fn history_message(message: &HistoryMessage) -> ChatMessage {
    ChatMessage {
        role: message.role.as_str(),
        content: MessageContent::Text(message.content.clone()),
    }
}

fn extract_content(response: ChatResponse) -> AdvisorResult<String> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| AdvisorError::malformed("No choices in response"))?;

    if let Some(refusal) = choice.message.refusal.filter(|r| !r.trim().is_empty()) {
        return Err(AdvisorError::refused(refusal));
    }
    if choice.finish_reason.as_deref() == Some("content_filter") {
        return Err(AdvisorError::refused("content filtered"));
    }

    choice
        .message
        .content
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AdvisorError::malformed("Empty message content"))
}

/// `data:` URL for the frame, typed by its magic bytes.
fn data_url(image: &[u8]) -> String {
    let mime = if image.starts_with(&[0x89, b'P', b'N', b'G']) {
        "image/png"
    } else {
        "image/jpeg"
    };
    format!("data:{};base64,{}", mime, BASE64.encode(image))
}

#[async_trait]
impl Advisor for OpenRouterClient {
    async fn advise(&self, request: &AdviceRequest) -> AdvisorResult<String> {
        self.complete(AdviceCall::Advice, request).await
    }

    async fn advise_level_only(&self, request: &AdviceRequest) -> AdvisorResult<String> {
        self.complete(AdviceCall::LevelCheck, request).await
    }

    fn name(&self) -> &str {
        &self.config.model
    }
}
