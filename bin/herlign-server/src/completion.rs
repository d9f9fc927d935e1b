//! Text-completion client used by the guest chat bot.
//!
//! [`CompletionClient`] is the seam the chat handler talks to; the real
//! implementation is [`HttpCompletionClient`], tests plug in a fake.

use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use herlign_core::SenderType;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::{CompletionConfig, CompletionProvider};

pub const SYSTEM_PROMPT: &str = "You are a helpful career coach for Herlign, a women's career community platform. Your role is to:

- Provide supportive and empowering career advice for women
- Answer questions about career development, job searching, and professional growth
- Share insights about workshops, events, and resources available on Herlign
- Maintain a warm, professional, and encouraging tone
- If you don't know something specific about Herlign, be honest and suggest contacting support
- Keep responses concise and actionable

Always prioritize being helpful, respectful, and empowering to women in their career journeys.";

const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 500;

const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const OPENAI_MODEL: &str = "gpt-4o-mini";
const DEEPSEEK_URL: &str = "https://api.deepseek.com/chat/completions";
const DEEPSEEK_MODEL: &str = "deepseek-chat";
const GEMINI_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:generateContent";

/// One turn of conversation history in completion-API terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionMessage {
    pub role: &'static str,
    pub content: String,
}

impl CompletionMessage {
    pub fn from_sender(sender: SenderType, content: impl Into<String>) -> Self {
        Self {
            role: sender.completion_role(),
            content: content.into(),
        }
    }
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Produce the next assistant turn for `history`. One attempt, no retry.
    async fn complete(&self, history: &[CompletionMessage]) -> anyhow::Result<String>;
}

pub struct HttpCompletionClient {
    http: reqwest::Client,
    provider: CompletionProvider,
}

impl HttpCompletionClient {
    pub fn new(cfg: &CompletionConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("failed to build completion HTTP client")?;
        Ok(Self {
            http,
            provider: cfg.provider.clone(),
        })
    }

    pub fn provider_name(&self) -> &'static str {
        match self.provider {
            CompletionProvider::OpenAi { .. } => "openai",
            CompletionProvider::Gemini { .. } => "gemini",
            CompletionProvider::DeepSeek { .. } => "deepseek",
            CompletionProvider::Disabled => "disabled",
        }
    }

    async fn openai_compatible(
        &self,
        url: &str,
        model: &str,
        api_key: &str,
        history: &[CompletionMessage],
    ) -> anyhow::Result<String> {
        let response = self
            .http
            .post(url)
            .bearer_auth(api_key)
            .json(&openai_body(model, history))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            bail!("{} returned HTTP {status}: {text}", self.provider_name());
        }
        let data: Value = response.json().await?;
        data.pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| anyhow!("{} response had no message content", self.provider_name()))
    }

    async fn gemini(&self, api_key: &str, history: &[CompletionMessage]) -> anyhow::Result<String> {
        let response = self
            .http
            .post(GEMINI_URL)
            .header("x-goog-api-key", api_key)
            .json(&gemini_body(history))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            bail!("gemini returned HTTP {status}: {text}");
        }
        let data: Value = response.json().await?;
        data.pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| anyhow!("gemini response had no text part"))
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(&self, history: &[CompletionMessage]) -> anyhow::Result<String> {
        debug!(provider = self.provider_name(), turns = history.len(), "requesting completion");
        match &self.provider {
            CompletionProvider::OpenAi { api_key } => {
                self.openai_compatible(OPENAI_URL, OPENAI_MODEL, api_key, history).await
            }
            CompletionProvider::DeepSeek { api_key } => {
                self.openai_compatible(DEEPSEEK_URL, DEEPSEEK_MODEL, api_key, history).await
            }
            CompletionProvider::Gemini { api_key } => self.gemini(api_key, history).await,
            CompletionProvider::Disabled => bail!("no completion provider configured"),
        }
    }
}

fn openai_body(model: &str, history: &[CompletionMessage]) -> Value {
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(json!({ "role": "system", "content": SYSTEM_PROMPT }));
    messages.extend(history.iter().map(|m| json!(m)));
    json!({
        "model": model,
        "messages": messages,
        "temperature": TEMPERATURE,
        "max_tokens": MAX_TOKENS,
    })
}

/// Gemini gets the whole conversation flattened into one prompt.
fn gemini_body(history: &[CompletionMessage]) -> Value {
    let mut prompt = String::from(SYSTEM_PROMPT);
    prompt.push_str("\n\n");
    for m in history {
        let speaker = if m.role == "user" { "User" } else { "Assistant" };
        prompt.push_str(speaker);
        prompt.push_str(": ");
        prompt.push_str(&m.content);
        prompt.push('\n');
    }
    prompt.push_str("\nAssistant:");
    json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
        "generationConfig": {
            "temperature": TEMPERATURE,
            "maxOutputTokens": MAX_TOKENS,
        },
    })
}

#[cfg(test)]
pub mod fake {
    //! Scripted completion client for handler tests.

    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    pub struct FakeCompletion {
        reply: Option<String>,
        calls: AtomicUsize,
    }

    impl FakeCompletion {
        pub fn replying(text: &str) -> Self {
            Self { reply: Some(text.to_owned()), calls: AtomicUsize::new(0) }
        }

        pub fn failing() -> Self {
            Self { reply: None, calls: AtomicUsize::new(0) }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionClient for FakeCompletion {
        async fn complete(&self, _history: &[CompletionMessage]) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone().ok_or_else(|| anyhow!("completion service unavailable"))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn history() -> Vec<CompletionMessage> {
        vec![
            CompletionMessage::from_sender(SenderType::Guest, "How do I negotiate salary?"),
            CompletionMessage::from_sender(SenderType::Bot, "Start with market research."),
            CompletionMessage::from_sender(SenderType::Admin, "Happy to help further."),
        ]
    }

    #[test]
    fn roles_follow_sender_type() {
        let roles: Vec<_> = history().iter().map(|m| m.role).collect();
        assert_eq!(roles, ["user", "assistant", "assistant"]);
    }

    #[test]
    fn openai_body_prepends_system_prompt() {
        let body = openai_body(OPENAI_MODEL, &history());
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["max_tokens"], 500);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "How do I negotiate salary?");
        assert_eq!(body["messages"].as_array().map(Vec::len), Some(4));
    }

    #[test]
    fn gemini_prompt_is_flattened() {
        let body = gemini_body(&history());
        let text = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("You are a helpful career coach"));
        assert!(text.contains("User: How do I negotiate salary?\n"));
        assert!(text.ends_with("Assistant:"));
    }

    #[tokio::test]
    async fn disabled_provider_errors() {
        let client = HttpCompletionClient::new(&CompletionConfig {
            provider: CompletionProvider::Disabled,
            timeout_secs: 1,
        })
        .unwrap();
        assert!(client.complete(&history()).await.is_err());
    }
}
