use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::transport::{HttpRequest, HttpTransport};
use super::{CompletionProvider, ProviderError, ProviderKind, Vendor};
use crate::infra::notifier::Notifier;

pub const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const MAX_TOKENS: u32 = 4096;

/// ベンダー API を直接呼ぶプロバイダ
pub struct DirectApiProvider {
    vendor: Vendor,
    api_key: String,
    model: String,
    transport: Arc<dyn HttpTransport>,
    notifier: Arc<dyn Notifier>,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

/// 応答 JSON 内の本文テキストの位置（先頭の候補のみ）
fn text_pointer(vendor: Vendor) -> &'static str {
    match vendor {
        Vendor::Anthropic => "/content/0/text",
        Vendor::OpenAi => "/choices/0/message/content",
    }
}

impl DirectApiProvider {
    /// API キーが空なら生成できない
    pub fn new(
        vendor: Vendor,
        api_key: impl Into<String>,
        model: Option<&str>,
        transport: Arc<dyn HttpTransport>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ProviderError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ProviderError::MissingCredential(vendor));
        }
        let model = model
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(vendor.default_model())
            .to_string();

        Ok(Self {
            vendor,
            api_key,
            model,
            transport,
            notifier,
        })
    }

    pub fn vendor(&self) -> Vendor {
        self.vendor
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, prompt: &str) -> Result<HttpRequest, ProviderError> {
        let payload = CompletionRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };
        let body = serde_json::to_value(&payload)
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        let (url, headers) = match self.vendor {
            Vendor::Anthropic => (
                ANTHROPIC_URL,
                vec![
                    ("x-api-key".to_string(), self.api_key.clone()),
                    ("anthropic-version".to_string(), ANTHROPIC_VERSION.to_string()),
                    ("content-type".to_string(), "application/json".to_string()),
                ],
            ),
            Vendor::OpenAi => (
                OPENAI_URL,
                vec![
                    ("authorization".to_string(), format!("Bearer {}", self.api_key)),
                    ("content-type".to_string(), "application/json".to_string()),
                ],
            ),
        };

        Ok(HttpRequest {
            url: url.to_string(),
            headers,
            body,
        })
    }

    async fn call(&self, prompt: &str) -> Result<String, ProviderError> {
        let request = self.build_request(prompt)?;
        let response = self.transport.post_json(request).await?;

        if !response.is_success() {
            return Err(ProviderError::Status {
                vendor: self.vendor,
                status: response.status,
                body: response.body,
            });
        }

        extract_text(self.vendor, &response.body)
    }
}

/// 最初の候補のテキストを取り出す。JSON として読めれば、形が想定外でも空文字
fn extract_text(vendor: Vendor, body: &str) -> Result<String, ProviderError> {
    let parsed: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;
    let text = parsed
        .pointer(text_pointer(vendor))
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default();
    Ok(text.to_string())
}

#[async_trait]
impl CompletionProvider for DirectApiProvider {
    async fn complete(&self, prompt: &str, cancel: &CancellationToken) -> Option<String> {
        // キャンセルで送信中の future ごと drop し、リクエストを中断する
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                log::info!("{} API call canceled", self.vendor);
                return None;
            }
            result = self.call(prompt) => result,
        };

        match result {
            Ok(text) => Some(text),
            Err(e) => {
                log::error!("{} API call failed: {e}", self.vendor);
                self.notifier.error(&format!("API Error: {e}"));
                None
            }
        }
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Direct(self.vendor)
    }
}
