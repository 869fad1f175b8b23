use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{CompletionProvider, ProviderKind};
use crate::infra::notifier::Notifier;

/// ホスト内モデル API のエラー
#[derive(Debug, Clone, thiserror::Error)]
pub enum HostModelError {
    /// この環境にモデル選択機能がない
    #[error("host model access unavailable: {0}")]
    Unavailable(String),
    /// モデル側が返したエラー（利用者に見せる）
    #[error("{message}")]
    Backend { code: String, message: String },
    #[error("request canceled")]
    Canceled,
}

/// チャットメッセージの役割
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// ストリーミング応答のチャンク列
pub type TextStream = mpsc::Receiver<Result<String, HostModelError>>;

/// ホストが提供するチャットモデル 1 つ
#[async_trait]
pub trait HostLanguageModel: Send + Sync {
    fn name(&self) -> &str;

    async fn send_request(
        &self,
        messages: Vec<ChatMessage>,
        cancel: CancellationToken,
    ) -> Result<TextStream, HostModelError>;
}

/// ホストのモデル選択機能
#[async_trait]
pub trait ModelCatalog: Send + Sync {
    async fn select_chat_models(&self) -> Result<Vec<Arc<dyn HostLanguageModel>>, HostModelError>;
}

/// ホスト内モデルを使うプロバイダ
pub struct HostModelProvider {
    model: Arc<dyn HostLanguageModel>,
    notifier: Arc<dyn Notifier>,
}

impl HostModelProvider {
    pub fn new(model: Arc<dyn HostLanguageModel>, notifier: Arc<dyn Notifier>) -> Self {
        Self { model, notifier }
    }

    async fn collect(&self, prompt: &str, cancel: &CancellationToken) -> Result<String, HostModelError> {
        let messages = vec![ChatMessage::user(prompt)];
        let mut stream = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(HostModelError::Canceled),
            stream = self.model.send_request(messages, cancel.clone()) => stream?,
        };

        let mut text = String::new();
        loop {
            let chunk = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(HostModelError::Canceled),
                chunk = stream.recv() => chunk,
            };
            match chunk {
                Some(Ok(part)) => text.push_str(&part),
                Some(Err(e)) => return Err(e),
                None => break,
            }
        }
        Ok(text.trim().to_string())
    }
}

#[async_trait]
impl CompletionProvider for HostModelProvider {
    async fn complete(&self, prompt: &str, cancel: &CancellationToken) -> Option<String> {
        match self.collect(prompt, cancel).await {
            Ok(text) => Some(text),
            Err(HostModelError::Backend { code, message }) => {
                log::error!("host model {} failed [{code}]: {message}", self.model.name());
                self.notifier.error(&format!("LLM Error: {message}"));
                None
            }
            Err(e) => {
                log::info!("host model {} returned no result: {e}", self.model.name());
                None
            }
        }
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::HostModel(self.model.name().to_string())
    }
}
