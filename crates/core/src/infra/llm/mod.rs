pub mod direct_api;
pub mod host_model;
pub mod prompts;
pub mod resolver;
pub mod transport;

pub use direct_api::DirectApiProvider;
pub use host_model::HostModelProvider;
pub use resolver::{resolve_provider, ResolveContext};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// プロバイダ生成・呼び出しのエラー
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("missing credential for {0}")]
    MissingCredential(Vendor),
    #[error("{vendor} API {status}: {body}")]
    Status {
        vendor: Vendor,
        status: u16,
        body: String,
    },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error(transparent)]
    Transport(#[from] transport::TransportError),
}

/// 直接 API を叩くベンダー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vendor {
    Anthropic,
    OpenAi,
}

impl Vendor {
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Anthropic => "claude-sonnet-4-20250514",
            Self::OpenAi => "gpt-4o",
        }
    }
}

impl std::fmt::Display for Vendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anthropic => f.write_str("Anthropic"),
            Self::OpenAi => f.write_str("OpenAI"),
        }
    }
}

/// 解決されたプロバイダの種別
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderKind {
    /// ホスト内モデル（モデル名付き）
    HostModel(String),
    /// ベンダー API 直接呼び出し
    Direct(Vendor),
}

/// 補完バックエンド 1 つ分（ProviderTier）。
///
/// 失敗はこの層で利用者に通知し、呼び出し側には `None` だけを返す。
/// キャンセル時は通知せずに `None` を返す。
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &str, cancel: &CancellationToken) -> Option<String>;

    fn kind(&self) -> ProviderKind;
}
