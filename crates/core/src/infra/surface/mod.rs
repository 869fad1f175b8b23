pub mod channel;
pub mod content;
pub mod view;

pub use channel::{ChannelSurface, ChannelSurfaceFactory, SurfaceEndpoint, SurfaceEvent};
pub use view::{MarkdownRenderer, SurfaceView};

use tokio::sync::oneshot;

use crate::domain::preview::{Placement, PreviewMessage};

/// メッセージチャネル / 表面操作のエラー
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("surface is closed")]
    Closed,
    #[error("message encode failed: {0}")]
    Encode(String),
    #[error("surface creation failed: {0}")]
    Create(String),
}

/// 表面生成時のオプション
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceOptions {
    pub enable_scripts: bool,
    pub retain_context_when_hidden: bool,
    /// 読み込みを許可するローカルリソースのルート（拡張ルートからの相対パス）
    pub local_resource_roots: Vec<String>,
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        Self {
            enable_scripts: true,
            retain_context_when_hidden: true,
            local_resource_roots: vec![
                content::BUNDLE_DIR.to_string(),
                content::KATEX_DIR.to_string(),
            ],
        }
    }
}

/// 表面を生成するための仕様
#[derive(Debug, Clone)]
pub struct SurfaceSpec {
    pub view_type: String,
    pub title: String,
    pub placement: Placement,
    pub options: SurfaceOptions,
    /// ブートストラップ HTML
    pub html: String,
}

/// ホストから見た表面 1 枚。通信はメッセージ送信のみ。
pub trait PresentationSurface: Send {
    /// 非同期・送りっぱなし。送信順は保持される
    fn post_message(&self, message: &PreviewMessage) -> Result<(), ChannelError>;

    fn reveal(&self, placement: Placement);

    fn set_title(&self, title: &str);

    /// 表面を破棄する。2 回目以降は何もしない
    fn dispose(&mut self);
}

/// 生成された表面と、利用者が閉じたときに発火する通知
pub struct SurfaceHandle {
    pub surface: Box<dyn PresentationSurface>,
    pub closed: oneshot::Receiver<()>,
}

pub trait SurfaceFactory: Send + Sync {
    fn create(&self, spec: SurfaceSpec) -> Result<SurfaceHandle, ChannelError>;
}
