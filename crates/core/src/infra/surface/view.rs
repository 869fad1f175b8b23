use crate::domain::preview::{PreviewMessage, Theme};

/// Markdown → 表示ツリー変換（外部のレンダリングライブラリが担う純関数）
pub trait MarkdownRenderer {
    type Tree;

    fn render(&self, markdown: &str) -> Self::Tree;
}

/// 表面側の表示状態。最後に受け取った update / theme だけで決まる。
///
/// 受信回数やタイミングには依存しない（0 回でも複数回でもよい）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceView {
    content: Option<String>,
    theme: Theme,
    font_size: u32,
}

impl Default for SurfaceView {
    fn default() -> Self {
        Self {
            content: None,
            theme: Theme::Dark,
            font_size: 16,
        }
    }
}

impl SurfaceView {
    pub fn apply(&mut self, message: &PreviewMessage) {
        match message {
            PreviewMessage::Update {
                content,
                theme,
                font_size,
            } => {
                self.content = Some(content.clone());
                self.theme = *theme;
                self.font_size = *font_size;
            }
            PreviewMessage::Theme { theme } => self.theme = *theme,
        }
    }

    /// 初回 update 前は `None`（描画前）
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn font_size(&self) -> u32 {
        self.font_size
    }

    pub fn render<R: MarkdownRenderer>(&self, renderer: &R) -> Option<R::Tree> {
        self.content.as_deref().map(|c| renderer.render(c))
    }
}
