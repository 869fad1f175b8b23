use serde::{Deserialize, Serialize};

/// Markdown ドキュメントの言語 ID
pub const MARKDOWN_LANGUAGE_ID: &str = "markdown";

/// プレビュー表面に渡すテーマ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    Light,
}

/// ホスト側のカラーテーマ種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostThemeKind {
    Light,
    Dark,
    HighContrast,
    HighContrastLight,
}

impl From<HostThemeKind> for Theme {
    fn from(kind: HostThemeKind) -> Self {
        match kind {
            HostThemeKind::Light | HostThemeKind::HighContrastLight => Theme::Light,
            HostThemeKind::Dark | HostThemeKind::HighContrast => Theme::Dark,
        }
    }
}

/// ホスト → 表面へ送るメッセージ（JSON タグ付きユニオン）。
///
/// `content` は常にドキュメント全文。表面は更新間で状態を持たない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PreviewMessage {
    Update {
        content: String,
        theme: Theme,
        #[serde(rename = "fontSize")]
        font_size: u32,
    },
    Theme {
        theme: Theme,
    },
}

impl PreviewMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Update { .. } => "update",
            Self::Theme { .. } => "theme",
        }
    }
}

/// エディタ上のドキュメントのスナップショット
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub uri: String,
    pub language_id: String,
    pub text: String,
    /// 編集ごとに増える版数
    pub version: u64,
}

impl Document {
    pub fn new(
        uri: impl Into<String>,
        language_id: impl Into<String>,
        text: impl Into<String>,
        version: u64,
    ) -> Self {
        Self {
            uri: uri.into(),
            language_id: language_id.into(),
            text: text.into(),
            version,
        }
    }

    pub fn markdown(uri: impl Into<String>, text: impl Into<String>, version: u64) -> Self {
        Self::new(uri, MARKDOWN_LANGUAGE_ID, text, version)
    }

    pub fn is_markdown(&self) -> bool {
        self.language_id == MARKDOWN_LANGUAGE_ID
    }

    /// URI 末尾のファイル名。取れなければ "Preview"
    pub fn file_name(&self) -> &str {
        match self.uri.rsplit(['/', '\\']).next() {
            Some(name) if !name.is_empty() => name,
            _ => "Preview",
        }
    }
}

/// 表面の表示位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// アクティブなエディタ列
    Active,
    /// アクティブ列の隣
    Beside,
}

/// プレビューセッションの状態。`Disposed` は終端。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Closed,
    Opening,
    Open,
    Disposed,
}

impl SessionState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Closed => "closed",
            Self::Opening => "opening",
            Self::Open => "open",
            Self::Disposed => "disposed",
        }
    }
}
