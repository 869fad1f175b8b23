use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::domain::editing::{self, BOLD, CODE, ITALIC};
use crate::domain::preview::Document;
use crate::domain::rewrite::RewriteAction;
use crate::infra::notifier::Notifier;
use crate::usecase::rewrite_service::RewriteService;

/// コマンド ID 定数
pub const CMD_SHOW_PREVIEW: &str = "markdownViewer.showPreview";
pub const CMD_SHOW_PREVIEW_TO_SIDE: &str = "markdownViewer.showPreviewToSide";
pub const CMD_LLM_CUSTOM: &str = "markdownViewer.llmCustom";

pub const EMPTY_SELECTION_MESSAGE: &str = "Select some text first to rewrite with AI.";
pub const CUSTOM_PROMPT: &str = "Enter your rewriting instruction";
pub const CUSTOM_PLACEHOLDER: &str = r#"e.g., "Make it more casual" or "Translate to Spanish""#;

/// ホストのテキストエディタ（複数選択あり）
pub trait TextEditor: Send + Sync {
    fn document(&self) -> Document;

    /// 選択範囲のテキスト（先頭が主選択）
    fn selections(&self) -> Vec<String>;

    /// 選択範囲を順に置き換える。`texts` は `selections()` と同じ並び
    fn replace_selections(&self, texts: Vec<String>);

    /// `${1:...}` 形式のプレースホルダ付きスニペットを挿入する
    fn insert_snippet(&self, snippet: &str);

    fn primary_selection(&self) -> Option<String> {
        self.selections().into_iter().next()
    }
}

/// 定型のリライトコマンド ID
pub fn rewrite_command_id(action: RewriteAction) -> Option<&'static str> {
    match action {
        RewriteAction::Rewrite => Some("markdownViewer.llmRewrite"),
        RewriteAction::Simplify => Some("markdownViewer.llmSimplify"),
        RewriteAction::Expand => Some("markdownViewer.llmExpand"),
        RewriteAction::FixGrammar => Some("markdownViewer.llmFixGrammar"),
        RewriteAction::Professional => Some("markdownViewer.llmProfessional"),
        RewriteAction::Custom => None,
    }
}

/// 主選択をリライトして置き換える。置き換えたら true
pub async fn rewrite_selection(
    editor: &dyn TextEditor,
    service: &RewriteService,
    notifier: &dyn Notifier,
    action: RewriteAction,
    cancel: &CancellationToken,
) -> bool {
    let Some(selected) = non_empty_selection(editor, notifier) else {
        return false;
    };

    let instruction = if action.is_custom() {
        match notifier.prompt_input(CUSTOM_PROMPT, CUSTOM_PLACEHOLDER).await {
            Some(i) if !i.trim().is_empty() => Some(i),
            _ => {
                log::debug!("custom rewrite abandoned: no instruction");
                return false;
            }
        }
    } else {
        None
    };

    let Some(result) = service
        .rewrite(&selected, action, instruction.as_deref(), cancel)
        .await
    else {
        return false;
    };
    if result.is_empty() {
        log::warn!("rewrite returned empty text; selection left unchanged");
        return false;
    }

    let mut texts = editor.selections();
    match texts.first_mut() {
        Some(primary) => *primary = result,
        None => return false,
    }
    editor.replace_selections(texts);
    true
}

fn non_empty_selection(editor: &dyn TextEditor, notifier: &dyn Notifier) -> Option<String> {
    match editor.primary_selection() {
        Some(text) if !text.is_empty() => Some(text),
        _ => {
            notifier.info(EMPTY_SELECTION_MESSAGE);
            None
        }
    }
}

/// 書式系コマンド
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EditorCommand {
    ToggleBold,
    ToggleItalic,
    ToggleCode,
    InsertLink,
    InsertImage,
    InsertTable,
    InsertCodeBlock,
    InsertFrontmatter,
}

impl EditorCommand {
    pub const ALL: [EditorCommand; 8] = [
        Self::ToggleBold,
        Self::ToggleItalic,
        Self::ToggleCode,
        Self::InsertLink,
        Self::InsertImage,
        Self::InsertTable,
        Self::InsertCodeBlock,
        Self::InsertFrontmatter,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Self::ToggleBold => "markdownViewer.toggleBold",
            Self::ToggleItalic => "markdownViewer.toggleItalic",
            Self::ToggleCode => "markdownViewer.toggleCode",
            Self::InsertLink => "markdownViewer.insertLink",
            Self::InsertImage => "markdownViewer.insertImage",
            Self::InsertTable => "markdownViewer.insertTable",
            Self::InsertCodeBlock => "markdownViewer.insertCodeBlock",
            Self::InsertFrontmatter => "markdownViewer.insertFrontmatter",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.id() == id)
    }

    pub fn run(&self, editor: &dyn TextEditor) {
        match self {
            Self::ToggleBold => wrap_selections(editor, BOLD),
            Self::ToggleItalic => wrap_selections(editor, ITALIC),
            Self::ToggleCode => wrap_selections(editor, CODE),
            Self::InsertLink => editor.insert_snippet(editing::SNIPPET_LINK),
            Self::InsertImage => editor.insert_snippet(editing::SNIPPET_IMAGE),
            Self::InsertTable => editor.insert_snippet(editing::SNIPPET_TABLE),
            Self::InsertCodeBlock => editor.insert_snippet(editing::SNIPPET_CODE_BLOCK),
            Self::InsertFrontmatter => editor.insert_snippet(&editing::frontmatter_snippet_today()),
        }
    }
}

fn wrap_selections(editor: &dyn TextEditor, wrapper: &str) {
    let texts = editor
        .selections()
        .iter()
        .map(|text| editing::toggle_wrap(text, wrapper))
        .collect();
    editor.replace_selections(texts);
}
