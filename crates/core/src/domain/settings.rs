use serde::{Deserialize, Serialize};

/// 設定の名前空間
pub const NAMESPACE: &str = "markdownViewer";
/// LLM 設定セクション（設定画面を開く際のキー）
pub const LLM_SECTION: &str = "markdownViewer.llm";

pub const KEY_LLM_PROVIDER: &str = "markdownViewer.llm.provider";
pub const KEY_LLM_ANTHROPIC_API_KEY: &str = "markdownViewer.llm.anthropicApiKey";
pub const KEY_LLM_OPENAI_API_KEY: &str = "markdownViewer.llm.openaiApiKey";
pub const KEY_LLM_MODEL: &str = "markdownViewer.llm.model";
pub const KEY_PREVIEW_AUTO_OPEN: &str = "markdownViewer.preview.autoOpen";
pub const KEY_PREVIEW_FONT_SIZE: &str = "markdownViewer.preview.fontSize";

/// アプリケーション設定
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub llm: LlmSettings,
    pub preview: PreviewSettings,
}

/// LLM プロバイダ設定
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LlmSettings {
    /// プロバイダ選択（auto / host-lm / anthropic / openai）
    pub provider: ProviderPreference,
    /// Anthropic API キー（空文字 = 未設定）
    pub anthropic_api_key: String,
    /// OpenAI API キー（空文字 = 未設定）
    pub openai_api_key: String,
    /// モデル名の上書き（空文字 = プロバイダ既定）
    pub model: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderPreference {
    #[default]
    Auto,
    /// 旧設定値 `vscode-lm` も読める
    #[serde(alias = "vscode-lm")]
    HostLm,
    Anthropic,
    Openai,
}

/// プレビュー設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreviewSettings {
    /// Markdown を開いたときにプレビューを自動表示するか
    pub auto_open: bool,
    /// プレビューのフォントサイズ (px)
    pub font_size: u32,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            auto_open: true,
            font_size: 16,
        }
    }
}

impl LlmSettings {
    /// モデル名の上書きがあれば返す
    pub fn model_override(&self) -> Option<&str> {
        let model = self.model.trim();
        (!model.is_empty()).then_some(model)
    }
}

impl AppSettings {
    /// 2 つのスナップショット間で値が変わった設定キーを列挙する
    pub fn changed_keys(old: &AppSettings, new: &AppSettings) -> Vec<&'static str> {
        let mut keys = Vec::new();
        if old.llm.provider != new.llm.provider {
            keys.push(KEY_LLM_PROVIDER);
        }
        if old.llm.anthropic_api_key != new.llm.anthropic_api_key {
            keys.push(KEY_LLM_ANTHROPIC_API_KEY);
        }
        if old.llm.openai_api_key != new.llm.openai_api_key {
            keys.push(KEY_LLM_OPENAI_API_KEY);
        }
        if old.llm.model != new.llm.model {
            keys.push(KEY_LLM_MODEL);
        }
        if old.preview.auto_open != new.preview.auto_open {
            keys.push(KEY_PREVIEW_AUTO_OPEN);
        }
        if old.preview.font_size != new.preview.font_size {
            keys.push(KEY_PREVIEW_FONT_SIZE);
        }
        keys
    }
}

/// 変更キーのいずれかが LLM セクションに属するか
pub fn affects_llm<S: AsRef<str>>(keys: &[S]) -> bool {
    keys.iter().any(|k| {
        let k = k.as_ref();
        k == LLM_SECTION
            || k
                .strip_prefix(LLM_SECTION)
                .is_some_and(|rest| rest.starts_with('.'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = AppSettings::default();
        assert_eq!(s.llm.provider, ProviderPreference::Auto);
        assert!(s.preview.auto_open);
        assert_eq!(s.preview.font_size, 16);
        assert!(s.llm.model_override().is_none());
    }

    #[test]
    fn test_model_override_trims() {
        let llm = LlmSettings {
            model: "  gpt-4o-mini ".to_string(),
            ..Default::default()
        };
        assert_eq!(llm.model_override(), Some("gpt-4o-mini"));
    }

    #[test]
    fn test_changed_keys() {
        let old = AppSettings::default();
        let mut new = old.clone();
        new.llm.anthropic_api_key = "k1".to_string();
        new.preview.font_size = 18;

        let keys = AppSettings::changed_keys(&old, &new);
        assert_eq!(keys, vec![KEY_LLM_ANTHROPIC_API_KEY, KEY_PREVIEW_FONT_SIZE]);
        assert!(AppSettings::changed_keys(&old, &old).is_empty());
    }

    #[test]
    fn test_affects_llm() {
        assert!(affects_llm(&[KEY_LLM_PROVIDER]));
        assert!(affects_llm(&[KEY_PREVIEW_FONT_SIZE, KEY_LLM_OPENAI_API_KEY]));
        assert!(affects_llm(&[LLM_SECTION]));
        assert!(!affects_llm(&[KEY_PREVIEW_AUTO_OPEN]));
        assert!(!affects_llm(&["markdownViewer.llmExtra"]));
        assert!(!affects_llm::<&str>(&[]));
    }
}
