use serde::{Deserialize, Serialize};

use super::error::AppError;

/// リライト種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewriteAction {
    Rewrite,
    Simplify,
    Expand,
    FixGrammar,
    Professional,
    Custom,
}

impl RewriteAction {
    pub const ALL: [RewriteAction; 6] = [
        Self::Rewrite,
        Self::Simplify,
        Self::Expand,
        Self::FixGrammar,
        Self::Professional,
        Self::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rewrite => "rewrite",
            Self::Simplify => "simplify",
            Self::Expand => "expand",
            Self::FixGrammar => "fixgrammar",
            Self::Professional => "professional",
            Self::Custom => "custom",
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom)
    }
}

impl std::fmt::Display for RewriteAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// リライト要求。コマンド呼び出しごとに生成され、永続化されない。
///
/// `custom_instruction` は `Custom` のときだけ、かつ空でない場合のみ存在する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteRequest {
    action: RewriteAction,
    source_text: String,
    custom_instruction: Option<String>,
}

impl RewriteRequest {
    pub fn new(
        action: RewriteAction,
        source_text: impl Into<String>,
        custom_instruction: Option<&str>,
    ) -> Result<Self, AppError> {
        let source_text = source_text.into();
        if source_text.is_empty() {
            return Err(AppError::invalid_request("source text is empty"));
        }

        let custom_instruction = match (action, custom_instruction.map(str::trim)) {
            (RewriteAction::Custom, Some(i)) if !i.is_empty() => Some(i.to_string()),
            (RewriteAction::Custom, _) => {
                return Err(AppError::invalid_request(
                    "custom rewrite requires an instruction",
                ))
            }
            (_, _) => None,
        };

        Ok(Self {
            action,
            source_text,
            custom_instruction,
        })
    }

    pub fn action(&self) -> RewriteAction {
        self.action
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    pub fn custom_instruction(&self) -> Option<&str> {
        self.custom_instruction.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ErrorCode;

    #[test]
    fn test_custom_requires_instruction() {
        let err = RewriteRequest::new(RewriteAction::Custom, "text", None).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidRequest);

        let err = RewriteRequest::new(RewriteAction::Custom, "text", Some("   ")).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidRequest);

        let req = RewriteRequest::new(RewriteAction::Custom, "text", Some("Make it casual")).unwrap();
        assert_eq!(req.custom_instruction(), Some("Make it casual"));
    }

    #[test]
    fn test_instruction_dropped_for_fixed_actions() {
        let req = RewriteRequest::new(RewriteAction::Simplify, "text", Some("ignored")).unwrap();
        assert_eq!(req.action(), RewriteAction::Simplify);
        assert!(req.custom_instruction().is_none());
    }

    #[test]
    fn test_empty_source_rejected() {
        assert!(RewriteRequest::new(RewriteAction::Rewrite, "", None).is_err());
    }

    #[test]
    fn test_action_names() {
        let names: Vec<_> = RewriteAction::ALL.iter().map(|a| a.as_str()).collect();
        assert_eq!(
            names,
            vec!["rewrite", "simplify", "expand", "fixgrammar", "professional", "custom"]
        );
    }
}
