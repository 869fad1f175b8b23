//! アクション別リライト指示テンプレート

use crate::domain::rewrite::{RewriteAction, RewriteRequest};

pub const INSTRUCTION_REWRITE: &str = "Rewrite the following markdown text while preserving its meaning and markdown formatting. Make it clearer and more engaging.";

pub const INSTRUCTION_SIMPLIFY: &str = "Simplify the following markdown text. Use shorter sentences, simpler words, and clearer structure. Preserve markdown formatting.";

pub const INSTRUCTION_EXPAND: &str = "Expand the following markdown text with more detail, examples, and explanation. Preserve markdown formatting.";

pub const INSTRUCTION_FIX_GRAMMAR: &str = "Fix any grammar, spelling, and punctuation errors in the following markdown text. Preserve the original meaning and markdown formatting.";

pub const INSTRUCTION_PROFESSIONAL: &str = "Rewrite the following markdown text in a more professional and formal tone. Preserve markdown formatting.";

/// 説明や装飾を付けずに本文だけ返させる指示
pub const RETURN_ONLY_DIRECTIVE: &str = "Return ONLY the rewritten text, no explanations or wrapping.";

pub const SEPARATOR: &str = "---";

/// 固定アクションの指示文。`Custom` は呼び出し側が指示を持つので `None`
pub fn instruction_for_action(action: RewriteAction) -> Option<&'static str> {
    match action {
        RewriteAction::Rewrite => Some(INSTRUCTION_REWRITE),
        RewriteAction::Simplify => Some(INSTRUCTION_SIMPLIFY),
        RewriteAction::Expand => Some(INSTRUCTION_EXPAND),
        RewriteAction::FixGrammar => Some(INSTRUCTION_FIX_GRAMMAR),
        RewriteAction::Professional => Some(INSTRUCTION_PROFESSIONAL),
        RewriteAction::Custom => None,
    }
}

/// 指示行 → 指示文 → 区切り → 原文 の順でプロンプトを組み立てる
pub fn build_prompt(request: &RewriteRequest) -> String {
    let instruction = request
        .custom_instruction()
        .or_else(|| instruction_for_action(request.action()))
        .unwrap_or(INSTRUCTION_REWRITE);

    let mut prompt = String::with_capacity(request.source_text().len() + 256);
    prompt.push_str(instruction);
    prompt.push_str("\n\n");
    prompt.push_str(RETURN_ONLY_DIRECTIVE);
    prompt.push_str("\n\n");
    prompt.push_str(SEPARATOR);
    prompt.push_str("\n\n");
    prompt.push_str(request.source_text());
    prompt
}
