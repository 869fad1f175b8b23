//! エディタの書式コマンド用ヘルパー（選択範囲の装飾とスニペット）。

pub const BOLD: &str = "**";
pub const ITALIC: &str = "*";
pub const CODE: &str = "`";

pub const SNIPPET_LINK: &str = "[${1:text}](${2:url})";
pub const SNIPPET_IMAGE: &str = "![${1:alt text}](${2:url})";
pub const SNIPPET_TABLE: &str = "| ${1:Header 1} | ${2:Header 2} | ${3:Header 3} |\n| --- | --- | --- |\n| ${4:Cell 1} | ${5:Cell 2} | ${6:Cell 3} |";
pub const SNIPPET_CODE_BLOCK: &str = "```${1:language}\n${2:code}\n```";

/// 選択テキストを `wrapper` で囲む。既に囲まれていれば外す。
pub fn toggle_wrap(text: &str, wrapper: &str) -> String {
    let unwrapped = text
        .strip_prefix(wrapper)
        .and_then(|rest| rest.strip_suffix(wrapper));
    match unwrapped {
        Some(inner) => inner.to_string(),
        None => format!("{wrapper}{text}{wrapper}"),
    }
}

/// 日付入りの frontmatter スニペット
pub fn frontmatter_snippet(today: chrono::NaiveDate) -> String {
    format!(
        "---\ntitle: ${{1:Title}}\nauthor: ${{2:Author}}\ndate: ${{3:{}}}\ntags: [${{4:tag1, tag2}}]\n---\n",
        today.format("%Y-%m-%d")
    )
}

/// 今日の日付 (UTC) で frontmatter スニペットを作る
pub fn frontmatter_snippet_today() -> String {
    frontmatter_snippet(chrono::Utc::now().date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_and_unwrap() {
        assert_eq!(toggle_wrap("word", BOLD), "**word**");
        assert_eq!(toggle_wrap("**word**", BOLD), "word");
        assert_eq!(toggle_wrap("code", CODE), "`code`");
        assert_eq!(toggle_wrap("`code`", CODE), "code");
    }

    #[test]
    fn test_lone_wrapper_is_wrapped() {
        // "*" 単体は前後が重なるので囲む側に倒す
        assert_eq!(toggle_wrap("*", ITALIC), "***");
        assert_eq!(toggle_wrap("**", ITALIC), "");
    }

    #[test]
    fn test_frontmatter_snippet() {
        let date = chrono::NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let snippet = frontmatter_snippet(date);
        assert!(snippet.starts_with("---\ntitle: ${1:Title}"));
        assert!(snippet.contains("date: ${3:2025-01-15}"));
        assert!(snippet.ends_with("---\n"));
    }
}
