//! 表面のブートストラップ HTML と CSP。

use rand::distributions::Alphanumeric;
use rand::Rng;

pub const BUNDLE_DIR: &str = "dist";
pub const KATEX_DIR: &str = "node_modules/katex/dist";

const SCRIPT_PATH: &str = "dist/webview.js";
const STYLE_PATH: &str = "dist/webview.css";
const KATEX_STYLE_PATH: &str = "node_modules/katex/dist/katex.min.css";

const NONCE_LEN: usize = 32;

/// セッションごとのスクリプト用 nonce
pub fn generate_nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LEN)
        .map(char::from)
        .collect()
}

/// ローカルリソースを表面から参照可能な URI に変換する（ホストランタイムが提供）
pub trait ResourceResolver: Send + Sync {
    /// CSP に書くリソース発行元
    fn csp_source(&self) -> String;

    fn as_surface_uri(&self, relative_path: &str) -> String;
}

/// `Content-Security-Policy` の値。スクリプトは nonce 付きのみ許可する
pub fn content_security_policy(csp_source: &str, nonce: &str) -> String {
    format!(
        "default-src 'none'; img-src {csp_source} https: data:; script-src 'nonce-{nonce}'; style-src {csp_source} 'unsafe-inline'; font-src {csp_source} https: data:;"
    )
}

pub fn build_html(resources: &dyn ResourceResolver, nonce: &str) -> String {
    let csp = content_security_policy(&resources.csp_source(), nonce);
    let script_uri = resources.as_surface_uri(SCRIPT_PATH);
    let style_uri = resources.as_surface_uri(STYLE_PATH);
    let katex_uri = resources.as_surface_uri(KATEX_STYLE_PATH);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta http-equiv="Content-Security-Policy" content="{csp}">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <link href="{katex_uri}" rel="stylesheet">
  <link href="{style_uri}" rel="stylesheet">
  <title>Markdown Preview</title>
</head>
<body>
  <div id="root"></div>
  <script nonce="{nonce}" src="{script_uri}"></script>
</body>
</html>"#
    )
}

/// `<scheme>://<root>/<path>` 形式で URI を作る単純な実装
pub struct BaseUriResolver {
    pub scheme: String,
    pub root: String,
}

impl ResourceResolver for BaseUriResolver {
    fn csp_source(&self) -> String {
        format!("{}:", self.scheme)
    }

    fn as_surface_uri(&self, relative_path: &str) -> String {
        format!(
            "{}://{}/{}",
            self.scheme,
            self.root.trim_end_matches('/'),
            relative_path.trim_start_matches('/')
        )
    }
}
