use std::future::Future;

use tokio_util::sync::CancellationToken;

/// 進捗表示（キャンセルボタン付き）の窓口。
///
/// `begin` で渡されたトークンを UI がキャンセルすると、スコープ内の処理が中断される。
pub trait ProgressReporter: Send + Sync {
    fn begin(&self, title: &str, cancel: CancellationToken);

    fn end(&self, title: &str);
}

/// 何も表示しない実装
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn begin(&self, _title: &str, _cancel: CancellationToken) {}

    fn end(&self, _title: &str) {}
}

struct ScopeGuard<'a> {
    reporter: &'a dyn ProgressReporter,
    title: &'a str,
    _cancel_on_exit: tokio_util::sync::DropGuard,
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.reporter.end(self.title);
    }
}

/// キャンセル可能な進捗スコープで `work` を実行する。
///
/// スコープのトークンは `parent` の子。成功・キャンセル・drop のいずれで抜けても
/// トークンはキャンセルされ、`work` の future も破棄されるので処理は残らない。
pub async fn with_progress<T, F, Fut>(
    reporter: &dyn ProgressReporter,
    title: &str,
    parent: &CancellationToken,
    work: F,
) -> Option<T>
where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let token = parent.child_token();
    reporter.begin(title, token.clone());
    let _guard = ScopeGuard {
        reporter,
        title,
        _cancel_on_exit: token.clone().drop_guard(),
    };

    tokio::select! {
        biased;
        _ = token.cancelled() => {
            log::debug!("progress scope canceled: {title}");
            None
        }
        result = work(token.clone()) => result,
    }
}
