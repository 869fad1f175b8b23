use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::domain::error::AppError;
use crate::domain::rewrite::{RewriteAction, RewriteRequest};
use crate::domain::settings::LLM_SECTION;
use crate::infra::llm::prompts::build_prompt;
use crate::infra::llm::{resolve_provider, CompletionProvider, ProviderKind, ResolveContext};
use crate::infra::metrics::{Metrics, RewriteOutcome};
use crate::infra::notifier::Notifier;
use crate::infra::settings_store::SettingsSource;
use crate::usecase::progress::{with_progress, ProgressReporter};

pub const NO_PROVIDER_MESSAGE: &str =
    "No LLM available. Install GitHub Copilot or configure an API key in settings.";
pub const OPEN_SETTINGS_ACTION: &str = "Open Settings";

/// リライトのオーケストレーション。
///
/// 呼び出しごとに設定スナップショットを取り直してプロバイダを解決する。
/// 直近に解決したインスタンスだけを保持し、LLM 設定の変更で破棄する。
pub struct RewriteService {
    settings: Arc<dyn SettingsSource>,
    resolve_ctx: ResolveContext,
    notifier: Arc<dyn Notifier>,
    progress: Arc<dyn ProgressReporter>,
    metrics: Arc<Metrics>,
    current: Mutex<Option<Arc<dyn CompletionProvider>>>,
    /// 直近の呼び出しが結果なしで終わった理由（成功・キャンセルでは空）
    last_error: Mutex<Option<AppError>>,
}

impl RewriteService {
    pub fn new(
        settings: Arc<dyn SettingsSource>,
        resolve_ctx: ResolveContext,
        progress: Arc<dyn ProgressReporter>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            notifier: resolve_ctx.notifier.clone(),
            settings,
            resolve_ctx,
            progress,
            metrics,
            current: Mutex::new(None),
            last_error: Mutex::new(None),
        }
    }

    /// 保持中のプロバイダを破棄する（LLM 設定変更時）
    pub fn reset_provider(&self) {
        if self.current.lock().take().is_some() {
            log::info!("LLM provider reset");
        }
    }

    pub fn current_provider_kind(&self) -> Option<ProviderKind> {
        self.current.lock().as_ref().map(|p| p.kind())
    }

    pub fn last_error(&self) -> Option<AppError> {
        self.last_error.lock().clone()
    }

    fn fail(&self, error: AppError) {
        *self.last_error.lock() = Some(error);
    }

    /// `text` を `action` でリライトする。
    ///
    /// 戻り値は置き換え後のテキスト（前後の空白を除去済み）。プロバイダなし・
    /// キャンセル・失敗はすべて `None`。失敗の通知はプロバイダ側で済んでいる。
    pub async fn rewrite(
        &self,
        text: &str,
        action: RewriteAction,
        custom_instruction: Option<&str>,
        cancel: &CancellationToken,
    ) -> Option<String> {
        *self.last_error.lock() = None;
        let request = match RewriteRequest::new(action, text, custom_instruction) {
            Ok(request) => request,
            Err(e) => {
                log::debug!("rewrite abandoned: {e}");
                self.fail(e);
                return None;
            }
        };

        let settings = self.settings.snapshot();
        let provider = resolve_provider(&settings.llm, &self.resolve_ctx).await;
        *self.current.lock() = provider.clone();

        let Some(provider) = provider else {
            self.metrics.inc_no_provider();
            log::warn!("rewrite skipped: no LLM provider available");
            self.fail(AppError::no_provider(NO_PROVIDER_MESSAGE));
            self.offer_settings().await;
            return None;
        };

        let request_id = uuid::Uuid::new_v4();
        let prompt = build_prompt(&request);
        let title = format!("Rewriting: {action}...");
        let kind = provider.kind();
        log::info!(
            "[rewrite {request_id}] start action={action} provider={kind:?} chars={}",
            request.source_text().chars().count()
        );
        self.metrics.inc_rewrite_started();
        let started = Instant::now();

        let result = with_progress(self.progress.as_ref(), &title, cancel, move |token| async move {
            Some(provider.complete(&prompt, &token).await)
        })
        .await;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match result {
            Some(Some(text)) => {
                self.metrics
                    .record_rewrite(action.as_str(), RewriteOutcome::Completed, elapsed_ms);
                log::info!("[rewrite {request_id}] completed in {elapsed_ms}ms");
                Some(text.trim().to_string())
            }
            Some(None) => {
                self.metrics
                    .record_rewrite(action.as_str(), RewriteOutcome::Failed, elapsed_ms);
                log::warn!("[rewrite {request_id}] provider returned no result");
                self.fail(AppError::provider(format!(
                    "{kind:?} returned no result for {action}"
                )));
                None
            }
            None => {
                self.metrics
                    .record_rewrite(action.as_str(), RewriteOutcome::Canceled, elapsed_ms);
                log::info!("[rewrite {request_id}] canceled");
                None
            }
        }
    }

    async fn offer_settings(&self) {
        let choice = self
            .notifier
            .warn_with_actions(NO_PROVIDER_MESSAGE, &[OPEN_SETTINGS_ACTION])
            .await;
        if choice.as_deref() == Some(OPEN_SETTINGS_ACTION) {
            self.notifier.open_settings(LLM_SECTION);
        }
    }
}
