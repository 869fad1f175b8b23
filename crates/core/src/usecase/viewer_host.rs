use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::domain::error::AppError;
use crate::domain::preview::{Document, HostThemeKind, Placement, SessionState};
use crate::domain::rewrite::RewriteAction;
use crate::domain::settings::affects_llm;
use crate::infra::llm::host_model::ModelCatalog;
use crate::infra::llm::transport::HttpTransport;
use crate::infra::llm::ResolveContext;
use crate::infra::metrics::{Metrics, MetricsSummary};
use crate::infra::notifier::Notifier;
use crate::infra::settings_store::SettingsSource;
use crate::infra::surface::content::ResourceResolver;
use crate::infra::surface::SurfaceFactory;
use crate::usecase::commands::{self, EditorCommand, TextEditor};
use crate::usecase::preview_session::PreviewSession;
use crate::usecase::progress::ProgressReporter;
use crate::usecase::rewrite_service::RewriteService;

/// ドキュメントを開いてからプレビューを出すまでの待ち（エディタタブの確定待ち）
pub const OPEN_SETTLE_DELAY: Duration = Duration::from_millis(100);

/// ホストランタイムが提供する外部依存一式
pub struct HostServices {
    pub surfaces: Arc<dyn SurfaceFactory>,
    pub resources: Arc<dyn ResourceResolver>,
    pub settings: Arc<dyn SettingsSource>,
    pub notifier: Arc<dyn Notifier>,
    pub progress: Arc<dyn ProgressReporter>,
    pub transport: Arc<dyn HttpTransport>,
    pub catalog: Option<Arc<dyn ModelCatalog>>,
    pub host_theme: watch::Receiver<HostThemeKind>,
}

/// ホストのイベントとコマンドを PreviewSession / RewriteService に配線する
pub struct ViewerHost {
    session: Arc<PreviewSession>,
    rewrites: RewriteService,
    notifier: Arc<dyn Notifier>,
    settings: Arc<dyn SettingsSource>,
    metrics: Arc<Metrics>,
    active: Arc<Mutex<Option<Document>>>,
    shutdown: CancellationToken,
}

impl ViewerHost {
    pub fn new(services: HostServices) -> Self {
        let metrics = Arc::new(Metrics::new());
        let session = PreviewSession::new(
            services.surfaces,
            services.settings.clone(),
            services.resources,
            services.host_theme,
            metrics.clone(),
        );
        let rewrites = RewriteService::new(
            services.settings.clone(),
            ResolveContext {
                catalog: services.catalog,
                transport: services.transport,
                notifier: services.notifier.clone(),
            },
            services.progress,
            metrics.clone(),
        );

        Self {
            session: Arc::new(session),
            rewrites,
            notifier: services.notifier,
            settings: services.settings,
            metrics,
            active: Arc::new(Mutex::new(None)),
            shutdown: CancellationToken::new(),
        }
    }

    /// 起動時: アクティブなエディタが Markdown ならプレビューを横に開く
    pub fn activate(&self, active: Option<Document>) {
        *self.active.lock() = active.clone();
        if let Some(document) = active {
            self.auto_open_if_markdown(&document);
        }
    }

    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    pub fn active_document(&self) -> Option<Document> {
        self.active.lock().clone()
    }

    // ==================== Preview ====================

    /// `showPreview` / `showPreviewToSide` コマンド
    pub fn show_preview(&self, placement: Placement) -> Result<(), AppError> {
        let active = self.active.lock().clone();
        self.session.show_preview(placement, active.as_ref())
    }

    pub fn on_active_editor_changed(&self, document: Option<Document>) {
        *self.active.lock() = document.clone();
        let Some(document) = document.filter(Document::is_markdown) else {
            return;
        };
        // 自動オープン時は show_preview が即時送信まで行う
        if !self.auto_open_if_markdown(&document) {
            self.session.update_immediate(&document);
        }
    }

    pub fn on_document_changed(&self, document: &Document) {
        if !document.is_markdown() {
            return;
        }
        {
            let mut active = self.active.lock();
            if let Some(current) = active.as_mut().filter(|d| d.uri == document.uri) {
                *current = document.clone();
            }
        }
        self.session.update(document);
    }

    /// 新しく開かれた Markdown は、少し待ってまだアクティブならプレビューを開く
    pub fn on_document_opened(&self, document: Document) {
        if !document.is_markdown() || !self.settings.snapshot().preview.auto_open {
            return;
        }

        let session = self.session.clone();
        let active = self.active.clone();
        let shutdown = self.shutdown.child_token();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {}
                _ = tokio::time::sleep(OPEN_SETTLE_DELAY) => {
                    let current = active.lock().clone();
                    let Some(current) = current.filter(|d| d.uri == document.uri) else {
                        return;
                    };
                    if let Err(e) = session.show_preview(Placement::Beside, Some(&current)) {
                        log::warn!("auto-open failed for {}: {e}", document.uri);
                    }
                }
            }
        });
    }

    fn auto_open_if_markdown(&self, document: &Document) -> bool {
        if !document.is_markdown() || !self.settings.snapshot().preview.auto_open {
            return false;
        }
        if let Err(e) = self.session.show_preview(Placement::Beside, Some(document)) {
            log::warn!("auto-open failed for {}: {e}", document.uri);
        }
        true
    }

    // ==================== Configuration ====================

    /// 設定変更通知。LLM セクションに触れていれば解決済みプロバイダを捨てる
    pub fn on_configuration_changed<S: AsRef<str>>(&self, changed_keys: &[S]) {
        if affects_llm(changed_keys) {
            self.rewrites.reset_provider();
        }
    }

    // ==================== Rewrite / Editor ====================

    /// リライトコマンド。dispose 後は何もしない
    pub async fn rewrite_selection(&self, editor: &dyn TextEditor, action: RewriteAction) -> bool {
        if self.shutdown.is_cancelled() {
            return false;
        }
        let cancel = self.shutdown.child_token();
        commands::rewrite_selection(
            editor,
            &self.rewrites,
            self.notifier.as_ref(),
            action,
            &cancel,
        )
        .await
    }

    /// 書式コマンドを ID で実行する。未知の ID なら false
    pub fn run_editor_command(&self, id: &str, editor: &dyn TextEditor) -> bool {
        match EditorCommand::from_id(id) {
            Some(command) => {
                command.run(editor);
                true
            }
            None => {
                log::debug!("unknown editor command: {id}");
                false
            }
        }
    }

    pub fn rewrites(&self) -> &RewriteService {
        &self.rewrites
    }

    // ==================== Metrics ====================

    pub fn get_metrics(&self) -> MetricsSummary {
        self.metrics.summary()
    }

    // ==================== Lifecycle ====================

    /// 進行中のリライトと保留中のタスクを止め、プレビューを破棄する
    pub fn dispose(&self) {
        self.shutdown.cancel();
        self.session.dispose();
    }
}

impl Drop for ViewerHost {
    fn drop(&mut self) {
        self.dispose();
    }
}
