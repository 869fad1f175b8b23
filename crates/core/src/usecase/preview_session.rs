use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::domain::error::AppError;
use crate::domain::preview::{
    Document, HostThemeKind, Placement, PreviewMessage, SessionState, Theme,
};
use crate::infra::metrics::Metrics;
use crate::infra::settings_store::SettingsSource;
use crate::infra::surface::content::{self, ResourceResolver};
use crate::infra::surface::{PresentationSurface, SurfaceFactory, SurfaceOptions, SurfaceSpec};

/// テキスト変更からプレビュー送信までの待ち時間
pub const DEBOUNCE_DELAY: Duration = Duration::from_millis(300);

pub const VIEW_TYPE: &str = "markdownViewerPreview";
pub const DEFAULT_TITLE: &str = "Markdown Preview";

struct SessionDeps {
    factory: Arc<dyn SurfaceFactory>,
    settings: Arc<dyn SettingsSource>,
    resources: Arc<dyn ResourceResolver>,
    metrics: Arc<Metrics>,
    host_theme: watch::Receiver<HostThemeKind>,
}

impl SessionDeps {
    fn current_theme(&self) -> Theme {
        Theme::from(*self.host_theme.borrow())
    }
}

struct PendingPush {
    generation: u64,
    task: JoinHandle<()>,
}

struct SessionInner {
    state: SessionState,
    surface: Option<Box<dyn PresentationSurface>>,
    /// 保留中の送信は常に高々 1 つ
    pending: Option<PendingPush>,
    /// 表面ごとに張るハンドラ（閉鎖監視・テーマ転送）
    handlers: Vec<JoinHandle<()>>,
    generation: u64,
    last_pushed_revision: Option<u64>,
}

impl SessionInner {
    /// 保留中の送信を取り消す。取り消したら true
    fn cancel_pending(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                pending.task.abort();
                true
            }
            None => false,
        }
    }

    fn release_handlers(&mut self) {
        for handler in self.handlers.drain(..) {
            handler.abort();
        }
    }
}

/// プレビュー表面 1 枚のライフサイクルと送信を管理する。
///
/// 状態は `Closed → Opening → Open → Closed`、`dispose()` 後は `Disposed` で終端。
/// `update` 系は内部で tokio タスクを起こすので、ランタイム上で呼ぶこと。
pub struct PreviewSession {
    id: Uuid,
    inner: Arc<Mutex<SessionInner>>,
    deps: Arc<SessionDeps>,
    debounce: Duration,
}

impl PreviewSession {
    pub fn new(
        factory: Arc<dyn SurfaceFactory>,
        settings: Arc<dyn SettingsSource>,
        resources: Arc<dyn ResourceResolver>,
        host_theme: watch::Receiver<HostThemeKind>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            inner: Arc::new(Mutex::new(SessionInner {
                state: SessionState::Closed,
                surface: None,
                pending: None,
                handlers: Vec::new(),
                generation: 0,
                last_pushed_revision: None,
            })),
            deps: Arc::new(SessionDeps {
                factory,
                settings,
                resources,
                metrics,
                host_theme,
            }),
            debounce: DEBOUNCE_DELAY,
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.inner.lock().state
    }

    /// 最後に送ったドキュメントの版数
    pub fn last_pushed_revision(&self) -> Option<u64> {
        self.inner.lock().last_pushed_revision
    }

    pub fn has_pending_push(&self) -> bool {
        self.inner.lock().pending.is_some()
    }

    /// プレビューを表示する。開いていれば既存の表面を `placement` に出すだけ。
    ///
    /// その後、アクティブなドキュメントが Markdown なら即時に内容を送る。
    pub fn show_preview(
        &self,
        placement: Placement,
        active: Option<&Document>,
    ) -> Result<(), AppError> {
        {
            let mut inner = self.inner.lock();
            match inner.state {
                SessionState::Disposed => {
                    log::debug!("[preview {}] show_preview after dispose ignored", self.id);
                    return Ok(());
                }
                SessionState::Open => {
                    if let Some(surface) = inner.surface.as_ref() {
                        surface.reveal(placement);
                    }
                }
                SessionState::Closed | SessionState::Opening => {
                    self.open_surface(&mut inner, placement)?;
                }
            }
        }

        if let Some(document) = active.filter(|d| d.is_markdown()) {
            self.update_immediate(document);
        }
        Ok(())
    }

    fn open_surface(&self, inner: &mut SessionInner, placement: Placement) -> Result<(), AppError> {
        inner.state = SessionState::Opening;

        let nonce = content::generate_nonce();
        let spec = SurfaceSpec {
            view_type: VIEW_TYPE.to_string(),
            title: DEFAULT_TITLE.to_string(),
            placement,
            options: SurfaceOptions::default(),
            html: content::build_html(self.deps.resources.as_ref(), &nonce),
        };

        let handle = match self.deps.factory.create(spec) {
            Ok(handle) => handle,
            Err(e) => {
                inner.state = SessionState::Closed;
                log::error!("[preview {}] surface creation failed: {e}", self.id);
                return Err(AppError::surface(e.to_string()));
            }
        };

        let weak = Arc::downgrade(&self.inner);
        inner.surface = Some(handle.surface);
        inner
            .handlers
            .push(tokio::spawn(watch_surface_closed(handle.closed, weak.clone(), self.id)));

        let mut theme_rx = self.deps.host_theme.clone();
        theme_rx.borrow_and_update();
        inner.handlers.push(tokio::spawn(forward_theme_changes(
            theme_rx,
            weak,
            self.deps.metrics.clone(),
        )));

        inner.state = SessionState::Open;
        log::info!("[preview {}] surface opened ({placement:?})", self.id);
        Ok(())
    }

    /// テキスト変更通知。保留中の送信を取り消し、待ち時間後に全文を送る
    pub fn update(&self, document: &Document) {
        if !document.is_markdown() {
            return;
        }
        let mut inner = self.inner.lock();
        if inner.state != SessionState::Open {
            return;
        }
        if inner.cancel_pending() {
            self.deps.metrics.inc_superseded_push();
        }

        inner.generation += 1;
        let generation = inner.generation;
        let weak = Arc::downgrade(&self.inner);
        let deps = self.deps.clone();
        let document = document.clone();
        let delay = self.debounce;

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let mut inner = inner.lock();
            // 取り消し済みのタイマーが abort 前に起きていた場合は何もしない
            match &inner.pending {
                Some(pending) if pending.generation == generation => {}
                _ => return,
            }
            inner.pending = None;
            push_update(&mut inner, &deps, &document);
        });
        inner.pending = Some(PendingPush { generation, task });
    }

    /// 待たずに送る（エディタ切り替え時など）
    pub fn update_immediate(&self, document: &Document) {
        if !document.is_markdown() {
            return;
        }
        let mut inner = self.inner.lock();
        if inner.state != SessionState::Open {
            return;
        }
        if inner.cancel_pending() {
            self.deps.metrics.inc_superseded_push();
        }
        push_update(&mut inner, &self.deps, document);
    }

    /// タイマー・表面・ハンドラをまとめて破棄する。何度呼んでもよい
    pub fn dispose(&self) {
        let mut inner = self.inner.lock();
        if inner.state == SessionState::Disposed {
            return;
        }
        inner.cancel_pending();
        if let Some(mut surface) = inner.surface.take() {
            surface.dispose();
        }
        inner.release_handlers();
        inner.state = SessionState::Disposed;
        log::info!("[preview {}] disposed", self.id);
    }
}

impl Drop for PreviewSession {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn push_update(inner: &mut SessionInner, deps: &SessionDeps, document: &Document) {
    let Some(surface) = inner.surface.as_ref() else {
        return;
    };
    let message = PreviewMessage::Update {
        content: document.text.clone(),
        theme: deps.current_theme(),
        font_size: deps.settings.snapshot().preview.font_size,
    };
    match surface.post_message(&message) {
        Ok(()) => deps.metrics.inc_preview_push(),
        Err(e) => log::error!("preview message send failed [{}]: {e}", message.kind()),
    }
    surface.set_title(&format!("Preview: {}", document.file_name()));
    inner.last_pushed_revision = Some(document.version);
}

/// 利用者が表面を閉じたら `Closed` に戻す。送信側が消えた場合は何もしない
async fn watch_surface_closed(
    closed: oneshot::Receiver<()>,
    inner: Weak<Mutex<SessionInner>>,
    id: Uuid,
) {
    if closed.await.is_err() {
        return;
    }
    let Some(inner) = inner.upgrade() else {
        return;
    };
    let mut inner = inner.lock();
    if inner.state != SessionState::Open {
        return;
    }
    inner.cancel_pending();
    inner.surface = None;
    inner.release_handlers();
    inner.state = SessionState::Closed;
    log::info!("[preview {id}] surface closed by user");
}

/// ホストのテーマ変更を `theme` メッセージとして転送する。保留中の送信には触れない
async fn forward_theme_changes(
    mut theme_rx: watch::Receiver<HostThemeKind>,
    inner: Weak<Mutex<SessionInner>>,
    metrics: Arc<Metrics>,
) {
    while theme_rx.changed().await.is_ok() {
        let theme = Theme::from(*theme_rx.borrow_and_update());
        let Some(inner) = inner.upgrade() else {
            return;
        };
        let inner = inner.lock();
        let Some(surface) = inner.surface.as_ref() else {
            continue;
        };
        let message = PreviewMessage::Theme { theme };
        match surface.post_message(&message) {
            Ok(()) => metrics.inc_theme_push(),
            Err(e) => log::error!("preview message send failed [{}]: {e}", message.kind()),
        }
    }
}
