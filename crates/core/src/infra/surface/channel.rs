use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{mpsc, oneshot};

use super::view::SurfaceView;
use super::{ChannelError, PresentationSurface, SurfaceFactory, SurfaceHandle, SurfaceSpec};
use crate::domain::preview::{Placement, PreviewMessage};

/// ホスト → 表面へ流れるイベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// JSON エンコード済みメッセージ
    Message(String),
    Reveal(Placement),
    Title(String),
    Disposed,
}

/// mpsc チャネルで表面とつながるホスト側ハンドル
pub struct ChannelSurface {
    tx: mpsc::UnboundedSender<SurfaceEvent>,
    disposed: bool,
}

impl ChannelSurface {
    fn send(&self, event: SurfaceEvent) -> Result<(), ChannelError> {
        if self.disposed {
            return Err(ChannelError::Closed);
        }
        self.tx.send(event).map_err(|_| ChannelError::Closed)
    }
}

impl PresentationSurface for ChannelSurface {
    fn post_message(&self, message: &PreviewMessage) -> Result<(), ChannelError> {
        let json =
            serde_json::to_string(message).map_err(|e| ChannelError::Encode(e.to_string()))?;
        self.send(SurfaceEvent::Message(json))
    }

    fn reveal(&self, placement: Placement) {
        if let Err(e) = self.send(SurfaceEvent::Reveal(placement)) {
            log::debug!("reveal ignored: {e}");
        }
    }

    fn set_title(&self, title: &str) {
        if let Err(e) = self.send(SurfaceEvent::Title(title.to_string())) {
            log::debug!("set_title ignored: {e}");
        }
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        let _ = self.tx.send(SurfaceEvent::Disposed);
        self.disposed = true;
    }
}

/// 表面側の受信口。受け取ったメッセージを順に `SurfaceView` へ適用する
pub struct SurfaceEndpoint {
    spec: SurfaceSpec,
    rx: mpsc::UnboundedReceiver<SurfaceEvent>,
    close_tx: Option<oneshot::Sender<()>>,
    view: SurfaceView,
    messages: Vec<PreviewMessage>,
    title: String,
    reveals: Vec<Placement>,
    disposed: bool,
}

impl SurfaceEndpoint {
    pub fn spec(&self) -> &SurfaceSpec {
        &self.spec
    }

    pub fn view(&self) -> &SurfaceView {
        &self.view
    }

    /// 受信済みメッセージ（受信順）
    pub fn messages(&self) -> &[PreviewMessage] {
        &self.messages
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn reveals(&self) -> &[Placement] {
        &self.reveals
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// 次のイベントを待って適用する。チャネルが閉じたら `None`
    pub async fn recv(&mut self) -> Option<SurfaceEvent> {
        let event = self.rx.recv().await?;
        self.apply(&event);
        Some(event)
    }

    /// 届いているイベントをすべて適用し、その件数を返す
    pub fn drain(&mut self) -> usize {
        let mut count = 0;
        while let Ok(event) = self.rx.try_recv() {
            self.apply(&event);
            count += 1;
        }
        count
    }

    /// 利用者が表面を閉じた
    pub fn close(&mut self) {
        if let Some(tx) = self.close_tx.take() {
            let _ = tx.send(());
        }
    }

    fn apply(&mut self, event: &SurfaceEvent) {
        match event {
            SurfaceEvent::Message(json) => match serde_json::from_str::<PreviewMessage>(json) {
                Ok(message) => {
                    self.view.apply(&message);
                    self.messages.push(message);
                }
                Err(e) => log::warn!("unknown preview message dropped: {e}"),
            },
            SurfaceEvent::Reveal(placement) => self.reveals.push(*placement),
            SurfaceEvent::Title(title) => self.title = title.clone(),
            SurfaceEvent::Disposed => self.disposed = true,
        }
    }
}

/// `ChannelSurface` を作り、対になる `SurfaceEndpoint` を受信側へ渡すファクトリ
pub struct ChannelSurfaceFactory {
    endpoints: mpsc::UnboundedSender<SurfaceEndpoint>,
    created: AtomicUsize,
}

impl ChannelSurfaceFactory {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SurfaceEndpoint>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                endpoints: tx,
                created: AtomicUsize::new(0),
            },
            rx,
        )
    }

    /// これまでに生成した表面の数
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl SurfaceFactory for ChannelSurfaceFactory {
    fn create(&self, spec: SurfaceSpec) -> Result<SurfaceHandle, ChannelError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let (close_tx, close_rx) = oneshot::channel();

        let endpoint = SurfaceEndpoint {
            title: spec.title.clone(),
            spec,
            rx,
            close_tx: Some(close_tx),
            view: SurfaceView::default(),
            messages: Vec::new(),
            reveals: Vec::new(),
            disposed: false,
        };
        self.endpoints
            .send(endpoint)
            .map_err(|_| ChannelError::Create("surface receiver dropped".to_string()))?;
        self.created.fetch_add(1, Ordering::SeqCst);

        Ok(SurfaceHandle {
            surface: Box::new(ChannelSurface { tx, disposed: false }),
            closed: close_rx,
        })
    }
}
