//! ViewerHost → PreviewSession → 表面までの統合テスト。
//!
//! 時刻は `start_paused` で固定し、デバウンスを決定的に検証する。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

use mdv_core::domain::preview::{
    Document, HostThemeKind, Placement, PreviewMessage, SessionState, Theme,
};
use mdv_core::infra::llm::transport::{HttpRequest, HttpResponse, HttpTransport, TransportError};
use mdv_core::infra::notifier::MemoryNotifier;
use mdv_core::infra::settings_store::MemorySettings;
use mdv_core::infra::surface::content::BaseUriResolver;
use mdv_core::infra::surface::{ChannelSurfaceFactory, MarkdownRenderer, SurfaceEndpoint};
use mdv_core::usecase::progress::SilentProgress;
use mdv_core::usecase::viewer_host::{HostServices, ViewerHost};

struct OfflineTransport;

#[async_trait]
impl HttpTransport for OfflineTransport {
    async fn post_json(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
        Err(TransportError::Request("offline".to_string()))
    }
}

/// 見出し行だけを拾う簡易レンダラ
struct HeadingRenderer;

impl MarkdownRenderer for HeadingRenderer {
    type Tree = Vec<String>;

    fn render(&self, markdown: &str) -> Self::Tree {
        markdown
            .lines()
            .filter_map(|l| l.strip_prefix("# "))
            .map(str::to_string)
            .collect()
    }
}

struct Harness {
    host: ViewerHost,
    endpoints: mpsc::UnboundedReceiver<SurfaceEndpoint>,
    theme: watch::Sender<HostThemeKind>,
}

fn harness() -> Harness {
    let (factory, endpoints) = ChannelSurfaceFactory::new();
    let settings = Arc::new(MemorySettings::default());
    settings.modify(|s| s.preview.auto_open = false);
    let (theme, theme_rx) = watch::channel(HostThemeKind::Dark);

    let host = ViewerHost::new(HostServices {
        surfaces: Arc::new(factory),
        resources: Arc::new(BaseUriResolver {
            scheme: "surface-resource".to_string(),
            root: "extension".to_string(),
        }),
        settings,
        notifier: Arc::new(MemoryNotifier::new()),
        progress: Arc::new(SilentProgress),
        transport: Arc::new(OfflineTransport),
        catalog: None,
        host_theme: theme_rx,
    });
    Harness {
        host,
        endpoints,
        theme,
    }
}

fn doc(text: &str, version: u64) -> Document {
    Document::markdown("file:///work/README.md", text, version)
}

fn updates(endpoint: &SurfaceEndpoint) -> Vec<String> {
    endpoint
        .messages()
        .iter()
        .filter_map(|m| match m {
            PreviewMessage::Update { content, .. } => Some(content.clone()),
            PreviewMessage::Theme { .. } => None,
        })
        .collect()
}

async fn open(h: &mut Harness) -> SurfaceEndpoint {
    h.host.show_preview(Placement::Beside).unwrap();
    h.endpoints.recv().await.unwrap()
}

#[tokio::test(start_paused = true)]
async fn burst_of_edits_sends_only_last_content() {
    let mut h = harness();
    let mut endpoint = open(&mut h).await;

    h.host.on_document_changed(&doc("# one", 1));
    tokio::time::sleep(Duration::from_millis(50)).await;
    h.host.on_document_changed(&doc("# two", 2));
    tokio::time::sleep(Duration::from_millis(50)).await;
    h.host.on_document_changed(&doc("# three", 3));

    tokio::time::sleep(Duration::from_millis(1000)).await;
    endpoint.drain();

    assert_eq!(updates(&endpoint), vec!["# three".to_string()]);
    assert_eq!(
        endpoint.view().render(&HeadingRenderer),
        Some(vec!["three".to_string()])
    );
    assert_eq!(h.host.get_metrics().superseded_pushes, 2);
}

#[tokio::test(start_paused = true)]
async fn editor_switch_preempts_pending_edit() {
    let mut h = harness();
    let mut endpoint = open(&mut h).await;

    h.host.on_document_changed(&doc("# typing", 1));
    h.host
        .on_active_editor_changed(Some(Document::markdown("file:///work/OTHER.md", "# other", 4)));
    endpoint.drain();
    assert_eq!(updates(&endpoint), vec!["# other".to_string()]);
    assert_eq!(endpoint.title(), "Preview: OTHER.md");

    tokio::time::sleep(Duration::from_millis(600)).await;
    endpoint.drain();
    assert_eq!(updates(&endpoint), vec!["# other".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn theme_change_reaches_surface_without_update() {
    let mut h = harness();
    let mut endpoint = open(&mut h).await;

    h.theme.send(HostThemeKind::Light).unwrap();
    tokio::time::sleep(Duration::from_millis(1)).await;
    endpoint.drain();

    assert_eq!(endpoint.messages(), &[PreviewMessage::Theme { theme: Theme::Light }]);
    assert_eq!(endpoint.view().theme(), Theme::Light);
    assert!(endpoint.view().content().is_none());
}

#[tokio::test(start_paused = true)]
async fn disposed_host_ignores_everything() {
    let mut h = harness();
    let mut endpoint = open(&mut h).await;
    h.host.on_document_changed(&doc("# pending", 1));

    h.host.dispose();
    h.host.on_document_changed(&doc("# after", 2));
    h.host.on_active_editor_changed(Some(doc("# after", 3)));
    h.host.show_preview(Placement::Active).unwrap();

    tokio::time::sleep(Duration::from_millis(1000)).await;
    endpoint.drain();
    assert!(updates(&endpoint).is_empty());
    assert!(endpoint.is_disposed());
    assert!(h.endpoints.try_recv().is_err());
    assert_eq!(h.host.session_state(), SessionState::Disposed);
}

#[tokio::test(start_paused = true)]
async fn surface_bootstrap_is_locked_down() {
    let mut h = harness();
    let endpoint = open(&mut h).await;
    let spec = endpoint.spec();

    assert_eq!(spec.placement, Placement::Beside);
    assert_eq!(
        spec.options.local_resource_roots,
        vec!["dist".to_string(), "node_modules/katex/dist".to_string()]
    );
    assert!(spec.html.contains("default-src 'none'"));
    assert_eq!(spec.html.matches("<script").count(), 1);
}
