use std::sync::Arc;

use super::host_model::ModelCatalog;
use super::transport::HttpTransport;
use super::{CompletionProvider, DirectApiProvider, HostModelProvider, Vendor};
use crate::domain::settings::{LlmSettings, ProviderPreference};
use crate::infra::notifier::Notifier;

/// プロバイダ解決に必要な外部依存
#[derive(Clone)]
pub struct ResolveContext {
    /// ホストのモデル選択機能。ない環境では `None`
    pub catalog: Option<Arc<dyn ModelCatalog>>,
    pub transport: Arc<dyn HttpTransport>,
    pub notifier: Arc<dyn Notifier>,
}

/// 設定スナップショットから有効なプロバイダを決める。
///
/// 優先順: ホスト内モデル → 直接 API (Anthropic → OpenAI) → なし。
/// 毎回フルに解決し、結果はキャッシュしない。
pub async fn resolve_provider(
    settings: &LlmSettings,
    ctx: &ResolveContext,
) -> Option<Arc<dyn CompletionProvider>> {
    let preference = settings.provider;

    // Tier A: ホスト内モデル
    if matches!(preference, ProviderPreference::Auto | ProviderPreference::HostLm) {
        if let Some(catalog) = &ctx.catalog {
            match catalog.select_chat_models().await {
                Ok(models) => {
                    if let Some(model) = models.into_iter().next() {
                        log::info!("LLM provider resolved: host model {}", model.name());
                        return Some(Arc::new(HostModelProvider::new(model, ctx.notifier.clone())));
                    }
                }
                Err(e) => log::debug!("host model query failed, falling through: {e}"),
            }
        }
    }

    // Tier B: 直接 API
    let candidates = [
        (Vendor::Anthropic, ProviderPreference::Anthropic, &settings.anthropic_api_key),
        (Vendor::OpenAi, ProviderPreference::Openai, &settings.openai_api_key),
    ];
    for (vendor, explicit, key) in candidates {
        let has_key = !key.trim().is_empty();
        let eligible = preference == explicit || (preference == ProviderPreference::Auto && has_key);
        if !eligible || !has_key {
            continue;
        }
        match DirectApiProvider::new(
            vendor,
            key.as_str(),
            settings.model_override(),
            ctx.transport.clone(),
            ctx.notifier.clone(),
        ) {
            Ok(provider) => {
                log::info!("LLM provider resolved: {vendor} API ({})", provider.model());
                return Some(Arc::new(provider));
            }
            Err(e) => log::warn!("{vendor} provider unavailable: {e}"),
        }
    }

    // Tier C: なし
    log::info!("No LLM provider available (preference: {preference:?})");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::llm::host_model::{
        ChatMessage, HostLanguageModel, HostModelError, TextStream,
    };
    use crate::infra::llm::transport::{HttpRequest, HttpResponse, TransportError};
    use crate::infra::llm::ProviderKind;
    use crate::infra::notifier::MemoryNotifier;
    use async_trait::async_trait;
    use tokio_util::sync::CancellationToken;

    struct NullTransport;

    #[async_trait]
    impl HttpTransport for NullTransport {
        async fn post_json(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
            Err(TransportError::Request("not reachable in resolver tests".to_string()))
        }
    }

    struct NamedModel(&'static str);

    #[async_trait]
    impl HostLanguageModel for NamedModel {
        fn name(&self) -> &str {
            self.0
        }

        async fn send_request(
            &self,
            _messages: Vec<ChatMessage>,
            _cancel: CancellationToken,
        ) -> Result<TextStream, HostModelError> {
            Err(HostModelError::Unavailable("test".to_string()))
        }
    }

    enum CatalogBehavior {
        Models(Vec<&'static str>),
        Fails,
    }

    struct FakeCatalog(CatalogBehavior);

    #[async_trait]
    impl ModelCatalog for FakeCatalog {
        async fn select_chat_models(
            &self,
        ) -> Result<Vec<Arc<dyn HostLanguageModel>>, HostModelError> {
            match &self.0 {
                CatalogBehavior::Models(names) => Ok(names
                    .iter()
                    .map(|n| Arc::new(NamedModel(*n)) as Arc<dyn HostLanguageModel>)
                    .collect()),
                CatalogBehavior::Fails => Err(HostModelError::Unavailable("no lm api".to_string())),
            }
        }
    }

    fn ctx(catalog: Option<CatalogBehavior>) -> ResolveContext {
        ResolveContext {
            catalog: catalog.map(|b| Arc::new(FakeCatalog(b)) as Arc<dyn ModelCatalog>),
            transport: Arc::new(NullTransport),
            notifier: Arc::new(MemoryNotifier::new()),
        }
    }

    fn settings(preference: ProviderPreference, anthropic: &str, openai: &str) -> LlmSettings {
        LlmSettings {
            provider: preference,
            anthropic_api_key: anthropic.to_string(),
            openai_api_key: openai.to_string(),
            model: String::new(),
        }
    }

    async fn kind_of(settings: &LlmSettings, ctx: &ResolveContext) -> Option<ProviderKind> {
        resolve_provider(settings, ctx).await.map(|p| p.kind())
    }

    #[tokio::test]
    async fn test_auto_prefers_anthropic_over_openai() {
        let s = settings(ProviderPreference::Auto, "k1", "k2");
        assert_eq!(
            kind_of(&s, &ctx(None)).await,
            Some(ProviderKind::Direct(Vendor::Anthropic))
        );
    }

    #[tokio::test]
    async fn test_auto_uses_openai_when_only_key() {
        let s = settings(ProviderPreference::Auto, "", "k2");
        assert_eq!(
            kind_of(&s, &ctx(None)).await,
            Some(ProviderKind::Direct(Vendor::OpenAi))
        );
    }

    #[tokio::test]
    async fn test_host_model_wins_under_auto() {
        let s = settings(ProviderPreference::Auto, "k1", "k2");
        let c = ctx(Some(CatalogBehavior::Models(vec!["copilot-gpt", "other"])));
        assert_eq!(
            kind_of(&s, &c).await,
            Some(ProviderKind::HostModel("copilot-gpt".to_string()))
        );
    }

    #[tokio::test]
    async fn test_catalog_failure_falls_through() {
        let s = settings(ProviderPreference::Auto, "k1", "");
        let c = ctx(Some(CatalogBehavior::Fails));
        assert_eq!(
            kind_of(&s, &c).await,
            Some(ProviderKind::Direct(Vendor::Anthropic))
        );
    }

    #[tokio::test]
    async fn test_empty_catalog_falls_through() {
        let s = settings(ProviderPreference::Auto, "", "k2");
        let c = ctx(Some(CatalogBehavior::Models(vec![])));
        assert_eq!(
            kind_of(&s, &c).await,
            Some(ProviderKind::Direct(Vendor::OpenAi))
        );
    }

    #[tokio::test]
    async fn test_explicit_vendor_skips_host_model() {
        let s = settings(ProviderPreference::Openai, "k1", "k2");
        let c = ctx(Some(CatalogBehavior::Models(vec!["copilot-gpt"])));
        assert_eq!(
            kind_of(&s, &c).await,
            Some(ProviderKind::Direct(Vendor::OpenAi))
        );
    }

    #[tokio::test]
    async fn test_explicit_vendor_without_key_resolves_none() {
        let s = settings(ProviderPreference::Anthropic, "", "k2");
        assert!(kind_of(&s, &ctx(None)).await.is_none());
    }

    #[tokio::test]
    async fn test_host_lm_preference_ignores_keys() {
        let s = settings(ProviderPreference::HostLm, "k1", "k2");
        assert!(kind_of(&s, &ctx(None)).await.is_none());
    }

    #[tokio::test]
    async fn test_nothing_configured() {
        let s = settings(ProviderPreference::Auto, "", "  ");
        assert!(kind_of(&s, &ctx(None)).await.is_none());
    }
}
