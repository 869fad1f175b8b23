pub mod llm;
pub mod metrics;
pub mod notifier;
pub mod settings_store;
pub mod surface;
