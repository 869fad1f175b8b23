pub mod commands;
pub mod preview_session;
pub mod progress;
pub mod rewrite_service;
pub mod viewer_host;
