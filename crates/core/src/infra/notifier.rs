use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

/// 利用者向け通知・入力ダイアログの窓口（ホスト UI が実装する）
#[async_trait]
pub trait Notifier: Send + Sync {
    fn info(&self, message: &str);

    fn error(&self, message: &str);

    /// アクション付き警告。選ばれたアクション名を返す
    async fn warn_with_actions(&self, message: &str, actions: &[&str]) -> Option<String>;

    /// 入力ダイアログ。キャンセル時は `None`
    async fn prompt_input(&self, prompt: &str, placeholder: &str) -> Option<String>;

    /// 設定画面を指定セクションで開く
    fn open_settings(&self, section: &str);
}

/// UI を持たない環境用: ログに流すだけ
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn info(&self, message: &str) {
        log::info!("{message}");
    }

    fn error(&self, message: &str) {
        log::error!("{message}");
    }

    async fn warn_with_actions(&self, message: &str, actions: &[&str]) -> Option<String> {
        log::warn!("{message} (actions: {})", actions.join(", "));
        None
    }

    async fn prompt_input(&self, prompt: &str, _placeholder: &str) -> Option<String> {
        log::warn!("input dialog unsupported, dropped: {prompt}");
        None
    }

    fn open_settings(&self, section: &str) {
        log::info!("open settings: {section}");
    }
}

/// 通知の記録
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
    Warning { message: String, actions: Vec<String> },
    Prompt(String),
    OpenSettings(String),
}

/// 通知を記録し、ダイアログには事前に積んだ応答を返すインメモリ実装
#[derive(Default)]
pub struct MemoryNotifier {
    notices: Mutex<Vec<Notice>>,
    action_replies: Mutex<VecDeque<Option<String>>>,
    input_replies: Mutex<VecDeque<Option<String>>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// 次の `warn_with_actions` の応答を積む
    pub fn push_action_reply(&self, reply: Option<&str>) {
        self.action_replies
            .lock()
            .push_back(reply.map(str::to_string));
    }

    /// 次の `prompt_input` の応答を積む
    pub fn push_input_reply(&self, reply: Option<&str>) {
        self.input_replies.lock().push_back(reply.map(str::to_string));
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.notices
            .lock()
            .iter()
            .filter_map(|n| match n {
                Notice::Error(m) => Some(m.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    fn info(&self, message: &str) {
        self.notices.lock().push(Notice::Info(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.notices.lock().push(Notice::Error(message.to_string()));
    }

    async fn warn_with_actions(&self, message: &str, actions: &[&str]) -> Option<String> {
        self.notices.lock().push(Notice::Warning {
            message: message.to_string(),
            actions: actions.iter().map(|a| a.to_string()).collect(),
        });
        self.action_replies.lock().pop_front().flatten()
    }

    async fn prompt_input(&self, prompt: &str, _placeholder: &str) -> Option<String> {
        self.notices.lock().push(Notice::Prompt(prompt.to_string()));
        self.input_replies.lock().pop_front().flatten()
    }

    fn open_settings(&self, section: &str) {
        self.notices
            .lock()
            .push(Notice::OpenSettings(section.to_string()));
    }
}
