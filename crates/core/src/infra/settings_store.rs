use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::domain::error::AppError;
use crate::domain::settings::AppSettings;

/// 設定の読み出し口。呼び出しのたびに最新のスナップショットを返す
pub trait SettingsSource: Send + Sync {
    fn snapshot(&self) -> AppSettings;
}

/// メモリ上の設定（ホストの設定 API をミラーする）
pub struct MemorySettings {
    inner: RwLock<AppSettings>,
    reads: AtomicU64,
}

impl MemorySettings {
    pub fn new(settings: AppSettings) -> Self {
        Self {
            inner: RwLock::new(settings),
            reads: AtomicU64::new(0),
        }
    }

    /// 設定を差し替え、変更されたキーを返す
    pub fn update(&self, settings: AppSettings) -> Vec<&'static str> {
        let mut current = self.inner.write();
        let changed = AppSettings::changed_keys(&current, &settings);
        *current = settings;
        changed
    }

    /// 一部だけ書き換える
    pub fn modify(&self, f: impl FnOnce(&mut AppSettings)) -> Vec<&'static str> {
        let mut next = self.inner.read().clone();
        f(&mut next);
        self.update(next)
    }

    /// `snapshot()` が呼ばれた回数
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self::new(AppSettings::default())
    }
}

impl SettingsSource for MemorySettings {
    fn snapshot(&self) -> AppSettings {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read().clone()
    }
}

/// JSON ファイルの設定。スナップショットごとにファイルを読み直す
pub struct JsonSettingsFile {
    path: PathBuf,
}

impl JsonSettingsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 既定パス: `<config_dir>/markdown-viewer/settings.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("markdown-viewer").join("settings.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<AppSettings, AppError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(AppSettings::default())
            }
            Err(e) => {
                return Err(AppError::storage(format!(
                    "failed to read settings file {}: {e}",
                    self.path.display()
                )))
            }
        };
        serde_json::from_str(&raw).map_err(|e| {
            AppError::storage(format!(
                "failed to parse settings file {}: {e}",
                self.path.display()
            ))
        })
    }

    pub fn save(&self, settings: &AppSettings) -> Result<(), AppError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| {
                AppError::storage(format!("failed to create settings directory: {e}"))
            })?;
        }
        let json = serde_json::to_string_pretty(settings)
            .map_err(|e| AppError::internal(format!("failed to serialize settings: {e}")))?;
        std::fs::write(&self.path, json)
            .map_err(|e| AppError::storage(format!("failed to write settings file: {e}")))
    }
}

impl SettingsSource for JsonSettingsFile {
    fn snapshot(&self) -> AppSettings {
        self.load().unwrap_or_else(|e| {
            log::warn!("{e}; using defaults");
            AppSettings::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ErrorCode;
    use crate::domain::settings::{ProviderPreference, KEY_LLM_PROVIDER};

    #[test]
    fn test_memory_settings_counts_reads() {
        let settings = MemorySettings::default();
        settings.snapshot();
        settings.snapshot();
        assert_eq!(settings.reads(), 2);
    }

    #[test]
    fn test_memory_settings_modify_reports_keys() {
        let settings = MemorySettings::default();
        let keys = settings.modify(|s| s.llm.provider = ProviderPreference::Openai);
        assert_eq!(keys, vec![KEY_LLM_PROVIDER]);
        assert_eq!(settings.snapshot().llm.provider, ProviderPreference::Openai);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let file = JsonSettingsFile::new(dir.path().join("missing.json"));
        assert_eq!(file.load().unwrap(), AppSettings::default());
    }

    #[test]
    fn test_save_then_snapshot_rereads() {
        let dir = tempfile::tempdir().unwrap();
        let file = JsonSettingsFile::new(dir.path().join("nested").join("settings.json"));

        let mut settings = AppSettings::default();
        settings.llm.openai_api_key = "k2".to_string();
        file.save(&settings).unwrap();
        assert_eq!(file.snapshot().llm.openai_api_key, "k2");

        settings.preview.font_size = 20;
        file.save(&settings).unwrap();
        assert_eq!(file.snapshot().preview.font_size, 20);
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();

        let file = JsonSettingsFile::new(&path);
        assert!(file.load().is_err());
        assert_eq!(file.snapshot(), AppSettings::default());
    }

    #[test]
    fn test_corrupt_file_error_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "[1,").unwrap();

        let err = JsonSettingsFile::new(&path).load().unwrap_err();
        assert_eq!(err.code, ErrorCode::Storage);
        assert!(err.message.starts_with("failed to parse settings file "));
        assert!(err.message.contains(&path.display().to_string()));
    }
}
