use parking_lot::Mutex;
use serde::Serialize;

const LATENCY_HISTORY: usize = 500;

/// プレビュー・リライトのローカルメトリクス
pub struct Metrics {
    counters: Mutex<Counters>,
    latencies: Mutex<Vec<LatencyRecord>>,
}

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    preview_pushes: u64,
    theme_pushes: u64,
    superseded_pushes: u64,
    rewrites_started: u64,
    rewrites_completed: u64,
    rewrites_canceled: u64,
    rewrites_failed: u64,
    no_provider: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LatencyRecord {
    pub action: String,
    pub duration_ms: u64,
    pub timestamp: String,
}

/// メトリクスサマリー（UI に返す用）
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    pub preview_pushes: u64,
    pub theme_pushes: u64,
    pub superseded_pushes: u64,
    pub rewrites_started: u64,
    pub rewrites_completed: u64,
    pub rewrites_canceled: u64,
    pub rewrites_failed: u64,
    pub no_provider: u64,
    pub avg_rewrite_ms: Option<f64>,
    pub recent_rewrites: Vec<LatencyRecord>,
}

/// リライト 1 回の結末
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteOutcome {
    Completed,
    Canceled,
    Failed,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            counters: Mutex::new(Counters::default()),
            latencies: Mutex::new(Vec::new()),
        }
    }

    pub fn inc_preview_push(&self) {
        self.counters.lock().preview_pushes += 1;
    }

    pub fn inc_theme_push(&self) {
        self.counters.lock().theme_pushes += 1;
    }

    /// 新しい更新で置き換えられた保留中の送信
    pub fn inc_superseded_push(&self) {
        self.counters.lock().superseded_pushes += 1;
    }

    pub fn inc_rewrite_started(&self) {
        self.counters.lock().rewrites_started += 1;
    }

    pub fn inc_no_provider(&self) {
        self.counters.lock().no_provider += 1;
    }

    pub fn record_rewrite(&self, action: &str, outcome: RewriteOutcome, duration_ms: u64) {
        {
            let mut c = self.counters.lock();
            match outcome {
                RewriteOutcome::Completed => c.rewrites_completed += 1,
                RewriteOutcome::Canceled => c.rewrites_canceled += 1,
                RewriteOutcome::Failed => c.rewrites_failed += 1,
            }
        }
        if outcome != RewriteOutcome::Completed {
            return;
        }

        let mut latencies = self.latencies.lock();
        latencies.push(LatencyRecord {
            action: action.to_string(),
            duration_ms,
            timestamp: chrono::Utc::now().to_rfc3339(),
        });
        if latencies.len() > LATENCY_HISTORY {
            let excess = latencies.len() - LATENCY_HISTORY;
            latencies.drain(0..excess);
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        let c = *self.counters.lock();
        let latencies = self.latencies.lock();

        let avg_rewrite_ms = if latencies.is_empty() {
            None
        } else {
            let total: u64 = latencies.iter().map(|r| r.duration_ms).sum();
            Some(total as f64 / latencies.len() as f64)
        };

        MetricsSummary {
            preview_pushes: c.preview_pushes,
            theme_pushes: c.theme_pushes,
            superseded_pushes: c.superseded_pushes,
            rewrites_started: c.rewrites_started,
            rewrites_completed: c.rewrites_completed,
            rewrites_canceled: c.rewrites_canceled,
            rewrites_failed: c.rewrites_failed,
            no_provider: c.no_provider,
            avg_rewrite_ms,
            recent_rewrites: latencies.iter().rev().take(20).cloned().collect(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let m = Metrics::new();
        m.inc_preview_push();
        m.inc_preview_push();
        m.inc_theme_push();
        m.inc_superseded_push();
        m.inc_rewrite_started();
        m.inc_no_provider();
        m.record_rewrite("simplify", RewriteOutcome::Canceled, 10);
        m.record_rewrite("simplify", RewriteOutcome::Failed, 10);

        let s = m.summary();
        assert_eq!(s.preview_pushes, 2);
        assert_eq!(s.theme_pushes, 1);
        assert_eq!(s.superseded_pushes, 1);
        assert_eq!(s.rewrites_started, 1);
        assert_eq!(s.rewrites_canceled, 1);
        assert_eq!(s.rewrites_failed, 1);
        assert_eq!(s.no_provider, 1);
        assert!(s.avg_rewrite_ms.is_none());
    }

    #[test]
    fn test_latency_average_counts_completed_only() {
        let m = Metrics::new();
        m.record_rewrite("rewrite", RewriteOutcome::Completed, 100);
        m.record_rewrite("expand", RewriteOutcome::Completed, 300);
        m.record_rewrite("expand", RewriteOutcome::Failed, 9000);

        let s = m.summary();
        assert!((s.avg_rewrite_ms.unwrap() - 200.0).abs() < f64::EPSILON);
        assert_eq!(s.recent_rewrites.len(), 2);
        assert_eq!(s.recent_rewrites[0].action, "expand");
    }

    #[test]
    fn test_latency_cap() {
        let m = Metrics::new();
        for i in 0..600 {
            m.record_rewrite("rewrite", RewriteOutcome::Completed, i);
        }
        assert_eq!(m.latencies.lock().len(), LATENCY_HISTORY);
    }
}
