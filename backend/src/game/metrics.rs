use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide game counters, exposed on `/metrics`.
#[derive(Debug, Default)]
pub struct GameMetrics {
    prompts_issued: AtomicU64,
    prompts_rate_limited: AtomicU64,
    submissions_valid: AtomicU64,
    submissions_invalid: AtomicU64,
    points_awarded: AtomicU64,
    upstream_failures: AtomicU64,
}

/// Point-in-time copy of [`GameMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub prompts_issued: u64,
    pub prompts_rate_limited: u64,
    pub submissions_valid: u64,
    pub submissions_invalid: u64,
    pub points_awarded: u64,
    pub upstream_failures: u64,
}

impl GameMetrics {
    pub fn record_prompt_issued(&self) {
        self.prompts_issued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rate_limited(&self) {
        self.prompts_rate_limited.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_valid(&self, points: u64) {
        self.submissions_valid.fetch_add(1, Ordering::Relaxed);
        self.points_awarded.fetch_add(points, Ordering::Relaxed);
    }

    pub fn record_invalid(&self) {
        self.submissions_invalid.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_upstream_failure(&self) {
        self.upstream_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            prompts_issued: self.prompts_issued.load(Ordering::Relaxed),
            prompts_rate_limited: self.prompts_rate_limited.load(Ordering::Relaxed),
            submissions_valid: self.submissions_valid.load(Ordering::Relaxed),
            submissions_invalid: self.submissions_invalid.load(Ordering::Relaxed),
            points_awarded: self.points_awarded.load(Ordering::Relaxed),
            upstream_failures: self.upstream_failures.load(Ordering::Relaxed),
        }
    }
}
