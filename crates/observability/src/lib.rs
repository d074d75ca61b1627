use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

#[derive(Debug, Default)]
pub struct AppMetrics {
    requests_total: AtomicU64,
    wizard_completed_total: AtomicU64,
    llm_requests_total: AtomicU64,
    llm_failures_total: AtomicU64,
    search_augmented_total: AtomicU64,
    suppressed_sends_total: AtomicU64,
    total_latency_millis: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub wizard_completed_total: u64,
    pub llm_requests_total: u64,
    pub llm_failures_total: u64,
    pub search_augmented_total: u64,
    pub suppressed_sends_total: u64,
    pub avg_latency_millis: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_wizard_completed(&self) {
        self.wizard_completed_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_llm_request(&self) {
        self.llm_requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_llm_failure(&self) {
        self.llm_failures_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_search_augmented(&self) {
        self.search_augmented_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_suppressed_send(&self) {
        self.suppressed_sends_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn observe_latency(&self, duration: Duration) {
        self.total_latency_millis
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let requests = self.requests_total.load(Ordering::Relaxed);
        let latency = self.total_latency_millis.load(Ordering::Relaxed);

        MetricsSnapshot {
            requests_total: requests,
            wizard_completed_total: self.wizard_completed_total.load(Ordering::Relaxed),
            llm_requests_total: self.llm_requests_total.load(Ordering::Relaxed),
            llm_failures_total: self.llm_failures_total.load(Ordering::Relaxed),
            search_augmented_total: self.search_augmented_total.load(Ordering::Relaxed),
            suppressed_sends_total: self.suppressed_sends_total.load(Ordering::Relaxed),
            avg_latency_millis: if requests == 0 {
                0.0
            } else {
                latency as f64 / requests as f64
            },
        }
    }
}

pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,suraksha_api=info,suraksha_agents=info",
                service_name
            ))
        });

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true)
            .init();
    });
}
