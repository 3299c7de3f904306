//! Process-wide operational metrics.
//!
//! Counters and gauges behind a single mutex, constructed once at startup
//! and passed explicitly to the components that record into it.

use std::collections::BTreeMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Namespace prepended to every metric name in the text exposition.
const NAMESPACE: &str = "cutout";

/// Process-wide counter/gauge store.
///
/// Counters only increase; gauges hold the last written value. All reads and
/// writes go through one mutual-exclusion region.
#[derive(Debug, Default)]
pub struct MetricsStore {
    inner: Mutex<MetricsInner>,
}

#[derive(Debug, Default)]
struct MetricsInner {
    counters: BTreeMap<String, u64>,
    gauges: BTreeMap<String, i64>,
}

/// Point-in-time copy of all metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Monotonic counters.
    pub counters: BTreeMap<String, u64>,
    /// Last-written gauge values.
    pub gauges: BTreeMap<String, i64>,
}

impl MetricsStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment a counter by `by`, creating it at zero if absent.
    pub fn increment(&self, name: &str, by: u64) {
        let mut inner = self.inner.lock().expect("metrics mutex poisoned");
        *inner.counters.entry(name.to_string()).or_insert(0) += by;
    }

    /// Set a gauge to `value`.
    pub fn set_gauge(&self, name: &str, value: i64) {
        let mut inner = self.inner.lock().expect("metrics mutex poisoned");
        inner.gauges.insert(name.to_string(), value);
    }

    /// Copy out all current values.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let inner = self.inner.lock().expect("metrics mutex poisoned");
        MetricsSnapshot {
            counters: inner.counters.clone(),
            gauges: inner.gauges.clone(),
        }
    }

    /// Render a scrape-friendly text exposition: one namespaced line per
    /// metric, sorted by key.
    pub fn render_text(&self) -> String {
        let snapshot = self.snapshot();
        let mut lines: Vec<String> = Vec::new();
        for (name, value) in &snapshot.counters {
            lines.push(format!("{NAMESPACE}_{name} {value}"));
        }
        for (name, value) in &snapshot.gauges {
            lines.push(format!("{NAMESPACE}_{name} {value}"));
        }
        lines.sort();
        let mut out = lines.join("\n");
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }
}
