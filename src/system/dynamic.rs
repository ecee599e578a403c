use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use super::source::TelemetrySource;
use crate::error::QueryError;

/// Process names hidden from the listing by default.
pub const DEFAULT_DENY_LIST: &[&str] = &[
    // Windows
    "System",
    "Idle",
    "Registry",
    "smss",
    "csrss",
    "wininit",
    "winlogon",
    "services",
    "lsass",
    "svchost",
    "explorer",
    "dwm",
    "fontdrvhost",
    "conhost",
    "sihost",
    "taskhostw",
    "RuntimeBroker",
    "SearchIndexer",
    "spoolsv",
    "ctfmon",
    "dllhost",
    "audiodg",
    "MsMpEng",
    "WmiPrvSE",
    // Linux / macOS
    "systemd",
    "kthreadd",
    "init",
    "launchd",
    "kernel_task",
    "WindowServer",
];

/// Freshly sampled per-cycle values. `None` means the query failed.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DynamicMetrics {
    pub context_switch_rate: Option<f64>,
    pub process_listing: Option<String>,
}

/// Extracts `CookedValue : <float>` from a performance counter answer.
pub fn parse_cooked_value(raw: &str) -> Result<f64, QueryError> {
    raw.lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(label, _)| label.trim() == "CookedValue")
        .and_then(|(_, value)| value.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .ok_or(QueryError::ParseMismatch("CookedValue"))
}

#[derive(Clone, Debug)]
pub struct ProcessFilter {
    deny: HashSet<String>,
    max_rows: usize,
}

impl ProcessFilter {
    pub fn new<I, S>(deny: I, max_rows: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ProcessFilter {
            deny: deny.into_iter().map(Into::into).collect(),
            max_rows,
        }
    }

    /// Lines before the first process row are kept as the table header.
    /// Process rows whose leading token exactly matches a denied name are
    /// dropped and at most `max_rows` of them are kept (0 = unlimited).
    /// Returns an empty string when no process row survives.
    pub fn apply(&self, listing: &str) -> String {
        let limit = if self.max_rows == 0 {
            usize::MAX
        } else {
            self.max_rows
        };
        let mut header: Vec<&str> = Vec::new();
        let mut rows: Vec<&str> = Vec::new();
        let mut in_header = true;
        for line in listing
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.trim().is_empty())
        {
            if in_header && !is_process_row(line) {
                header.push(line);
                continue;
            }
            in_header = false;
            let denied = line
                .split_whitespace()
                .next()
                .is_some_and(|name| self.deny.contains(name));
            if !denied && rows.len() < limit {
                rows.push(line);
            }
        }
        if rows.is_empty() {
            return String::new();
        }
        header.extend(rows);
        header.join("\n").trim().to_string()
    }
}

/// A process row carries a numeric pid after the name column.
fn is_process_row(line: &str) -> bool {
    line.split_whitespace()
        .skip(1)
        .any(|token| token.parse::<u64>().is_ok())
}

impl Default for ProcessFilter {
    fn default() -> Self {
        ProcessFilter::new(DEFAULT_DENY_LIST.iter().copied(), 0)
    }
}

/// Fetches the per-cycle metrics. Failures degrade to `None`.
pub struct DynamicMetricsFetcher {
    source: Arc<dyn TelemetrySource>,
    filter: ProcessFilter,
}

impl DynamicMetricsFetcher {
    pub fn new(source: Arc<dyn TelemetrySource>, filter: ProcessFilter) -> Self {
        DynamicMetricsFetcher { source, filter }
    }

    pub async fn fetch_context_switch_rate(&self) -> Option<f64> {
        match self
            .source
            .context_switches()
            .await
            .and_then(|raw| parse_cooked_value(&raw))
        {
            Ok(rate) => Some(rate),
            Err(err) => {
                tracing::warn!(error = %err, "context switch rate unavailable");
                None
            }
        }
    }

    pub async fn fetch_process_listing(&self) -> Option<String> {
        match self.source.processes().await {
            Ok(raw) => Some(self.filter.apply(&raw)),
            Err(err) => {
                tracing::warn!(error = %err, "process listing unavailable");
                None
            }
        }
    }

    /// Rate first, then listing, so report sections keep a stable order.
    pub async fn fetch(&self) -> DynamicMetrics {
        let context_switch_rate = self.fetch_context_switch_rate().await;
        let process_listing = self.fetch_process_listing().await;
        DynamicMetrics {
            context_switch_rate,
            process_listing,
        }
    }
}
