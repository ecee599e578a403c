use std::sync::{Arc, RwLock};

use serde::Serialize;
use tokio::task::JoinHandle;

use super::source::TelemetrySource;
use crate::error::QueryError;

/// CPU topology and cache facts. `None` means unknown.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StaticFacts {
    pub l1_kb: Option<u32>,
    pub l2_kb: Option<u32>,
    pub l3_kb: Option<u32>,
    pub cores_physical: Option<u32>,
    pub cores_logical: Option<u32>,
    pub register_description: String,
}

impl StaticFacts {
    pub fn unknown() -> Self {
        StaticFacts {
            register_description: register_description(std::env::consts::ARCH).to_string(),
            ..StaticFacts::default()
        }
    }

    /// Copies every field `other` knows into fields still unknown here.
    fn fill_unknown(&mut self, other: &StaticFacts) {
        fn fill(slot: &mut Option<u32>, value: Option<u32>) {
            if slot.is_none() {
                *slot = value;
            }
        }
        fill(&mut self.l1_kb, other.l1_kb);
        fill(&mut self.l2_kb, other.l2_kb);
        fill(&mut self.l3_kb, other.l3_kb);
        fill(&mut self.cores_physical, other.cores_physical);
        fill(&mut self.cores_logical, other.cores_logical);
    }
}

pub fn register_description(arch: &str) -> &'static str {
    match arch {
        "x86_64" => "x86-64: 16 x 64-bit GPRs (RAX-R15), 16+ SIMD registers (XMM/YMM/ZMM)",
        "x86" => "x86: 8 x 32-bit GPRs (EAX-ESP), 8 XMM registers",
        "aarch64" => "AArch64: 31 x 64-bit GPRs (X0-X30), 32 x 128-bit SIMD/FP (V0-V31)",
        "arm" => "ARM: 16 x 32-bit core registers (R0-R15)",
        "riscv64" => "RISC-V 64: 32 x 64-bit integer registers (x0-x31)",
        _ => "unknown register file",
    }
}

/// Parses `Label : value` lines. Only the first occurrence of each label
/// counts; an empty or non-numeric value leaves the field unknown.
pub fn parse_labeled_facts(raw: &str) -> StaticFacts {
    let mut facts = StaticFacts::default();
    for line in raw.lines() {
        let Some((label, value)) = line.split_once(':') else {
            continue;
        };
        let slot = match label.trim() {
            "L1CacheSize" => &mut facts.l1_kb,
            "L2CacheSize" => &mut facts.l2_kb,
            "L3CacheSize" => &mut facts.l3_kb,
            "NumberOfCores" => &mut facts.cores_physical,
            "NumberOfLogicalProcessors" => &mut facts.cores_logical,
            _ => continue,
        };
        if slot.is_none() {
            *slot = value.trim().parse().ok();
        }
    }
    facts
}

/// Parses the fallback L1 answer: a header row then a value row.
pub fn parse_l1_table(raw: &str) -> Result<u32, QueryError> {
    let mut rows = raw.lines().map(str::trim).filter(|l| !l.is_empty());
    rows.next().ok_or(QueryError::ParseMismatch("L1CacheSize"))?;
    rows.next()
        .and_then(|v| v.parse().ok())
        .ok_or(QueryError::ParseMismatch("L1CacheSize"))
}

/// Process-wide cache of [`StaticFacts`].
///
/// `read` never blocks on initialization; writers only fill fields that are
/// still unknown, so a reader sees each field either unknown or final.
#[derive(Clone)]
pub struct StaticFactsCache {
    facts: Arc<RwLock<StaticFacts>>,
}

impl Default for StaticFactsCache {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticFactsCache {
    pub fn new() -> Self {
        StaticFactsCache {
            facts: Arc::new(RwLock::new(StaticFacts::unknown())),
        }
    }

    pub fn read(&self) -> StaticFacts {
        self.facts
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn merge(&self, found: &StaticFacts) {
        let mut facts = self
            .facts
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        facts.fill_unknown(found);
    }

    /// Starts the one-shot static queries in the background.
    ///
    /// The returned handle is only needed by callers that want to wait for
    /// the facts to settle; dropping it leaves the task running.
    pub fn initialize(&self, source: Arc<dyn TelemetrySource>) -> JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move { cache.populate(source.as_ref()).await })
    }

    pub async fn populate(&self, source: &dyn TelemetrySource) {
        match source.static_facts().await {
            Ok(raw) => {
                let found = parse_labeled_facts(&raw);
                tracing::debug!(?found, "static facts query finished");
                self.merge(&found);
            }
            Err(err) => tracing::warn!(error = %err, "static facts query failed"),
        }

        if self.read().l1_kb.is_some() {
            return;
        }

        match source.l1_cache().await.and_then(|raw| parse_l1_table(&raw)) {
            Ok(kb) => self.merge(&StaticFacts {
                l1_kb: Some(kb),
                ..StaticFacts::default()
            }),
            Err(err) => tracing::warn!(error = %err, "L1 cache fallback query failed"),
        }
    }
}
