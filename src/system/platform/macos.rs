use super::{CpuTimes, PlatformCounters};
use crate::error::{CounterError, QueryError};
use crate::system::source::run_command;

pub struct Platform;

impl PlatformCounters for Platform {
    fn cpu_times() -> Result<CpuTimes, CounterError> {
        // host_statistics ticks are not exposed through a stable crate here
        Err(CounterError::Unsupported)
    }
}

const SYSCTL_LABELS: [(&str, &str, bool); 5] = [
    ("hw.l1dcachesize", "L1CacheSize", true),
    ("hw.l2cachesize", "L2CacheSize", true),
    ("hw.l3cachesize", "L3CacheSize", true),
    ("hw.physicalcpu", "NumberOfCores", false),
    ("hw.logicalcpu", "NumberOfLogicalProcessors", false),
];

/// Rewrites `hw.key: value` sysctl lines as `Label : value`, bytes as KB.
fn translate_sysctl(raw: &str) -> String {
    let mut out = String::new();
    for line in raw.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let Some(&(_, label, is_bytes)) = SYSCTL_LABELS.iter().find(|(k, _, _)| *k == key.trim())
        else {
            continue;
        };
        let Ok(value) = value.trim().parse::<u64>() else {
            continue;
        };
        let value = if is_bytes { value / 1024 } else { value };
        out.push_str(&format!("{label} : {value}\n"));
    }
    out
}

pub async fn query_static_facts() -> Result<String, QueryError> {
    let keys: Vec<&str> = SYSCTL_LABELS.iter().map(|(k, _, _)| *k).collect();
    // sysctl fails as a whole when one key is unknown (no L3 on Apple silicon)
    let mut raw = String::new();
    for key in keys {
        if let Ok(line) = run_command("sysctl", &[key]).await {
            raw.push_str(&line);
        }
    }
    Ok(translate_sysctl(&raw))
}

pub async fn query_l1_cache() -> Result<String, QueryError> {
    let raw = run_command("sysctl", &["-n", "hw.l1dcachesize"]).await?;
    let bytes: u64 = raw
        .trim()
        .parse()
        .map_err(|_| QueryError::ParseMismatch("hw.l1dcachesize"))?;
    Ok(format!("L1CacheSize\n{}\n", bytes / 1024))
}

pub async fn query_context_switches() -> Result<String, QueryError> {
    Err(QueryError::Unsupported)
}

pub async fn query_processes() -> Result<String, QueryError> {
    run_command("ps", &["-Ao", "comm,pid,%cpu", "-r"]).await
}
