use std::path::Path;
use std::time::Duration;

use sysinfo::System;

use super::{CpuTimes, PlatformCounters};
use crate::error::{CounterError, QueryError};
use crate::system::source::run_command;

pub struct Platform;

const PROC_STAT: &str = "/proc/stat";
const CACHE_DIR: &str = "/sys/devices/system/cpu/cpu0/cache";
const CONTEXT_SWITCH_WINDOW: Duration = Duration::from_secs(1);

impl PlatformCounters for Platform {
    fn cpu_times() -> Result<CpuTimes, CounterError> {
        let contents =
            std::fs::read_to_string(PROC_STAT).map_err(|e| CounterError::from_io(&e))?;
        parse_cpu_line(&contents)
    }
}

/// Maps the aggregate `cpu` line onto idle/kernel/user, with kernel
/// covering idle the way `GetSystemTimes` reports it.
fn parse_cpu_line(stat: &str) -> Result<CpuTimes, CounterError> {
    let line = stat
        .lines()
        .find(|l| l.starts_with("cpu "))
        .ok_or_else(|| CounterError::Malformed("no aggregate cpu line".to_string()))?;

    // user nice system idle iowait irq softirq [steal guest guest_nice]
    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .map(|f| f.parse::<u64>())
        .collect::<Result<_, _>>()
        .map_err(|e| CounterError::Malformed(format!("bad cpu field: {e}")))?;
    if fields.len() < 7 {
        return Err(CounterError::Malformed(format!(
            "expected at least 7 cpu fields, got {}",
            fields.len()
        )));
    }

    let user = fields[0].saturating_add(fields[1]);
    let idle = fields[3].saturating_add(fields[4]);
    let kernel = fields[2]
        .saturating_add(fields[5])
        .saturating_add(fields[6])
        .saturating_add(idle);
    Ok(CpuTimes { idle, kernel, user })
}

fn parse_context_switches(stat: &str) -> Option<u64> {
    stat.lines()
        .find_map(|l| l.strip_prefix("ctxt "))
        .and_then(|v| v.trim().parse().ok())
}

/// Cache size strings in sysfs look like `32K` or `8192K`.
fn parse_cache_size_kb(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if let Some(kb) = raw.strip_suffix('K') {
        kb.parse().ok()
    } else if let Some(mb) = raw.strip_suffix('M') {
        mb.parse::<u32>().ok().map(|m| m * 1024)
    } else {
        raw.parse::<u32>().ok().map(|b| b / 1024)
    }
}

fn read_trimmed(path: &Path) -> Option<String> {
    std::fs::read_to_string(path).ok().map(|s| s.trim().to_string())
}

/// (level, kb) for every data or unified cache visible to cpu0.
fn cache_levels(dir: &Path) -> Vec<(u8, u32)> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let Some(kind) = read_trimmed(&path.join("type")) else {
            continue;
        };
        if kind == "Instruction" {
            continue;
        }
        let level = read_trimmed(&path.join("level")).and_then(|l| l.parse().ok());
        let size = read_trimmed(&path.join("size")).and_then(|s| parse_cache_size_kb(&s));
        if let (Some(level), Some(size)) = (level, size) {
            out.push((level, size));
        }
    }
    out.sort_unstable();
    out
}

/// sysfs reads and the sysinfo refresh block, so they run off the runtime.
pub async fn query_static_facts() -> Result<String, QueryError> {
    tokio::task::spawn_blocking(collect_static_facts)
        .await
        .map_err(|e| QueryError::Io(std::io::Error::other(e)))
}

fn collect_static_facts() -> String {
    let caches = cache_levels(Path::new(CACHE_DIR));

    let mut sys = System::new();
    sys.refresh_cpu_all();
    let logical = sys.cpus().len();
    let physical = System::physical_core_count();

    let mut out = String::new();
    for (level, label) in [(1u8, "L1CacheSize"), (2, "L2CacheSize"), (3, "L3CacheSize")] {
        if let Some((_, kb)) = caches.iter().find(|(l, _)| *l == level) {
            out.push_str(&format!("{label} : {kb}\n"));
        }
    }
    if let Some(physical) = physical {
        out.push_str(&format!("NumberOfCores : {physical}\n"));
    }
    if logical > 0 {
        out.push_str(&format!("NumberOfLogicalProcessors : {logical}\n"));
    }
    out
}

pub async fn query_l1_cache() -> Result<String, QueryError> {
    let raw = run_command("getconf", &["LEVEL1_DCACHE_SIZE"]).await?;
    let bytes: u64 = raw
        .trim()
        .parse()
        .map_err(|_| QueryError::ParseMismatch("LEVEL1_DCACHE_SIZE"))?;
    if bytes == 0 {
        return Err(QueryError::ParseMismatch("LEVEL1_DCACHE_SIZE"));
    }
    Ok(format!("L1CacheSize\n{}\n", bytes / 1024))
}

pub async fn query_context_switches() -> Result<String, QueryError> {
    let before = tokio::fs::read_to_string(PROC_STAT).await?;
    let started = tokio::time::Instant::now();
    tokio::time::sleep(CONTEXT_SWITCH_WINDOW).await;
    let after = tokio::fs::read_to_string(PROC_STAT).await?;
    let elapsed = started.elapsed().as_secs_f64();

    let (Some(a), Some(b)) = (parse_context_switches(&before), parse_context_switches(&after))
    else {
        return Err(QueryError::ParseMismatch("ctxt"));
    };
    let rate = if elapsed > 0.0 {
        b.saturating_sub(a) as f64 / elapsed
    } else {
        0.0
    };
    Ok(format!("CookedValue : {rate:.3}\n"))
}

pub async fn query_processes() -> Result<String, QueryError> {
    run_command("ps", &["-eo", "comm,pid,pcpu", "--sort=-pcpu"]).await
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAT: &str = "cpu  100 5 50 1000 20 3 2 0 0 0\n\
                        cpu0 50 2 25 500 10 1 1 0 0 0\n\
                        intr 12345\n\
                        ctxt 987654\n";

    #[test]
    fn cpu_line_maps_to_kernel_including_idle() {
        let times = parse_cpu_line(STAT).unwrap();
        assert_eq!(times.user, 105);
        assert_eq!(times.idle, 1020);
        assert_eq!(times.kernel, 50 + 3 + 2 + 1020);
    }

    #[test]
    fn short_cpu_line_is_malformed() {
        let err = parse_cpu_line("cpu  1 2 3\n").unwrap_err();
        assert!(matches!(err, CounterError::Malformed(_)));
    }

    #[test]
    fn context_switch_counter_parsed() {
        assert_eq!(parse_context_switches(STAT), Some(987_654));
        assert_eq!(parse_context_switches("cpu 1 2\n"), None);
    }

    #[test]
    fn sysfs_cache_sizes() {
        assert_eq!(parse_cache_size_kb("32K"), Some(32));
        assert_eq!(parse_cache_size_kb("16M\n"), Some(16384));
        assert_eq!(parse_cache_size_kb("junk"), None);
    }

    #[tokio::test]
    async fn static_facts_are_labeled_lines() {
        let raw = query_static_facts().await.unwrap();
        let labels = [
            "L1CacheSize",
            "L2CacheSize",
            "L3CacheSize",
            "NumberOfCores",
            "NumberOfLogicalProcessors",
        ];
        for line in raw.lines() {
            let (label, value) = line.split_once(" : ").unwrap();
            assert!(labels.contains(&label), "unexpected label {label}");
            assert!(value.parse::<u32>().is_ok(), "bad value in {line}");
        }
        assert!(raw.contains("NumberOfLogicalProcessors : "));
    }
}
