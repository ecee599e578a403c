use crate::error::{CounterError, QueryError};

/// Cumulative tick counters since boot. `kernel` includes `idle`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CpuTimes {
    pub idle: u64,
    pub kernel: u64,
    pub user: u64,
}

pub trait PlatformCounters {
    fn cpu_times() -> Result<CpuTimes, CounterError>;
}

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "linux")]
use linux as platform_impl;
#[cfg(target_os = "macos")]
use macos as platform_impl;
#[cfg(target_os = "windows")]
use windows as platform_impl;

pub fn cpu_times() -> Result<CpuTimes, CounterError> {
    <platform_impl::Platform as PlatformCounters>::cpu_times()
}

pub async fn query_static_facts() -> Result<String, QueryError> {
    platform_impl::query_static_facts().await
}

pub async fn query_l1_cache() -> Result<String, QueryError> {
    platform_impl::query_l1_cache().await
}

pub async fn query_context_switches() -> Result<String, QueryError> {
    platform_impl::query_context_switches().await
}

pub async fn query_processes() -> Result<String, QueryError> {
    platform_impl::query_processes().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_times_do_not_panic() {
        if let Ok(times) = cpu_times() {
            assert!(times.kernel >= times.idle);
        }
    }
}
