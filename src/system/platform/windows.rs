use windows_sys::Win32::Foundation::{FILETIME, GetLastError};
use windows_sys::Win32::System::Threading::GetSystemTimes;

use super::{CpuTimes, PlatformCounters};
use crate::error::{CounterError, QueryError};
use crate::system::source::run_command;

pub struct Platform;

const POWERSHELL: &str = "powershell";

impl PlatformCounters for Platform {
    fn cpu_times() -> Result<CpuTimes, CounterError> {
        let mut idle = FILETIME {
            dwLowDateTime: 0,
            dwHighDateTime: 0,
        };
        let mut kernel = idle;
        let mut user = idle;
        let ok = unsafe { GetSystemTimes(&mut idle, &mut kernel, &mut user) };
        if ok == 0 {
            let code = unsafe { GetLastError() };
            return Err(CounterError::Os { code: code as i32 });
        }
        Ok(CpuTimes {
            idle: filetime_to_u64(idle),
            kernel: filetime_to_u64(kernel),
            user: filetime_to_u64(user),
        })
    }
}

fn filetime_to_u64(ft: FILETIME) -> u64 {
    u64::from(ft.dwLowDateTime) | (u64::from(ft.dwHighDateTime) << 32)
}

async fn powershell(script: &str) -> Result<String, QueryError> {
    run_command(POWERSHELL, &["-NoProfile", "-NonInteractive", "-Command", script]).await
}

pub async fn query_static_facts() -> Result<String, QueryError> {
    powershell(
        "Get-CimInstance Win32_Processor | Format-List \
         L1CacheSize,L2CacheSize,L3CacheSize,NumberOfCores,NumberOfLogicalProcessors",
    )
    .await
}

// Win32_CacheMemory level 3 is the primary (L1) cache. Prints a header
// row, then the size in KB.
const L1_CACHE_SCRIPT: &str = "'MaxCacheSize'; Get-CimInstance Win32_CacheMemory | \
     Where-Object Level -eq 3 | Select-Object -First 1 -ExpandProperty MaxCacheSize";

pub async fn query_l1_cache() -> Result<String, QueryError> {
    powershell(L1_CACHE_SCRIPT).await
}

pub async fn query_context_switches() -> Result<String, QueryError> {
    powershell(
        "Get-Counter '\\System\\Context Switches/sec' | \
         Select-Object -ExpandProperty CounterSamples | Format-List CookedValue",
    )
    .await
}

pub async fn query_processes() -> Result<String, QueryError> {
    powershell(
        "Get-Process | Sort-Object CPU -Descending | \
         Format-Table Name,Id,CPU -AutoSize | Out-String -Width 200",
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::facts::parse_l1_table;

    #[test]
    fn system_times_advance_monotonically() {
        let a = Platform::cpu_times().unwrap();
        let b = Platform::cpu_times().unwrap();
        assert!(b.idle >= a.idle && b.kernel >= a.kernel && b.user >= a.user);
    }

    #[tokio::test]
    async fn l1_query_prints_header_then_size() {
        let raw = query_l1_cache().await.unwrap();
        assert_eq!(raw.lines().next().map(str::trim), Some("MaxCacheSize"));
        // hosts without a level 3 entry print only the header
        match parse_l1_table(&raw) {
            Ok(kb) => assert!(kb > 0),
            Err(err) => assert!(matches!(err, QueryError::ParseMismatch("L1CacheSize"))),
        }
    }
}
