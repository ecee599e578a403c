use tokio::time::Instant;

use super::platform::{self, CpuTimes};
use crate::error::CounterError;

/// One read of the cumulative idle/kernel/user tick counters.
///
/// `kernel` includes idle time, the same way the OS reports it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CounterSample {
    pub idle: u64,
    pub kernel: u64,
    pub user: u64,
    pub taken_at: Instant,
}

impl CounterSample {
    pub fn new(times: CpuTimes, taken_at: Instant) -> Self {
        CounterSample {
            idle: times.idle,
            kernel: times.kernel,
            user: times.user,
            taken_at,
        }
    }
}

pub trait CounterSampler: Send {
    /// Reads the counters now. Callable back-to-back; pacing belongs to the caller.
    fn sample(&mut self) -> Result<CounterSample, CounterError>;
}

/// Reads the host's counters through the platform layer.
#[derive(Debug, Default)]
pub struct OsCounterSampler;

impl CounterSampler for OsCounterSampler {
    fn sample(&mut self) -> Result<CounterSample, CounterError> {
        let times = platform::cpu_times()?;
        Ok(CounterSample::new(times, Instant::now()))
    }
}
