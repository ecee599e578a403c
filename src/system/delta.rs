use serde::Serialize;

use super::counters::CounterSample;

/// CPU utilization over the window between two counter samples, in percent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct UtilizationResult {
    pub total: f64,
    pub kernel_pct: f64,
    pub user_pct: f64,
}

impl UtilizationResult {
    pub const ZERO: UtilizationResult = UtilizationResult {
        total: 0.0,
        kernel_pct: 0.0,
        user_pct: 0.0,
    };
}

/// Per-category tick deltas. A counter that went backwards (reset or wrap)
/// contributes zero instead of underflowing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickDeltas {
    pub idle: u64,
    pub kernel: u64,
    pub user: u64,
}

impl TickDeltas {
    pub fn between(a: &CounterSample, b: &CounterSample) -> Self {
        TickDeltas {
            idle: b.idle.saturating_sub(a.idle),
            kernel: b.kernel.saturating_sub(a.kernel),
            user: b.user.saturating_sub(a.user),
        }
    }

    /// Kernel ticks minus the idle ticks the kernel figure includes.
    pub fn busy_kernel(&self) -> u64 {
        self.kernel.saturating_sub(self.idle)
    }

    pub fn total(&self) -> u128 {
        u128::from(self.kernel) + u128::from(self.user)
    }
}

pub fn compute_utilization(a: &CounterSample, b: &CounterSample) -> UtilizationResult {
    if b.taken_at <= a.taken_at {
        return UtilizationResult::ZERO;
    }

    let deltas = TickDeltas::between(a, b);
    let total_delta = deltas.total();
    if total_delta == 0 {
        return UtilizationResult::ZERO;
    }

    let busy_kernel = u128::from(deltas.busy_kernel());
    let user = u128::from(deltas.user);
    let percent = |part: u128| ((part * 100) as f64 / total_delta as f64).clamp(0.0, 100.0);

    UtilizationResult {
        total: percent(busy_kernel + user),
        kernel_pct: percent(busy_kernel),
        user_pct: percent(user),
    }
}
