use serde::Serialize;

use super::delta::UtilizationResult;
use super::dynamic::DynamicMetrics;
use super::facts::StaticFacts;

/// Everything one report cycle renders. Built once per cycle, then dropped.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Snapshot {
    pub utilization: UtilizationResult,
    pub facts: StaticFacts,
    pub dynamic: DynamicMetrics,
}
