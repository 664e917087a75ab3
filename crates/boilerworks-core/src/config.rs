//! Machine configuration, passed at construction instead of read from a
//! global mid-algorithm.

use crate::fixed::Fixed64;

/// Options the engine consults at construction and tick time.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MachineConfig {
    /// Whether maintenance problems affect machines at all.
    pub maintenance_enabled: bool,
    /// Output penalty per unresolved maintenance problem, as a fraction
    /// of maximum heat. 0.1 means each problem caps effective heat 10%
    /// lower.
    pub maintenance_penalty_per_problem: Fixed64,
    /// Floor for throttled power. A throttled machine never applies less
    /// than this per tick.
    pub minimum_applied_power: i64,
    /// Forwarded to the presenter; the core itself plays no sounds.
    pub machine_sounds_enabled: bool,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            maintenance_enabled: true,
            maintenance_penalty_per_problem: Fixed64::from_num(0.1),
            minimum_applied_power: 25,
            machine_sounds_enabled: true,
        }
    }
}
