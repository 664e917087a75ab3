//! Machine events for the external presenter.
//!
//! The core mutates its own state and reports what changed; rendering,
//! sound, and particle effects all live outside. Events fire on
//! *transitions* only -- an engine that stays active, or whose heat holds
//! steady, emits nothing for that aspect.

use crate::fixed::Ticks;
use crate::recipe::{FlowKind, ItemKind};

/// A discrete observable change. All events carry the tick they occurred on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MachineEvent {
    /// The active flag toggled. Suppressed exactly once when a recipe
    /// completes and a new one starts on the following search, so the
    /// presenter sees no flicker.
    ActiveChanged { active: bool, tick: Ticks },

    /// The heat accumulator changed (one unit per tick, either way).
    HeatChanged { heat: i64, tick: Ticks },

    /// Output produced this tick changed from the previous value.
    OutputChanged { amount: i64, tick: Ticks },

    /// A batch of fluid fuel was committed at the start of an activation.
    FluidFuelConsumed {
        fluid: FlowKind,
        amount: u64,
        tick: Ticks,
    },

    /// One item of fuel was committed at the start of an activation.
    ItemFuelConsumed { item: ItemKind, tick: Ticks },

    /// The feed flow fell short mid-run. Terminal for this engine until
    /// an external reset; the presenter decides how destructive the
    /// failure looks based on `severity`.
    CatastrophicFailure { severity: u32, tick: Ticks },
}
