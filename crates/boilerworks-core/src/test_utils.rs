//! Shared test helpers for integration tests.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these
//! helpers are available in unit tests and, via the `test-utils`
//! feature, in downstream integration-test crates.

use crate::config::MachineConfig;
use crate::engine::{BoilerPolicy, TickInputs, WorkEngine};
use crate::fixed::Ticks;
use crate::recipe::{FlowKind, FuelClass, FuelRecipe, FuelTable, ItemKind};

// ===========================================================================
// Flow and item constructors
// ===========================================================================

pub fn water() -> FlowKind {
    FlowKind(0)
}
pub fn steam() -> FlowKind {
    FlowKind(1)
}
pub fn creosote() -> FlowKind {
    FlowKind(2)
}
pub fn diesel() -> FlowKind {
    FlowKind(3)
}
pub fn heavy_oil() -> FlowKind {
    FlowKind(4)
}

pub fn coal() -> ItemKind {
    ItemKind(0)
}
pub fn charcoal() -> ItemKind {
    ItemKind(1)
}
pub fn creosote_bucket() -> ItemKind {
    ItemKind(2)
}

// ===========================================================================
// Fuel tables
// ===========================================================================

/// A fuel table with one fluid fuel per class and two item fuels,
/// matching common boiler setups.
pub fn standard_fuel_table() -> FuelTable {
    let mut table = FuelTable::new();
    // burn_ticks = 8 * 80 / 8 = 80; combustion halves to 40.
    table.add_fuel(
        FuelClass::Combustion,
        FuelRecipe {
            fluid: creosote(),
            amount: 1,
            power: -8,
            duration: 80,
        },
    );
    table.add_fuel(
        FuelClass::Combustion,
        FuelRecipe {
            fluid: diesel(),
            amount: 1,
            power: -32,
            duration: 50,
        },
    );
    // burn_ticks = 16 * 20 / 8 = 40; semi-fluid doubles to 80.
    table.add_fuel(
        FuelClass::SemiFluid,
        FuelRecipe {
            fluid: heavy_oil(),
            amount: 2,
            power: -16,
            duration: 20,
        },
    );
    // 20 ticks of burn each.
    table.add_item_fuel(coal(), 1600);
    table.add_item_fuel(charcoal(), 1600);
    table.add_item_fuel(creosote_bucket(), 800);
    table.add_fluid_container(creosote_bucket());
    table
}

// ===========================================================================
// Engines
// ===========================================================================

/// A bronze boiler on the standard fuel table, feeding on water and
/// producing steam.
pub fn bronze_boiler() -> WorkEngine<BoilerPolicy> {
    WorkEngine::new(
        BoilerPolicy::bronze(),
        MachineConfig::default(),
        standard_fuel_table(),
        water(),
        steam(),
    )
}

/// Same machine with maintenance disabled, for tests that only care
/// about the quantization math.
pub fn bronze_boiler_no_maintenance() -> WorkEngine<BoilerPolicy> {
    WorkEngine::new(
        BoilerPolicy::bronze(),
        MachineConfig {
            maintenance_enabled: false,
            ..MachineConfig::default()
        },
        standard_fuel_table(),
        water(),
        steam(),
    )
}

/// Default inputs at a given tick.
pub fn inputs_at(tick: Ticks) -> TickInputs {
    TickInputs {
        tick,
        ..TickInputs::default()
    }
}

/// Inputs at a given tick with a throttle applied.
pub fn throttled_at(tick: Ticks, throttle_percent: u32) -> TickInputs {
    TickInputs {
        tick,
        throttle_percent,
        ..TickInputs::default()
    }
}
