//! Fuel recipe definitions.
//!
//! Recipes are immutable values looked up by the engine during its search
//! phase; the engine never owns them. Fluid fuels come in two classes
//! with different burn characteristics, and both demand a minimum batch
//! multiple so integer division over the batch cannot starve a burn.

use std::collections::{HashMap, HashSet};

// ---------------------------------------------------------------------------
// Resource identifiers
// ---------------------------------------------------------------------------

/// Identifies a flow (fluid-like) resource. Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct FlowKind(pub u32);

/// Identifies a discrete item resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ItemKind(pub u32);

/// A quantity of one flow resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FlowStack {
    pub kind: FlowKind,
    pub amount: u64,
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Fluid fuel is committed in batches of this many nominal recipe inputs.
/// Burning one nominal input at a time would lose most of its value to
/// integer division; a candidate tank must cover the whole batch.
pub const BATCH_MULTIPLE: u64 = 100;

/// Divisor converting a fluid recipe's power-time product into burn ticks,
/// already accounting for the batch multiple.
pub const FLOW_BURN_DIVISOR: i64 = 8;

/// Burn units per tick of progress for discrete item fuel.
pub const BURN_UNITS_PER_TICK: i64 = 80;

// ---------------------------------------------------------------------------
// Fuel classes
// ---------------------------------------------------------------------------

/// The recognized classes of fluid fuel, in search priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum FuelClass {
    /// Light fuels: higher throughput, half burn time.
    Combustion,
    /// Dense fuels: double burn time.
    SemiFluid,
}

impl FuelClass {
    /// All classes, in the order the search phase probes them.
    pub const ALL: [FuelClass; 2] = [FuelClass::Combustion, FuelClass::SemiFluid];

    /// Apply the class-specific burn scale.
    pub fn scale_burn(self, burn_ticks: i64) -> i64 {
        match self {
            FuelClass::Combustion => burn_ticks / 2,
            FuelClass::SemiFluid => burn_ticks * 2,
        }
    }
}

// ---------------------------------------------------------------------------
// Fuel recipes
// ---------------------------------------------------------------------------

/// One fluid fuel recipe: burning `amount` of `fluid` yields `power` per
/// tick for `duration` ticks in the machine class the recipe belongs to.
/// Negative `power` means the recipe consumes rather than produces.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FuelRecipe {
    pub fluid: FlowKind,
    pub amount: u64,
    pub power: i64,
    pub duration: i64,
}

impl FuelRecipe {
    /// Burn ticks for one batched commit of this recipe, before the
    /// class scale and any machine-specific runtime boost.
    pub fn burn_ticks(&self) -> i64 {
        self.power.abs() * self.duration / FLOW_BURN_DIVISOR
    }
}

// ---------------------------------------------------------------------------
// Fuel table
// ---------------------------------------------------------------------------

/// Lookup table for everything the search phase can burn.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct FuelTable {
    combustion: Vec<FuelRecipe>,
    semi_fluid: Vec<FuelRecipe>,
    /// Burn value (in burn units, [`BURN_UNITS_PER_TICK`] per tick) per item.
    item_burn_values: HashMap<ItemKind, i64>,
    /// Items that are fluid containers. Never burned directly even if a
    /// burn value is registered for them.
    fluid_containers: HashSet<ItemKind>,
}

impl FuelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fluid fuel recipe under a class.
    pub fn add_fuel(&mut self, class: FuelClass, recipe: FuelRecipe) {
        match class {
            FuelClass::Combustion => self.combustion.push(recipe),
            FuelClass::SemiFluid => self.semi_fluid.push(recipe),
        }
    }

    /// Register an item fuel with its burn value.
    pub fn add_item_fuel(&mut self, item: ItemKind, burn_value: i64) {
        self.item_burn_values.insert(item, burn_value);
    }

    /// Mark an item as a fluid container (excluded from item-fuel burns).
    pub fn add_fluid_container(&mut self, item: ItemKind) {
        self.fluid_containers.insert(item);
    }

    /// First recipe of `class` burning `fluid`, if any.
    pub fn find(&self, class: FuelClass, fluid: FlowKind) -> Option<&FuelRecipe> {
        let recipes = match class {
            FuelClass::Combustion => &self.combustion,
            FuelClass::SemiFluid => &self.semi_fluid,
        };
        recipes.iter().find(|r| r.fluid == fluid)
    }

    /// Burn value for an item, zero if unknown.
    pub fn burn_value(&self, item: ItemKind) -> i64 {
        self.item_burn_values.get(&item).copied().unwrap_or(0)
    }

    pub fn is_fluid_container(&self, item: ItemKind) -> bool {
        self.fluid_containers.contains(&item)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
