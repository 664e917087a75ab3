//! JSON fuel-table loading (behind the `data-loader` feature).
//!
//! Fuel definitions live in data files, not code: a file declares named
//! flows and items, fuel recipes per class, item burn values, and which
//! items are fluid containers. The loader resolves names to dense ids
//! and builds a [`FuelTable`] plus the name registry the host needs to
//! map its own resources onto those ids.

use crate::recipe::{FlowKind, FuelClass, FuelRecipe, FuelTable, ItemKind};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during fuel data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    #[error("unresolved {expected_kind} reference '{name}'")]
    UnresolvedRef {
        name: String,
        expected_kind: &'static str,
    },

    #[error("duplicate {kind} name '{name}'")]
    DuplicateName { kind: &'static str, name: String },

    #[error("fuel '{name}' has zero amount")]
    ZeroAmount { name: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Data file structs
// ===========================================================================

/// Top-level shape of a fuel data file.
#[derive(Debug, Clone, Deserialize)]
pub struct FuelFileData {
    pub flows: Vec<String>,
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub combustion: Vec<FuelEntryData>,
    #[serde(default)]
    pub semi_fluid: Vec<FuelEntryData>,
    #[serde(default)]
    pub item_fuels: Vec<ItemFuelData>,
    #[serde(default)]
    pub fluid_containers: Vec<String>,
}

/// One fluid fuel entry.
#[derive(Debug, Clone, Deserialize)]
pub struct FuelEntryData {
    pub fluid: String,
    pub amount: u64,
    /// Signed nominal power; generators record consumption as negative.
    pub power: i64,
    pub duration: i64,
}

/// One item fuel entry: `("item_name", burn_value)`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ItemFuelData {
    Short(String, i64),
    Full { item: String, burn_value: i64 },
}

impl ItemFuelData {
    fn parts(&self) -> (&str, i64) {
        match self {
            ItemFuelData::Short(name, v) => (name, *v),
            ItemFuelData::Full { item, burn_value } => (item, *burn_value),
        }
    }
}

// ===========================================================================
// Resolution
// ===========================================================================

/// Resolved fuel data: the table plus the name registries that give the
/// host stable ids for its flows and items.
#[derive(Debug, Clone)]
pub struct FuelData {
    pub table: FuelTable,
    pub flows: HashMap<String, FlowKind>,
    pub items: HashMap<String, ItemKind>,
}

impl FuelData {
    pub fn flow(&self, name: &str) -> Option<FlowKind> {
        self.flows.get(name).copied()
    }

    pub fn item(&self, name: &str) -> Option<ItemKind> {
        self.items.get(name).copied()
    }
}

/// Parse and resolve a fuel data file from a JSON string.
pub fn parse_fuel_data(content: &str) -> Result<FuelData, DataLoadError> {
    let data: FuelFileData = serde_json::from_str(content).map_err(|e| DataLoadError::Parse {
        file: PathBuf::from("<inline>"),
        detail: e.to_string(),
    })?;
    resolve(data)
}

/// Load and resolve a fuel data file from disk.
pub fn load_fuel_data(path: &Path) -> Result<FuelData, DataLoadError> {
    let content = std::fs::read_to_string(path)?;
    let data: FuelFileData = serde_json::from_str(&content).map_err(|e| DataLoadError::Parse {
        file: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    resolve(data)
}

fn resolve(data: FuelFileData) -> Result<FuelData, DataLoadError> {
    let mut flows = HashMap::new();
    for (i, name) in data.flows.iter().enumerate() {
        if flows.insert(name.clone(), FlowKind(i as u32)).is_some() {
            return Err(DataLoadError::DuplicateName {
                kind: "flow",
                name: name.clone(),
            });
        }
    }
    let mut items = HashMap::new();
    for (i, name) in data.items.iter().enumerate() {
        if items.insert(name.clone(), ItemKind(i as u32)).is_some() {
            return Err(DataLoadError::DuplicateName {
                kind: "item",
                name: name.clone(),
            });
        }
    }

    let lookup_flow = |name: &str| {
        flows
            .get(name)
            .copied()
            .ok_or_else(|| DataLoadError::UnresolvedRef {
                name: name.to_string(),
                expected_kind: "flow",
            })
    };
    let lookup_item = |name: &str| {
        items
            .get(name)
            .copied()
            .ok_or_else(|| DataLoadError::UnresolvedRef {
                name: name.to_string(),
                expected_kind: "item",
            })
    };

    let mut table = FuelTable::new();
    for (class, entries) in [
        (FuelClass::Combustion, &data.combustion),
        (FuelClass::SemiFluid, &data.semi_fluid),
    ] {
        for entry in entries {
            if entry.amount == 0 {
                return Err(DataLoadError::ZeroAmount {
                    name: entry.fluid.clone(),
                });
            }
            table.add_fuel(
                class,
                FuelRecipe {
                    fluid: lookup_flow(&entry.fluid)?,
                    amount: entry.amount,
                    power: entry.power,
                    duration: entry.duration,
                },
            );
        }
    }
    for entry in &data.item_fuels {
        let (name, burn_value) = entry.parts();
        table.add_item_fuel(lookup_item(name)?, burn_value);
    }
    for name in &data.fluid_containers {
        table.add_fluid_container(lookup_item(name)?);
    }

    Ok(FuelData {
        table,
        flows,
        items,
    })
}

// ===========================================================================
// Tests
// ===========================================================================
