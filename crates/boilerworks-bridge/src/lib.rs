//! Packetized power bridge between the native energy system and a
//! foreign continuous-unit grid.
//!
//! The native side moves energy in *packets*: a rate (units per packet)
//! and a count per tick. The foreign side accepts arbitrary amounts up
//! to its own limits. The bridge converts between them at a fixed
//! integer ratio and keeps one persistent shortfall buffer so that
//! reporting whole packets to the native network never creates or
//! destroys energy: whatever the foreign side did not take out of the
//! last reported packet is offered first on the next tick.
//!
//! # Design
//!
//! - All probing goes through the foreign side's simulate-then-commit
//!   contract; nothing is committed unless the probe confirmed it.
//! - The buffer is in foreign units and is strictly smaller than one
//!   packet after every call.
//! - Recipe-energy accounting does not apply to a pass-through bridge;
//!   asking for it is a wiring error and fails loudly.

use boilerworks_core::container::{Action, EnergyStorage};
use boilerworks_core::error::CoreError;
use boilerworks_core::serialize::{self, DeserializeError, SerializeError};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Native-side store
// ---------------------------------------------------------------------------

/// The native energy store behind the bridge. Accepts arbitrary signed
/// deltas, so the foreign-to-native direction needs no buffering.
pub trait NativeStore {
    fn stored(&self) -> u64;
    fn capacity(&self) -> u64;

    /// Apply a signed delta, clamped to `[0, capacity]`. Returns the
    /// delta actually applied.
    fn change(&mut self, delta: i64) -> i64;
}

/// A plain in-memory native store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeBuffer {
    stored: u64,
    capacity: u64,
}

impl NativeBuffer {
    pub fn new(capacity: u64) -> Self {
        Self {
            stored: 0,
            capacity,
        }
    }
}

impl NativeStore for NativeBuffer {
    fn stored(&self) -> u64 {
        self.stored
    }

    fn capacity(&self) -> u64 {
        self.capacity
    }

    fn change(&mut self, delta: i64) -> i64 {
        let applied = if delta >= 0 {
            (delta as u64).min(self.capacity - self.stored) as i64
        } else {
            -((delta.unsigned_abs()).min(self.stored) as i64)
        };
        self.stored = (self.stored as i64 + applied) as u64;
        applied
    }
}

// ---------------------------------------------------------------------------
// Packet bridge
// ---------------------------------------------------------------------------

/// Persisted bridge state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeSnapshot {
    pub buffered: u64,
}

/// Converts native energy packets into foreign units and back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketBridge {
    /// Foreign units per native unit.
    ratio: u64,
    /// Foreign-unit shortfall from the last ragged acceptance. Invariant:
    /// strictly less than one packet's foreign size after every call.
    buffered: u64,
}

impl PacketBridge {
    pub fn new(ratio: u64) -> Self {
        assert!(ratio > 0, "conversion ratio must be positive");
        Self { ratio, buffered: 0 }
    }

    pub fn ratio(&self) -> u64 {
        self.ratio
    }

    pub fn buffered(&self) -> u64 {
        self.buffered
    }

    fn to_foreign(&self, native: u64) -> u64 {
        native * self.ratio
    }

    fn to_native(&self, foreign: i64) -> i64 {
        foreign / self.ratio as i64
    }

    /// Push native packets (`rate` units each, `count` offered) into the
    /// foreign store. Returns the number of packets consumed from the
    /// native network's point of view.
    ///
    /// Whole packets are reported even when the foreign side takes a
    /// ragged amount; the unaccepted remainder of the last reported
    /// packet becomes the buffer and is offered alone first next tick.
    /// If the foreign side refuses the buffer outright, nothing is
    /// committed at all.
    pub fn transfer_in(&mut self, rate: u64, count: u64, foreign: &mut dyn EnergyStorage) -> u64 {
        let mut former_buffer = 0;
        if self.buffered > 0 {
            let accepted = foreign.receive(self.buffered, Action::Simulate);
            if accepted == 0 {
                return 0;
            }
            if accepted < self.buffered {
                foreign.receive(accepted, Action::Execute);
                self.buffered -= accepted;
                return 0;
            }
            // Cleared; committed together with the fresh packets below.
            former_buffer = self.buffered;
            self.buffered = 0;
        }

        let packet = self.to_foreign(rate);
        let fresh = packet * count;
        if fresh == 0 {
            if former_buffer > 0 {
                foreign.receive(former_buffer, Action::Execute);
            }
            return 0;
        }

        let consumable = foreign.receive(fresh + former_buffer, Action::Simulate);
        if consumable == 0 {
            return 0;
        }
        let accepted_fresh = consumable - former_buffer;
        if accepted_fresh == 0 {
            foreign.receive(former_buffer, Action::Execute);
            return 0;
        }

        if accepted_fresh == fresh {
            foreign.receive(consumable, Action::Execute);
            return count;
        }
        if accepted_fresh % packet == 0 {
            foreign.receive(consumable, Action::Execute);
            return accepted_fresh / packet;
        }
        let packets = accepted_fresh / packet + 1;
        self.buffered = packet * packets - accepted_fresh;
        debug_assert!(self.buffered < packet);
        foreign.receive(consumable, Action::Execute);
        packets
    }

    /// Foreign-to-native direction: a non-negative delta inserts into
    /// the native store, a negative delta extracts. Returns the foreign
    /// delta actually applied. No buffering: sub-ratio remainders are
    /// simply not moved.
    pub fn change_energy(&self, delta_foreign: i64, native: &mut dyn NativeStore) -> i64 {
        let native_delta = self.to_native(delta_foreign);
        let applied = native.change(native_delta);
        applied * self.ratio as i64
    }

    /// How much the foreign side may push this tick, in foreign units.
    /// Never reports zero: a full store still advertises one unit so
    /// foreign machines keep probing instead of dropping the connection.
    pub fn receivable(&self, native: &dyn NativeStore) -> u64 {
        self.to_foreign((native.capacity() - native.stored()).max(1))
    }

    /// The foreign store's contents expressed in native units. Partial
    /// native units are truncated away, matching the conversion on
    /// extraction.
    pub fn stored(&self, foreign: &dyn EnergyStorage) -> u64 {
        foreign.stored() / self.ratio
    }

    /// The foreign store's capacity expressed in native units.
    pub fn capacity(&self, foreign: &dyn EnergyStorage) -> u64 {
        foreign.capacity() / self.ratio
    }

    /// Per-recipe energy accounting only exists on machine buffers; a
    /// pass-through bridge has no recipe and must not pretend otherwise.
    pub fn recipe_energy(&self) -> Result<u64, CoreError> {
        Err(CoreError::ConfigurationMismatch {
            what: "packet bridge asked for recipe energy",
        })
    }

    // -- persistence --------------------------------------------------------

    pub fn snapshot(&self) -> BridgeSnapshot {
        BridgeSnapshot {
            buffered: self.buffered,
        }
    }

    pub fn restore(&mut self, snap: BridgeSnapshot) {
        self.buffered = snap.buffered;
    }

    pub fn serialize(&self, tick: u64) -> Result<Vec<u8>, SerializeError> {
        serialize::encode(tick, &self.snapshot())
    }

    pub fn deserialize(ratio: u64, data: &[u8]) -> Result<Self, DeserializeError> {
        let (_, snap): (u64, BridgeSnapshot) = serialize::decode(data)?;
        let mut bridge = Self::new(ratio);
        bridge.restore(snap);
        Ok(bridge)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
