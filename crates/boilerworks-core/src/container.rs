//! Collaborator container interfaces and in-memory reference impls.
//!
//! All mutating operations take an [`Action`]: a `Simulate` call must
//! report exactly what the matching `Execute` call would do, without
//! mutating anything. The engine and bridge rely on this for their
//! probe-before-commit discipline -- the only transaction mechanism in
//! the system (there is no rollback; an infeasible action is simply
//! never committed).

use crate::recipe::{FlowKind, FlowStack, ItemKind};

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// Whether an operation probes or commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Simulate,
    Execute,
}

impl Action {
    #[inline]
    pub fn executes(self) -> bool {
        matches!(self, Action::Execute)
    }
}

// ---------------------------------------------------------------------------
// Container traits
// ---------------------------------------------------------------------------

/// A container of one flow resource at a time (a tank).
pub trait FlowHandler {
    /// Current contents, if any.
    fn fluid(&self) -> Option<FlowStack>;

    /// Drain up to `max` units of whatever the container holds.
    fn drain(&mut self, max: u64, action: Action) -> Option<FlowStack>;

    /// Drain up to `amount` units of `kind` specifically. Returns the
    /// amount drained (zero if the container holds something else).
    fn drain_kind(&mut self, kind: FlowKind, amount: u64, action: Action) -> u64;

    /// Fill with `stack`, returning the amount accepted.
    fn fill(&mut self, stack: FlowStack, action: Action) -> u64;
}

/// Slot-indexed item storage.
pub trait ItemHandler {
    fn slots(&self) -> usize;

    /// Contents of a slot: kind and count.
    fn stack_in_slot(&self, slot: usize) -> Option<(ItemKind, u32)>;

    /// Remove up to `count` items from a slot. Returns the number removed.
    fn shrink(&mut self, slot: usize, count: u32) -> u32;
}

/// Energy storage on the grid (foreign) side of the power bridge.
pub trait EnergyStorage {
    fn stored(&self) -> u64;
    fn capacity(&self) -> u64;

    /// Accept up to `amount` units. Returns the amount accepted.
    fn receive(&mut self, amount: u64, action: Action) -> u64;

    /// Remove up to `amount` units. Returns the amount removed.
    fn extract(&mut self, amount: u64, action: Action) -> u64;

    fn can_receive(&self) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// FlowTank
// ---------------------------------------------------------------------------

/// A capacity-bounded tank holding one flow kind at a time.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FlowTank {
    kind: Option<FlowKind>,
    amount: u64,
    capacity: u64,
}

impl FlowTank {
    pub fn new(capacity: u64) -> Self {
        Self {
            kind: None,
            amount: 0,
            capacity,
        }
    }

    pub fn with_fluid(capacity: u64, kind: FlowKind, amount: u64) -> Self {
        debug_assert!(amount <= capacity);
        Self {
            kind: Some(kind),
            amount,
            capacity,
        }
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }
}

impl FlowHandler for FlowTank {
    fn fluid(&self) -> Option<FlowStack> {
        self.kind.map(|kind| FlowStack {
            kind,
            amount: self.amount,
        })
    }

    fn drain(&mut self, max: u64, action: Action) -> Option<FlowStack> {
        let kind = self.kind?;
        let drained = self.amount.min(max);
        if drained == 0 {
            return None;
        }
        if action.executes() {
            self.amount -= drained;
            if self.amount == 0 {
                self.kind = None;
            }
        }
        Some(FlowStack {
            kind,
            amount: drained,
        })
    }

    fn drain_kind(&mut self, kind: FlowKind, amount: u64, action: Action) -> u64 {
        if self.kind != Some(kind) {
            return 0;
        }
        let drained = self.amount.min(amount);
        if action.executes() {
            self.amount -= drained;
            if self.amount == 0 {
                self.kind = None;
            }
        }
        drained
    }

    fn fill(&mut self, stack: FlowStack, action: Action) -> u64 {
        if let Some(kind) = self.kind
            && kind != stack.kind
        {
            return 0;
        }
        let accepted = stack.amount.min(self.capacity - self.amount);
        if accepted > 0 && action.executes() {
            self.kind = Some(stack.kind);
            self.amount += accepted;
        }
        accepted
    }
}

// ---------------------------------------------------------------------------
// ItemSlots
// ---------------------------------------------------------------------------

/// A fixed-size bank of item slots.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ItemSlots {
    slots: Vec<Option<(ItemKind, u32)>>,
}

impl ItemSlots {
    pub fn new(count: usize) -> Self {
        Self {
            slots: vec![None; count],
        }
    }

    /// Put a stack into a slot, replacing its contents.
    pub fn set(&mut self, slot: usize, item: ItemKind, count: u32) {
        self.slots[slot] = if count > 0 { Some((item, count)) } else { None };
    }

    /// Total count of `item` across all slots.
    pub fn count_of(&self, item: ItemKind) -> u32 {
        self.slots
            .iter()
            .flatten()
            .filter(|(kind, _)| *kind == item)
            .map(|(_, n)| *n)
            .sum()
    }
}

impl ItemHandler for ItemSlots {
    fn slots(&self) -> usize {
        self.slots.len()
    }

    fn stack_in_slot(&self, slot: usize) -> Option<(ItemKind, u32)> {
        self.slots.get(slot).copied().flatten()
    }

    fn shrink(&mut self, slot: usize, count: u32) -> u32 {
        match self.slots.get_mut(slot) {
            Some(Some((_, n))) => {
                let removed = count.min(*n);
                *n -= removed;
                if *n == 0 {
                    self.slots[slot] = None;
                }
                removed
            }
            _ => 0,
        }
    }
}

// ---------------------------------------------------------------------------
// EnergyBuffer
// ---------------------------------------------------------------------------

/// Grid-side energy storage with an optional per-call intake limit,
/// mimicking machines that cap how much they accept per transfer.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EnergyBuffer {
    stored: u64,
    capacity: u64,
    /// Per-call acceptance cap; `None` means only capacity limits intake.
    max_receive: Option<u64>,
}

impl EnergyBuffer {
    pub fn new(capacity: u64) -> Self {
        Self {
            stored: 0,
            capacity,
            max_receive: None,
        }
    }

    pub fn with_receive_limit(capacity: u64, max_receive: u64) -> Self {
        Self {
            stored: 0,
            capacity,
            max_receive: Some(max_receive),
        }
    }
}

impl EnergyStorage for EnergyBuffer {
    fn stored(&self) -> u64 {
        self.stored
    }

    fn capacity(&self) -> u64 {
        self.capacity
    }

    fn receive(&mut self, amount: u64, action: Action) -> u64 {
        let capped = match self.max_receive {
            Some(limit) => amount.min(limit),
            None => amount,
        };
        let accepted = capped.min(self.capacity - self.stored);
        if action.executes() {
            self.stored += accepted;
        }
        accepted
    }

    fn extract(&mut self, amount: u64, action: Action) -> u64 {
        let removed = amount.min(self.stored);
        if action.executes() {
            self.stored -= removed;
        }
        removed
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const WATER: FlowKind = FlowKind(0);
    const STEAM: FlowKind = FlowKind(1);

    // -----------------------------------------------------------------------
    // Test 1: simulate never mutates, and matches execute exactly
    // -----------------------------------------------------------------------
    #[test]
    fn tank_simulate_matches_execute() {
        let mut tank = FlowTank::with_fluid(1000, WATER, 300);

        let probed = tank.drain_kind(WATER, 500, Action::Simulate);
        assert_eq!(probed, 300);
        assert_eq!(tank.amount(), 300, "simulate must not mutate");

        let drained = tank.drain_kind(WATER, 500, Action::Execute);
        assert_eq!(drained, probed);
        assert_eq!(tank.amount(), 0);
        assert!(tank.fluid().is_none(), "empty tank forgets its kind");
    }

    // -----------------------------------------------------------------------
    // Test 2: tank rejects mismatched fluid
    // -----------------------------------------------------------------------
    #[test]
    fn tank_rejects_other_kind() {
        let mut tank = FlowTank::with_fluid(1000, WATER, 300);
        assert_eq!(tank.drain_kind(STEAM, 100, Action::Execute), 0);
        assert_eq!(
            tank.fill(
                FlowStack {
                    kind: STEAM,
                    amount: 100
                },
                Action::Execute
            ),
            0
        );
        assert_eq!(tank.amount(), 300);
    }

    // -----------------------------------------------------------------------
    // Test 3: fill respects capacity
    // -----------------------------------------------------------------------
    #[test]
    fn tank_fill_respects_capacity() {
        let mut tank = FlowTank::new(100);
        let accepted = tank.fill(
            FlowStack {
                kind: STEAM,
                amount: 250,
            },
            Action::Execute,
        );
        assert_eq!(accepted, 100);
        assert_eq!(tank.amount(), 100);
    }

    // -----------------------------------------------------------------------
    // Test 4: item slots shrink and clear
    // -----------------------------------------------------------------------
    #[test]
    fn item_slots_shrink() {
        let coal = ItemKind(0);
        let mut slots = ItemSlots::new(2);
        slots.set(0, coal, 3);

        assert_eq!(slots.shrink(0, 1), 1);
        assert_eq!(slots.stack_in_slot(0), Some((coal, 2)));
        assert_eq!(slots.shrink(0, 5), 2);
        assert_eq!(slots.stack_in_slot(0), None);
        assert_eq!(slots.shrink(1, 1), 0, "empty slot shrinks nothing");
    }

    // -----------------------------------------------------------------------
    // Test 5: energy buffer receive limit
    // -----------------------------------------------------------------------
    #[test]
    fn energy_buffer_receive_limit() {
        let mut buf = EnergyBuffer::with_receive_limit(1000, 64);
        assert_eq!(buf.receive(500, Action::Simulate), 64);
        assert_eq!(buf.stored(), 0);
        assert_eq!(buf.receive(500, Action::Execute), 64);
        assert_eq!(buf.stored(), 64);
    }

    // -----------------------------------------------------------------------
    // Test 6: energy buffer extract clamps to stored
    // -----------------------------------------------------------------------
    #[test]
    fn energy_buffer_extract_clamps() {
        let mut buf = EnergyBuffer::new(1000);
        buf.receive(100, Action::Execute);
        assert_eq!(buf.extract(250, Action::Execute), 100);
        assert_eq!(buf.stored(), 0);
    }
}
