//! The recipe progress engine.
//!
//! One [`WorkEngine`] owns exactly one [`WorkUnit`] and is ticked once
//! per simulation step by the host. Each tick it either searches for a
//! runnable fuel, advances the active burn, or decays idle heat. All
//! quantization goes through [`crate::carry`] so the three remainders in
//! the work unit fully account for every truncation.
//!
//! Machine variants are strategy compositions over [`MachinePolicy`],
//! not subclasses: the policy supplies the nominal output rate, heat
//! ceiling, runtime boost, and failure-severity formula.

use crate::carry;
use crate::config::MachineConfig;
use crate::container::{Action, FlowHandler, ItemHandler};
use crate::error::CoreError;
use crate::event::MachineEvent;
use crate::fixed::{Fixed64, Ticks};
use crate::recipe::{
    BATCH_MULTIPLE, BURN_UNITS_PER_TICK, FlowKind, FlowStack, FuelClass, FuelTable,
};

// ---------------------------------------------------------------------------
// Work state
// ---------------------------------------------------------------------------

/// Lifecycle of the engine's single unit of work.
///
/// `Searching` and `Completing` are transient within one tick: a
/// successful search ends the tick in `Running`, and the completing tick
/// ends in `Idle` (possibly `Running` again if the follow-up search
/// finds fuel). `Failed` is terminal until [`WorkEngine::reset`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum WorkState {
    #[default]
    Idle,
    Searching,
    Running,
    Completing,
    Failed,
}

// ---------------------------------------------------------------------------
// Work unit
// ---------------------------------------------------------------------------

/// Owned state of one engine instance.
///
/// Invariants: `0 <= progress <= target_duration` between ticks;
/// `target_duration == 0` iff `Idle` or `Failed`; every `excess_*`
/// carry lies in `[0, divisor)` for its divisor.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct WorkUnit {
    pub state: WorkState,
    /// Ticks elapsed in the current activation.
    pub progress: i64,
    /// Throttle-adjusted duration of the current activation.
    pub target_duration: i64,
    /// Throttle-adjusted output per running tick (at full heat).
    pub applied_power: i64,
    /// Item-fuel burn remainder, in `[0, BURN_UNITS_PER_TICK)`.
    pub excess_flow_units: i64,
    /// Feed-dose remainder, in `[0, dose_size)`.
    pub excess_dose_units: i64,
    /// Throttle power-time remainder, in `[0, applied_power)`.
    pub excess_power_time_units: i64,
    /// Auxiliary accumulator: rises one per running tick, decays one per
    /// suspended tick, scales output toward nominal.
    pub heat: i64,
    /// Output committed last tick, for telemetry.
    pub last_output: i64,
    /// Externally visible running flag.
    pub active: bool,
    /// Set on completion; suppresses exactly one active-flag toggle so an
    /// immediate re-activation does not flicker.
    was_active_and_needs_update: bool,
}

/// Minimal state persisted across save/load; enough to resume a burn.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct WorkSnapshot {
    pub progress: i64,
    pub target_duration: i64,
    pub applied_power: i64,
    pub excess_flow_units: i64,
    pub excess_dose_units: i64,
    pub excess_power_time_units: i64,
    pub heat: i64,
}

// ---------------------------------------------------------------------------
// Machine policy
// ---------------------------------------------------------------------------

/// Variant-specific strategy hooks. One fixed per-tick contract, many
/// machine flavors.
pub trait MachinePolicy {
    /// Nominal output units per running tick, before throttle and heat.
    fn power_per_tick(&self) -> i64;

    /// Ticks from cold start to full heat; also the heat ceiling.
    fn max_heat(&self) -> i64;

    /// Output units covered by one dose of the feed flow.
    fn dose_size(&self) -> i64 {
        160
    }

    /// Machine-specific burn time scaling (fuel efficiency).
    fn runtime_boost(&self, burn_ticks: i64) -> i64 {
        burn_ticks
    }

    /// Severity of a mid-run feed shortfall. Scales with how hot the
    /// machine ran and how badly the feed fell short.
    fn failure_severity(&self, heat: i64, max_heat: i64, shortfall: i64, required: i64) -> u32 {
        let base = 8 * heat / max_heat.max(1);
        (base * shortfall / required.max(1)).max(1) as u32
    }
}

/// The shipped policy: tiered boilers turning fuel heat into steam.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BoilerPolicy {
    /// Steam units produced per tick at full heat, before throttle.
    pub steam_per_tick: i64,
    /// Ticks from cold to boiling.
    pub ticks_to_boiling: i64,
    /// Fuel runtime multiplier in percent (tiers trade speed for
    /// efficiency).
    pub runtime_boost_percent: u32,
}

impl BoilerPolicy {
    pub fn bronze() -> Self {
        Self {
            steam_per_tick: 800,
            ticks_to_boiling: 800,
            runtime_boost_percent: 150,
        }
    }

    pub fn steel() -> Self {
        Self {
            steam_per_tick: 1800,
            ticks_to_boiling: 1000,
            runtime_boost_percent: 100,
        }
    }

    pub fn titanium() -> Self {
        Self {
            steam_per_tick: 3200,
            ticks_to_boiling: 1500,
            runtime_boost_percent: 70,
        }
    }
}

impl MachinePolicy for BoilerPolicy {
    fn power_per_tick(&self) -> i64 {
        self.steam_per_tick
    }

    fn max_heat(&self) -> i64 {
        self.ticks_to_boiling
    }

    fn runtime_boost(&self, burn_ticks: i64) -> i64 {
        burn_ticks * self.runtime_boost_percent as i64 / 100
    }
}

// ---------------------------------------------------------------------------
// Tick inputs
// ---------------------------------------------------------------------------

/// Host-provided facts for one tick.
#[derive(Debug, Clone, Copy)]
pub struct TickInputs {
    /// Throttle in percent, 1..=100.
    pub throttle_percent: u32,
    /// Unresolved maintenance problems on the hosting structure.
    pub maintenance_problems: u32,
    /// Whether the host allows work at all.
    pub enabled: bool,
    /// Whether the hosting structure is blocked (e.g. obstructed).
    pub obstructed: bool,
    pub tick: Ticks,
}

impl Default for TickInputs {
    fn default() -> Self {
        Self {
            throttle_percent: 100,
            maintenance_problems: 0,
            enabled: true,
            obstructed: false,
            tick: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Work engine
// ---------------------------------------------------------------------------

/// The per-tick recipe state machine. Generic over the machine variant.
#[derive(Debug, Clone)]
pub struct WorkEngine<P: MachinePolicy> {
    policy: P,
    config: MachineConfig,
    fuel_table: FuelTable,
    /// Companion flow consumed in proportion to output (e.g. water).
    feed_kind: FlowKind,
    /// Flow produced each running tick (e.g. steam).
    output_kind: FlowKind,
    unit: WorkUnit,
}

impl<P: MachinePolicy> WorkEngine<P> {
    pub fn new(
        policy: P,
        config: MachineConfig,
        fuel_table: FuelTable,
        feed_kind: FlowKind,
        output_kind: FlowKind,
    ) -> Self {
        Self {
            policy,
            config,
            fuel_table,
            feed_kind,
            output_kind,
            unit: WorkUnit::default(),
        }
    }

    pub fn unit(&self) -> &WorkUnit {
        &self.unit
    }

    pub fn state(&self) -> WorkState {
        self.unit.state
    }

    pub fn is_active(&self) -> bool {
        self.unit.active
    }

    pub fn heat(&self) -> i64 {
        self.unit.heat
    }

    /// Heat as a 0..=100 percentage for telemetry.
    pub fn heat_scaled(&self) -> u32 {
        (self.unit.heat * 100 / self.policy.max_heat().max(1)) as u32
    }

    pub fn last_output(&self) -> i64 {
        self.unit.last_output
    }

    /// Advance one tick. Returns the transition events for the presenter.
    pub fn tick(
        &mut self,
        fuel_tanks: &mut [&mut dyn FlowHandler],
        feed_tank: &mut dyn FlowHandler,
        output_tank: &mut dyn FlowHandler,
        fuel_slots: &mut dyn ItemHandler,
        inputs: TickInputs,
    ) -> Vec<MachineEvent> {
        let mut events = Vec::new();
        let halted =
            !inputs.enabled || inputs.obstructed || self.unit.state == WorkState::Failed;

        // Suspended or idle machines cool off.
        if (halted || !self.unit.active) && self.unit.heat > 0 {
            self.set_heat(self.unit.heat - 1, inputs.tick, &mut events);
            self.set_last_output(0, inputs.tick, &mut events);
        }
        if halted {
            return events;
        }

        if self.unit.progress > 0 {
            self.advance(feed_tank, output_tank, &inputs, &mut events);
        }
        if self.unit.state == WorkState::Completing {
            self.unit.state = WorkState::Idle;
        }
        // A completing tick falls straight through to the search, so a
        // well-fed machine never shows an idle gap.
        if self.unit.progress == 0 && self.unit.state == WorkState::Idle {
            let started = self.search(fuel_tanks, fuel_slots, &inputs, &mut events);
            if !started && self.unit.was_active_and_needs_update {
                self.unit.was_active_and_needs_update = false;
                self.set_active(false, inputs.tick, &mut events);
            }
        }

        self.debug_validate();
        events
    }

    /// Recover from `Failed`. The host decides when (and whether) the
    /// machine survives its own failure.
    pub fn reset(&mut self) {
        if self.unit.state == WorkState::Failed {
            self.unit.state = WorkState::Idle;
        }
    }

    /// Structural teardown: abandon the activation but keep the carries
    /// and heat (heat decays naturally from here).
    pub fn invalidate(&mut self) {
        self.unit.progress = 0;
        self.unit.target_duration = 0;
        self.unit.applied_power = 0;
        self.unit.active = false;
        self.unit.last_output = 0;
        self.unit.was_active_and_needs_update = false;
        if self.unit.state != WorkState::Failed {
            self.unit.state = WorkState::Idle;
        }
    }

    /// The persisted slice of the work unit.
    pub fn snapshot(&self) -> WorkSnapshot {
        WorkSnapshot {
            progress: self.unit.progress,
            target_duration: self.unit.target_duration,
            applied_power: self.unit.applied_power,
            excess_flow_units: self.unit.excess_flow_units,
            excess_dose_units: self.unit.excess_dose_units,
            excess_power_time_units: self.unit.excess_power_time_units,
            heat: self.unit.heat,
        }
    }

    /// Resume from a snapshot. A snapshot taken mid-burn resumes in
    /// `Running`; failure is never persisted (the host handles wreckage).
    ///
    /// Carries outside `[0, divisor)` mean the blob was corrupted or
    /// written by a different machine shape; the restore is refused
    /// rather than letting a bad remainder poison conservation.
    pub fn restore(&mut self, snap: WorkSnapshot) -> Result<(), CoreError> {
        if !(0..BURN_UNITS_PER_TICK).contains(&snap.excess_flow_units) {
            return Err(CoreError::InvalidCarry {
                value: snap.excess_flow_units,
                divisor: BURN_UNITS_PER_TICK,
            });
        }
        let dose = self.policy.dose_size();
        if !(0..dose).contains(&snap.excess_dose_units) {
            return Err(CoreError::InvalidCarry {
                value: snap.excess_dose_units,
                divisor: dose,
            });
        }
        // The power-time carry is bounded by the activation's adjusted
        // power while one is running; between activations only the sign
        // can be checked.
        if snap.excess_power_time_units < 0
            || (snap.applied_power > 0 && snap.excess_power_time_units >= snap.applied_power)
        {
            return Err(CoreError::InvalidCarry {
                value: snap.excess_power_time_units,
                divisor: snap.applied_power.max(1),
            });
        }

        self.unit.progress = snap.progress;
        self.unit.target_duration = snap.target_duration;
        self.unit.applied_power = snap.applied_power;
        self.unit.excess_flow_units = snap.excess_flow_units;
        self.unit.excess_dose_units = snap.excess_dose_units;
        self.unit.excess_power_time_units = snap.excess_power_time_units;
        self.unit.heat = snap.heat;
        self.unit.state = if snap.progress > 0 {
            WorkState::Running
        } else {
            WorkState::Idle
        };
        self.unit.active = snap.progress > 0;
        self.unit.was_active_and_needs_update = false;
        self.unit.last_output = 0;
        Ok(())
    }

    // -- internals ----------------------------------------------------------

    /// Heat after the maintenance penalty: each problem caps effective
    /// heat a configured fraction below maximum.
    fn effective_heat(&self, problems: u32) -> i64 {
        if !self.config.maintenance_enabled {
            return self.unit.heat;
        }
        let factor = Fixed64::from_num(1)
            - self.config.maintenance_penalty_per_problem * Fixed64::from_num(problems);
        // Round to nearest: penalty fractions like 0.1 are not exactly
        // representable in binary and truncation would cap one unit low.
        let cap: i64 = (factor * Fixed64::from_num(self.policy.max_heat()))
            .round()
            .to_num();
        self.unit.heat.min(cap.max(0))
    }

    fn advance(
        &mut self,
        feed_tank: &mut dyn FlowHandler,
        output_tank: &mut dyn FlowHandler,
        inputs: &TickInputs,
        events: &mut Vec<MachineEvent>,
    ) {
        let max_heat = self.policy.max_heat();
        let generated =
            self.unit.applied_power * self.effective_heat(inputs.maintenance_problems) / max_heat;

        if generated > 0 {
            let dose = self.policy.dose_size();
            let (doses, rest) =
                carry::doses_for_output(generated, dose, self.unit.excess_dose_units);
            self.unit.excess_dose_units = rest;

            if doses > 0 {
                let need = doses as u64;
                let available = feed_tank.drain_kind(self.feed_kind, need, Action::Simulate);
                if available < need {
                    let severity = self.policy.failure_severity(
                        self.unit.heat,
                        max_heat,
                        (need - available) as i64,
                        doses,
                    );
                    self.fail(severity, inputs.tick, events);
                    return;
                }
                feed_tank.drain_kind(self.feed_kind, need, Action::Execute);
            }

            self.set_last_output(generated, inputs.tick, events);
            output_tank.fill(
                FlowStack {
                    kind: self.output_kind,
                    amount: generated as u64,
                },
                Action::Execute,
            );
        }

        if self.unit.heat < max_heat {
            self.set_heat(self.unit.heat + 1, inputs.tick, events);
        }

        self.unit.progress += 1;
        if self.unit.progress > self.unit.target_duration {
            self.unit.state = WorkState::Completing;
            self.unit.progress = 0;
            self.unit.target_duration = 0;
            self.unit.applied_power = 0;
            self.unit.was_active_and_needs_update = true;
        }
    }

    fn search(
        &mut self,
        fuel_tanks: &mut [&mut dyn FlowHandler],
        fuel_slots: &mut dyn ItemHandler,
        inputs: &TickInputs,
        events: &mut Vec<MachineEvent>,
    ) -> bool {
        self.unit.state = WorkState::Searching;

        // A structure this broken cannot be coaxed into starting.
        if self.config.maintenance_enabled && inputs.maintenance_problems > 5 {
            self.unit.state = WorkState::Idle;
            return false;
        }

        let mut raw_duration = None;

        'scan: for tank in fuel_tanks.iter_mut() {
            let Some(stack) = tank.fluid() else { continue };
            if stack.kind == self.feed_kind {
                continue;
            }
            for class in FuelClass::ALL {
                let Some(recipe) = self.fuel_table.find(class, stack.kind) else {
                    continue;
                };
                // Only burn when the tank covers a whole batch, otherwise
                // integer division eats most of the fuel's value.
                let batch = recipe.amount * BATCH_MULTIPLE;
                if stack.amount < batch {
                    continue;
                }
                if tank.drain_kind(stack.kind, batch, Action::Simulate) < batch {
                    continue;
                }
                tank.drain_kind(stack.kind, batch, Action::Execute);

                let burn = class.scale_burn(recipe.burn_ticks()).max(1);
                raw_duration = Some(self.policy.runtime_boost(burn).max(1));
                events.push(MachineEvent::FluidFuelConsumed {
                    fluid: stack.kind,
                    amount: batch,
                    tick: inputs.tick,
                });
                break 'scan;
            }
        }

        // Fall back to discrete item fuel with a burn-value-per-item model.
        let mut bonus_ticks = 0;
        if raw_duration.is_none() {
            for slot in 0..fuel_slots.slots() {
                let Some((item, _)) = fuel_slots.stack_in_slot(slot) else {
                    continue;
                };
                let burn_value = self.fuel_table.burn_value(item);
                if burn_value < BURN_UNITS_PER_TICK {
                    continue;
                }
                if self.fuel_table.is_fluid_container(item) {
                    continue;
                }

                self.unit.excess_flow_units += burn_value % BURN_UNITS_PER_TICK;
                bonus_ticks = self.unit.excess_flow_units / BURN_UNITS_PER_TICK;
                self.unit.excess_flow_units %= BURN_UNITS_PER_TICK;

                raw_duration = Some(
                    self.policy
                        .runtime_boost(burn_value / BURN_UNITS_PER_TICK)
                        .max(1),
                );
                fuel_slots.shrink(slot, 1);
                events.push(MachineEvent::ItemFuelConsumed {
                    item,
                    tick: inputs.tick,
                });
                break;
            }
        }

        let Some(raw) = raw_duration else {
            self.unit.state = WorkState::Idle;
            return false;
        };

        let throttled = carry::throttle(
            self.policy.power_per_tick(),
            raw,
            inputs.throttle_percent,
            self.config.minimum_applied_power,
            self.unit.excess_power_time_units,
        );
        self.unit.excess_power_time_units = throttled.carry;
        self.unit.target_duration = throttled.duration + bonus_ticks;
        self.unit.applied_power = throttled.power;
        self.unit.progress = 1;
        self.unit.state = WorkState::Running;

        if self.unit.was_active_and_needs_update {
            self.unit.was_active_and_needs_update = false;
        } else {
            self.set_active(true, inputs.tick, events);
        }
        true
    }

    fn fail(&mut self, severity: u32, tick: Ticks, events: &mut Vec<MachineEvent>) {
        self.unit.state = WorkState::Failed;
        self.unit.progress = 0;
        self.unit.target_duration = 0;
        self.unit.applied_power = 0;
        self.set_last_output(0, tick, events);
        self.set_active(false, tick, events);
        events.push(MachineEvent::CatastrophicFailure { severity, tick });
    }

    fn set_heat(&mut self, heat: i64, tick: Ticks, events: &mut Vec<MachineEvent>) {
        if heat != self.unit.heat {
            self.unit.heat = heat;
            events.push(MachineEvent::HeatChanged { heat, tick });
        }
    }

    fn set_last_output(&mut self, amount: i64, tick: Ticks, events: &mut Vec<MachineEvent>) {
        if amount != self.unit.last_output {
            self.unit.last_output = amount;
            events.push(MachineEvent::OutputChanged { amount, tick });
        }
    }

    fn set_active(&mut self, active: bool, tick: Ticks, events: &mut Vec<MachineEvent>) {
        if active != self.unit.active {
            self.unit.active = active;
            events.push(MachineEvent::ActiveChanged { active, tick });
        }
    }

    fn debug_validate(&self) {
        debug_assert!((0..BURN_UNITS_PER_TICK).contains(&self.unit.excess_flow_units));
        debug_assert!((0..self.policy.dose_size()).contains(&self.unit.excess_dose_units));
        debug_assert!(self.unit.excess_power_time_units >= 0);
        debug_assert!(self.unit.progress >= 0);
        debug_assert!(self.unit.progress <= self.unit.target_duration);
        if matches!(self.unit.state, WorkState::Idle | WorkState::Failed) {
            debug_assert_eq!(self.unit.target_duration, 0);
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
