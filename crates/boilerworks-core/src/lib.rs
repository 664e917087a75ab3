//! Boilerworks Core -- discrete-resource production under integer quantization.
//!
//! This crate models machines that convert fuel into a produced flow
//! resource on a fixed tick clock. The hard constraint everywhere is
//! *conservation*: power, burn time, and flow are integers, every
//! conversion truncates, and every truncation remainder is carried
//! forward so that nothing is silently gained or lost over a long run.
//!
//! # Key Types
//!
//! - [`carry`] -- pure integer routines for throttling a (power, duration)
//!   pair and batching continuous flow into discrete doses, each with a
//!   persistent carry bounded by its divisor.
//! - [`engine::WorkEngine`] -- the per-tick recipe state machine
//!   (idle/search/run/complete/fail) driving fuel intake, feed-flow
//!   consumption, and output production.
//! - [`engine::MachinePolicy`] -- strategy trait for machine variants
//!   (the shipped [`engine::BoilerPolicy`] models tiered boilers).
//! - [`container`] -- collaborator traits with simulate-then-commit
//!   semantics, plus in-memory reference implementations.
//! - [`event::MachineEvent`] -- transition-only events for an external
//!   presenter; the core never renders or plays sounds itself.
//! - [`serialize`] -- versioned binary snapshots via bitcode for the
//!   minimal state needed to resume a recipe.

pub mod carry;
pub mod config;
pub mod container;
#[cfg(feature = "data-loader")]
pub mod data_loader;
pub mod engine;
pub mod error;
pub mod event;
pub mod fixed;
pub mod recipe;
pub mod serialize;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
