//! Status tracking subsystem.
//!
//! # States
//! - Unknown: no observation yet (initial)
//! - Up: last probe reachable
//! - Down: last probe unreachable
//!
//! # State Transitions
//! ```text
//! Unknown → Up/Down: baseline, never reported as a transition
//! Up → Down: transition, triggers remediation once
//! Down → Up: transition
//! Up → Up, Down → Down: repeated state, still emitted as an event
//! ```
//!
//! # Design Decisions
//! - `TargetState` is owned by its target's loop and passed as `&mut`,
//!   so no locking is needed
//! - Every tick yields a `StatusEvent`; consumers filter on `is_transition`
//! - Remediation is edge-triggered; sustained-down re-triggering is policy

pub mod event;
pub mod tracker;

pub use event::{Status, StatusEvent};
pub use tracker::{RemediationPolicy, StatusTracker, TargetState};
