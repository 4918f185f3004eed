//! Headway estimation and service classification.
//!
//! Trip events from one feed snapshot are grouped per stop, turned into wait
//! estimates, averaged per direction, and finally bucketed into service tiers.

pub mod aggregate;
pub mod estimate;
pub mod tier;
pub mod types;
pub mod utility;

pub use aggregate::aggregate_snapshot;
pub use estimate::wait_estimate;
pub use tier::{ServiceTier, TierInfo, TieredView, classify_lines};
pub use types::{Direction, LineState, Minutes, Snapshot, StopEvent, TripEvent};
