//! # dochub-cache
//!
//! Client-side cache primitives for DocHub:
//!
//! - **memory**: the normalized [`EntityStore`], one per record type
//! - **sequence**: per-id request sequencing that rejects stale responses
//! - **inflight**: a registry that coalesces concurrent fetches of one id

pub mod inflight;
pub mod memory;
pub mod sequence;

pub use inflight::{Claim, FlightGuard, InFlight, Waiter};
pub use memory::{EntityStore, RequestStatus};
pub use sequence::{Seq, SequenceTracker};
