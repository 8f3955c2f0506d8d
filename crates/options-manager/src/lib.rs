//! Deterministic HV/IV spread position management.
//!
//! Runs inside a host's tick callback and:
//! - Fires the kill-switches (vol proxy spike, expiration close, stop-loss)
//! - Computes the HV/IV spread signal per underlying on the evaluation cadence
//! - Decides hold, exit or entry through a pure rule function
//! - Builds and records entries, with an optional delta hedge
//!
//! All rules are deterministic; the host only receives fire-and-forget orders.

pub mod gate;
pub mod hedge;
pub mod monitor;
pub mod service;
pub mod signal;
pub mod stops;
pub mod types;

pub use gate::decide;
pub use service::Engine;
pub use signal::compute_signal;
pub use stops::VolProxyMonitor;
pub use types::{Action, ExitReason, Signal, TickEvent};
