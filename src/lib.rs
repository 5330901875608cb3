//! hostmon - host network monitoring probe.
//!
//! Samples cumulative interface (`/proc/net/dev`) and protocol
//! (`/proc/net/snmp`) counters on a fixed wall-clock interval and writes one
//! line of per-interval deltas per sample, for graphing or offline analysis.
//!
//! The binary wires these pieces together:
//! - `collector` - reads raw counters from `/proc`
//! - `store` - keeps current/previous snapshots and computes deltas
//! - `scheduler` - interval timer and the event channel
//! - `signals` - termination signals forwarded onto that channel
//! - `report` - header and record lines
//! - `monitor` / `lifecycle` - the reporting loop and startup sequence

pub mod affinity;
pub mod clock;
pub mod collector;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod monitor;
pub mod report;
pub mod scheduler;
pub mod signals;
pub mod store;

pub use error::MonitorError;
