//! Network counter collector for Linux.
//!
//! Reads cumulative interface and protocol counters from the `/proc`
//! filesystem, with an in-memory filesystem for tests.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │              NetCollector                │
//! │   - /proc/net/dev   (per interface)      │
//! │   - /proc/net/snmp  (Ip/Tcp/Udp)         │
//! └────────────────────┬─────────────────────┘
//!                      │
//!               ┌──────▼──────┐
//!               │  FileSystem │ (trait)
//!               └──────┬──────┘
//!              ┌───────┴───────┐
//!       ┌──────▼──────┐ ┌──────▼──────┐
//!       │   RealFs    │ │   MockFs    │
//!       └─────────────┘ └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use hostmon::collector::{CounterSource, MockFs, NetCollector};
//!
//! let fs = MockFs::typical_host();
//! let mut collector = NetCollector::new(fs, "/proc");
//! let snapshot = collector.sample().unwrap();
//! assert!(snapshot.interfaces.contains_key("eth0"));
//! ```

pub mod mock;
pub mod procfs;
pub mod traits;

pub use mock::MockFs;
pub use procfs::{CollectError, NetCollector};
pub use traits::{CounterSource, FileSystem, RealFs};
