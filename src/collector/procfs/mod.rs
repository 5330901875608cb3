//! Collectors for the Linux `/proc/net` files.

pub mod net;
pub mod parser;

pub use net::{CollectError, NetCollector};
