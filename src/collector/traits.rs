//! Abstractions over filesystem access and counter sampling.
//!
//! `FileSystem` lets the network collector read the real `/proc` tree on
//! Linux or an in-memory tree in tests. `CounterSource` is the seam the
//! snapshot store pulls fresh readings through.

use std::io;
use std::path::Path;

use crate::collector::CollectError;
use crate::model::CounterSnapshot;

/// Abstraction for filesystem operations.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Checks if a path exists.
    fn exists(&self, path: &Path) -> bool;
}

/// Real filesystem implementation that delegates to `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Anything that can produce the current cumulative counters for every
/// interface plus the protocol-level counters.
///
/// Called with no arguments beyond itself; each call is an independent
/// reading of the host's state.
pub trait CounterSource {
    fn sample(&mut self) -> Result<CounterSnapshot, CollectError>;
}
