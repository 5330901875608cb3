//! In-memory `/proc` trees for exercising the collector without Linux.

mod filesystem;
mod scenarios;

pub use filesystem::MockFs;
