//! Binding the process to a CPU core or core set.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Largest core index a mask may name (the kernel's `CPU_SETSIZE`).
pub const MAX_CPUS: usize = 1024;

#[derive(Debug, Error)]
pub enum AffinityError {
    #[error("invalid cpu mask '{0}': expected hex digits")]
    InvalidMask(String),
    #[error("cpu mask '{0}' selects no cores")]
    EmptyMask(String),
    #[error("core {0} is out of range (max {max})", max = MAX_CPUS)]
    OutOfRange(usize),
    #[error("sched_setaffinity failed: {0}")]
    Sys(#[source] std::io::Error),
    #[error("cpu affinity is not supported on this platform")]
    Unsupported,
}

/// Set of cores given as a hex bitmask, bit N = core N.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuMask {
    cores: Vec<usize>,
}

impl CpuMask {
    /// Core indices in ascending order.
    pub fn cores(&self) -> &[usize] {
        &self.cores
    }
}

impl FromStr for CpuMask {
    type Err = AffinityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let hex = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if hex.is_empty() {
            return Err(AffinityError::InvalidMask(s.to_string()));
        }

        let mut cores = Vec::new();
        // Least significant nibble is the last character.
        for (nibble_idx, ch) in hex.chars().rev().enumerate() {
            let nibble = ch
                .to_digit(16)
                .ok_or_else(|| AffinityError::InvalidMask(s.to_string()))?;
            for bit in 0..4 {
                if nibble & (1 << bit) != 0 {
                    let core = nibble_idx * 4 + bit;
                    if core >= MAX_CPUS {
                        return Err(AffinityError::OutOfRange(core));
                    }
                    cores.push(core);
                }
            }
        }

        if cores.is_empty() {
            return Err(AffinityError::EmptyMask(s.to_string()));
        }
        Ok(Self { cores })
    }
}

impl fmt::Display for CpuMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let list: Vec<String> = self.cores.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", list.join(","))
    }
}

/// Requested CPU placement for the process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Affinity {
    /// Leave placement to the scheduler.
    #[default]
    Unset,
    Core(usize),
    Mask(CpuMask),
}

impl Affinity {
    /// Picks the placement from the `-a` and `-A` options; the mask wins
    /// when both are given.
    pub fn from_options(mask: Option<CpuMask>, core: Option<usize>) -> Self {
        match (mask, core) {
            (Some(mask), _) => Affinity::Mask(mask),
            (None, Some(core)) => Affinity::Core(core),
            (None, None) => Affinity::Unset,
        }
    }

    /// Cores the process should be restricted to, or `None` when unset.
    pub fn cores(&self) -> Option<Vec<usize>> {
        match self {
            Affinity::Unset => None,
            Affinity::Core(core) => Some(vec![*core]),
            Affinity::Mask(mask) => Some(mask.cores().to_vec()),
        }
    }
}

/// Applies `affinity` to the calling process.
///
/// Returns the cores bound to, or `None` when nothing was requested.
pub fn apply(affinity: &Affinity) -> Result<Option<Vec<usize>>, AffinityError> {
    let Some(cores) = affinity.cores() else {
        return Ok(None);
    };
    if let Some(&core) = cores.iter().find(|&&c| c >= MAX_CPUS) {
        return Err(AffinityError::OutOfRange(core));
    }
    set_affinity(&cores)?;
    Ok(Some(cores))
}

#[cfg(target_os = "linux")]
fn set_affinity(cores: &[usize]) -> Result<(), AffinityError> {
    // SAFETY: cpu_set_t is a plain bitmask for which all-zero is the empty
    // set, and every index was checked against CPU_SETSIZE above.
    let rc = unsafe {
        let mut set: libc::cpu_set_t = std::mem::zeroed();
        libc::CPU_ZERO(&mut set);
        for &core in cores {
            libc::CPU_SET(core, &mut set);
        }
        libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set)
    };
    if rc != 0 {
        return Err(AffinityError::Sys(std::io::Error::last_os_error()));
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn set_affinity(_cores: &[usize]) -> Result<(), AffinityError> {
    Err(AffinityError::Unsupported)
}
