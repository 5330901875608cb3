//! Command-line options and the immutable runtime configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::affinity::{Affinity, CpuMask};
use crate::report::OutputTarget;

/// Host network monitor: samples interface and SNMP counters every
/// interval and prints one `;`-separated line per sample.
#[derive(Parser, Debug)]
#[command(name = "hostmon", version)]
pub struct Args {
    /// CPU mask to bind to, bitwise in hex (bit N = core N). Wins over -A.
    #[arg(short = 'a', value_name = "HEX_MASK", value_parser = parse_cpu_mask)]
    pub cpu_mask: Option<CpuMask>,

    /// CPU core to bind to, starting from 0.
    #[arg(short = 'A', value_name = "CORE")]
    pub cpu_core: Option<usize>,

    /// Output file name [terminal].
    #[arg(short = 'f', value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Seconds between samples; 0 disables reporting (header only).
    #[arg(
        short = 'i',
        value_name = "SECONDS",
        default_value_t = 0,
        allow_negative_numbers = true
    )]
    pub interval: i64,

    /// Quiet - only print the header and results.
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase logging verbosity (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to /proc filesystem (for testing/mocking).
    #[arg(long, default_value = "/proc")]
    pub proc_path: String,
}

fn parse_cpu_mask(s: &str) -> Result<CpuMask, String> {
    s.parse().map_err(|e| format!("{e}"))
}

/// Runtime configuration, fixed once startup has parsed the options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub output: OutputTarget,
    /// `None` when reporting is disabled.
    pub interval: Option<Duration>,
    pub affinity: Affinity,
    pub quiet: bool,
    pub verbose: u8,
    pub proc_path: String,
}

impl Args {
    pub fn into_config(self) -> Config {
        let interval = u64::try_from(self.interval)
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        Config {
            output: self
                .file
                .map(OutputTarget::File)
                .unwrap_or(OutputTarget::Stdout),
            interval,
            affinity: Affinity::from_options(self.cpu_mask, self.cpu_core),
            quiet: self.quiet,
            verbose: self.verbose,
            proc_path: self.proc_path,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output: OutputTarget::Stdout,
            interval: None,
            affinity: Affinity::Unset,
            quiet: false,
            verbose: 0,
            proc_path: "/proc".to_string(),
        }
    }
}
