//! Current/previous counter snapshots and the deltas between them.

use std::collections::BTreeMap;

use tracing::trace;

use crate::collector::{CollectError, CounterSource};
use crate::model::{CounterSnapshot, Deltas, IF_COUNTERS, InterfaceCounters, InterfaceDelta};

// ---------------------------------------------------------------------------
// Delta helpers
// ---------------------------------------------------------------------------

/// Counter delta, clamped to zero on regression (wraparound or reset).
pub fn counter_delta(curr: u64, prev: u64) -> u64 {
    curr.saturating_sub(prev)
}

/// Element-wise [`counter_delta`].
pub fn delta_values<const N: usize>(curr: &[u64; N], prev: &[u64; N]) -> [u64; N] {
    std::array::from_fn(|i| counter_delta(curr[i], prev[i]))
}

/// Bytes over an interval as megabits per second.
pub fn mbit_per_sec(bytes: u64, interval_secs: f64) -> Option<f64> {
    (interval_secs > 0.0).then(|| bytes as f64 * 8.0 / interval_secs / 1_000_000.0)
}

// ---------------------------------------------------------------------------
// Snapshot store
// ---------------------------------------------------------------------------

/// Holds the latest and the previous reading from a [`CounterSource`].
///
/// Only the reporting loop calls [`SnapshotStore::refresh`], never
/// concurrently, so the store needs no locking.
#[derive(Debug)]
pub struct SnapshotStore<S> {
    source: S,
    current: Option<CounterSnapshot>,
    previous: Option<CounterSnapshot>,
}

impl<S: CounterSource> SnapshotStore<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            current: None,
            previous: None,
        }
    }

    /// Takes a fresh reading stamped `at_micros`; the old current becomes
    /// previous.
    ///
    /// The source is read before anything moves, so a failed read leaves
    /// both snapshots exactly as they were.
    pub fn refresh(&mut self, at_micros: i64) -> Result<(), CollectError> {
        let mut fresh = self.source.sample()?;
        fresh.taken_at_micros = at_micros;
        trace!(
            "snapshot at {}us: {} interfaces",
            at_micros,
            fresh.interfaces.len()
        );
        self.previous = self.current.replace(fresh);
        Ok(())
    }

    pub fn current(&self) -> Option<&CounterSnapshot> {
        self.current.as_ref()
    }

    pub fn previous(&self) -> Option<&CounterSnapshot> {
        self.previous.as_ref()
    }

    /// Per-counter change since the previous snapshot.
    ///
    /// Counters without a previous value (first sample, or an interface
    /// that appeared since) are returned raw and flagged as baseline.
    pub fn compute_deltas(&self) -> Deltas {
        let Some(current) = &self.current else {
            return Deltas::default();
        };
        compute_deltas(current, self.previous.as_ref())
    }
}

/// Deltas of `current` against an optional `previous` snapshot.
pub fn compute_deltas(current: &CounterSnapshot, previous: Option<&CounterSnapshot>) -> Deltas {
    let interval_secs = previous
        .map(|p| (current.taken_at_micros - p.taken_at_micros) as f64 / 1_000_000.0)
        .filter(|dt| *dt > 0.0);

    let interfaces: BTreeMap<String, InterfaceDelta> = current
        .interfaces
        .iter()
        .map(|(name, counters)| {
            let prev = previous.and_then(|p| p.interfaces.get(name));
            (name.clone(), interface_delta(counters, prev, interval_secs))
        })
        .collect();

    let (snmp, snmp_baseline) = match previous {
        Some(p) => (delta_values(&current.snmp.values, &p.snmp.values), false),
        None => (current.snmp.values, true),
    };

    Deltas {
        interfaces,
        snmp,
        snmp_baseline,
        interval_secs,
    }
}

fn interface_delta(
    curr: &InterfaceCounters,
    prev: Option<&InterfaceCounters>,
    interval_secs: Option<f64>,
) -> InterfaceDelta {
    let Some(prev) = prev else {
        return InterfaceDelta {
            values: curr.values(),
            baseline: true,
            rx_mbit_s: None,
            tx_mbit_s: None,
        };
    };

    let values: [u64; IF_COUNTERS] = delta_values(&curr.values(), &prev.values());
    let rx = counter_delta(curr.rx_bytes, prev.rx_bytes);
    let tx = counter_delta(curr.tx_bytes, prev.tx_bytes);
    InterfaceDelta {
        values,
        baseline: false,
        rx_mbit_s: interval_secs.and_then(|dt| mbit_per_sec(rx, dt)),
        tx_mbit_s: interval_secs.and_then(|dt| mbit_per_sec(tx, dt)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
