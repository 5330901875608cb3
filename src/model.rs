//! Counter readings and the per-interval values derived from them.
//!
//! Every counter here is cumulative: it only grows over the life of the
//! interface or network stack, barring a reset.

use std::collections::BTreeMap;

/// Number of per-interface counters.
pub const IF_COUNTERS: usize = 8;

/// Number of SNMP counters.
pub const SNMP_COUNTERS: usize = 19;

/// Cumulative counters for one network interface.
/// Source: `/proc/net/dev`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterfaceCounters {
    pub rx_bytes: u64,
    pub rx_packets: u64,
    pub rx_errs: u64,
    pub rx_drop: u64,
    pub tx_bytes: u64,
    pub tx_packets: u64,
    pub tx_errs: u64,
    pub tx_drop: u64,
}

impl InterfaceCounters {
    /// Column names, in the order of [`InterfaceCounters::values`].
    pub const COLUMNS: [&'static str; IF_COUNTERS] = [
        "rx_bytes",
        "rx_packets",
        "rx_errs",
        "rx_drop",
        "tx_bytes",
        "tx_packets",
        "tx_errs",
        "tx_drop",
    ];

    pub fn values(&self) -> [u64; IF_COUNTERS] {
        [
            self.rx_bytes,
            self.rx_packets,
            self.rx_errs,
            self.rx_drop,
            self.tx_bytes,
            self.tx_packets,
            self.tx_errs,
            self.tx_drop,
        ]
    }
}

/// Protocol-level cumulative counters.
/// Source: `/proc/net/snmp`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnmpCounters {
    pub values: [u64; SNMP_COUNTERS],
}

impl SnmpCounters {
    /// Column names as `<Proto><Counter>`, matching the kernel's key names.
    pub const COLUMNS: [&'static str; SNMP_COUNTERS] = [
        "IpInReceives",
        "IpInDelivers",
        "IpOutRequests",
        "IpInDiscards",
        "TcpActiveOpens",
        "TcpPassiveOpens",
        "TcpAttemptFails",
        "TcpEstabResets",
        "TcpInSegs",
        "TcpOutSegs",
        "TcpRetransSegs",
        "TcpInErrs",
        "TcpOutRsts",
        "UdpInDatagrams",
        "UdpOutDatagrams",
        "UdpInErrors",
        "UdpNoPorts",
        "UdpRcvbufErrors",
        "UdpSndbufErrors",
    ];

    /// Looks up a counter by its column name.
    pub fn get(&self, column: &str) -> Option<u64> {
        Self::COLUMNS
            .iter()
            .position(|c| *c == column)
            .map(|idx| self.values[idx])
    }
}

/// One complete reading of the host's network counters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CounterSnapshot {
    /// Interfaces keyed by name; ordered so report columns are stable.
    pub interfaces: BTreeMap<String, InterfaceCounters>,
    pub snmp: SnmpCounters,
    /// Monotonic clock reading (microseconds since the epoch) when sampled.
    /// Zero until the store stamps it.
    pub taken_at_micros: i64,
}

/// Per-interval values for one interface.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InterfaceDelta {
    /// Deltas in [`InterfaceCounters::COLUMNS`] order, or raw cumulative
    /// values when `baseline` is set.
    pub values: [u64; IF_COUNTERS],
    /// No previous reading existed, so `values` are raw counters.
    pub baseline: bool,
    pub rx_mbit_s: Option<f64>,
    pub tx_mbit_s: Option<f64>,
}

/// Derived, ephemeral record of what changed between two snapshots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Deltas {
    pub interfaces: BTreeMap<String, InterfaceDelta>,
    pub snmp: [u64; SNMP_COUNTERS],
    /// `true` when `snmp` holds raw values (first sample).
    pub snmp_baseline: bool,
    /// Seconds between the two snapshots; `None` on the first sample.
    pub interval_secs: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interface_values_follow_column_order() {
        let c = InterfaceCounters {
            rx_bytes: 1,
            rx_packets: 2,
            rx_errs: 3,
            rx_drop: 4,
            tx_bytes: 5,
            tx_packets: 6,
            tx_errs: 7,
            tx_drop: 8,
        };
        assert_eq!(c.values(), [1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(InterfaceCounters::COLUMNS[4], "tx_bytes");
    }

    #[test]
    fn snmp_lookup_by_column() {
        let mut snmp = SnmpCounters::default();
        snmp.values[8] = 42;
        assert_eq!(snmp.get("TcpInSegs"), Some(42));
        assert_eq!(snmp.get("TcpCurrEstab"), None);
    }
}
