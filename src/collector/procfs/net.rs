//! Network collector for gathering interface and SNMP counters from `/proc/net/`.

use std::collections::BTreeMap;
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::collector::procfs::parser::{ParseError, parse_net_dev, parse_net_snmp};
use crate::collector::traits::{CounterSource, FileSystem};
use crate::model::{CounterSnapshot, InterfaceCounters, SnmpCounters};

/// Error type for collection failures.
#[derive(Debug, Error)]
pub enum CollectError {
    /// I/O error reading a `/proc` file.
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// Parse error in a `/proc` file.
    #[error("parse error in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ParseError,
    },
}

/// Collects cumulative network counters from `/proc/net/`.
pub struct NetCollector<F: FileSystem> {
    fs: F,
    proc_path: String,
}

impl<F: FileSystem> NetCollector<F> {
    /// Creates a new network collector.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `proc_path` - Base path to proc filesystem (usually "/proc")
    pub fn new(fs: F, proc_path: impl Into<String>) -> Self {
        Self {
            fs,
            proc_path: proc_path.into(),
        }
    }

    pub fn proc_path(&self) -> &str {
        &self.proc_path
    }

    fn read(&self, path: &str) -> Result<String, CollectError> {
        self.fs
            .read_to_string(Path::new(path))
            .map_err(|source| CollectError::Io {
                path: path.to_string(),
                source,
            })
    }

    /// Collects per-interface counters from `/proc/net/dev`.
    pub fn collect_net_dev(&self) -> Result<BTreeMap<String, InterfaceCounters>, CollectError> {
        let path = format!("{}/net/dev", self.proc_path);
        let content = self.read(&path)?;
        let devices =
            parse_net_dev(&content).map_err(|source| CollectError::Parse { path, source })?;

        Ok(devices
            .into_iter()
            .map(|dev| {
                (
                    dev.interface,
                    InterfaceCounters {
                        rx_bytes: dev.rx_bytes,
                        rx_packets: dev.rx_packets,
                        rx_errs: dev.rx_errs,
                        rx_drop: dev.rx_drop,
                        tx_bytes: dev.tx_bytes,
                        tx_packets: dev.tx_packets,
                        tx_errs: dev.tx_errs,
                        tx_drop: dev.tx_drop,
                    },
                )
            })
            .collect())
    }

    /// Collects protocol counters from `/proc/net/snmp`.
    ///
    /// Some sandboxes hide this file; its absence yields all-zero counters.
    pub fn collect_net_snmp(&self) -> Result<SnmpCounters, CollectError> {
        let path = format!("{}/net/snmp", self.proc_path);
        if !self.fs.exists(Path::new(&path)) {
            debug!("{} not present, SNMP counters read as zero", path);
            return Ok(SnmpCounters::default());
        }

        let content = self.read(&path)?;
        let s = parse_net_snmp(&content).map_err(|source| CollectError::Parse { path, source })?;

        Ok(SnmpCounters {
            values: [
                s.ip_in_receives,
                s.ip_in_delivers,
                s.ip_out_requests,
                s.ip_in_discards,
                s.tcp_active_opens,
                s.tcp_passive_opens,
                s.tcp_attempt_fails,
                s.tcp_estab_resets,
                s.tcp_in_segs,
                s.tcp_out_segs,
                s.tcp_retrans_segs,
                s.tcp_in_errs,
                s.tcp_out_rsts,
                s.udp_in_datagrams,
                s.udp_out_datagrams,
                s.udp_in_errors,
                s.udp_no_ports,
                s.udp_rcvbuf_errors,
                s.udp_sndbuf_errors,
            ],
        })
    }
}

impl<F: FileSystem> CounterSource for NetCollector<F> {
    fn sample(&mut self) -> Result<CounterSnapshot, CollectError> {
        Ok(CounterSnapshot {
            interfaces: self.collect_net_dev()?,
            snmp: self.collect_net_snmp()?,
            taken_at_micros: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockFs;

    #[test]
    fn test_collect_typical_host() {
        let mut collector = NetCollector::new(MockFs::typical_host(), "/proc");
        let snapshot = collector.sample().unwrap();

        assert_eq!(snapshot.interfaces.len(), 2);
        let eth0 = &snapshot.interfaces["eth0"];
        assert_eq!(eth0.rx_bytes, 987_654_321);
        assert_eq!(eth0.rx_errs, 5);
        assert_eq!(eth0.tx_packets, 456_789);

        assert_eq!(snapshot.snmp.get("TcpActiveOpens"), Some(5000));
        assert_eq!(snapshot.snmp.get("UdpNoPorts"), Some(500));
        assert_eq!(snapshot.snmp.get("IpInReceives"), Some(1_000_000));
    }

    #[test]
    fn test_missing_net_dev_is_an_error() {
        let mut collector = NetCollector::new(MockFs::new(), "/proc");
        let err = collector.sample().unwrap_err();
        assert!(matches!(err, CollectError::Io { .. }));
        assert!(err.to_string().contains("/proc/net/dev"));
    }

    #[test]
    fn test_missing_snmp_reads_as_zero() {
        let mut fs = MockFs::typical_host();
        fs.remove_file("/proc/net/snmp");
        let mut collector = NetCollector::new(fs, "/proc");

        let snapshot = collector.sample().unwrap();
        assert_eq!(snapshot.snmp, SnmpCounters::default());
        assert!(snapshot.interfaces.contains_key("lo"));
    }

    #[test]
    fn test_custom_proc_path() {
        let mut fs = MockFs::new();
        fs.add_file(
            "/host/proc/net/dev",
            MockFs::net_dev_table(&[("wlan0", 100, 200)]),
        );
        let mut collector = NetCollector::new(fs, "/host/proc");

        let snapshot = collector.sample().unwrap();
        assert_eq!(snapshot.interfaces["wlan0"].rx_bytes, 100);
        assert_eq!(snapshot.interfaces["wlan0"].tx_bytes, 200);
    }
}
