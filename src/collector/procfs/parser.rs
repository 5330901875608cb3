//! Parsers for the network files under `/proc/net`.
//!
//! These are pure functions over the file content so they can be tested
//! with string inputs.

use thiserror::Error;

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Parse error: {message}")]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

// ============ Network Device Stats Parser ============

/// Parsed data from `/proc/net/dev`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetDevStats {
    /// Interface name (eth0, lo, etc.)
    pub interface: String,
    pub rx_bytes: u64,
    pub rx_packets: u64,
    pub rx_errs: u64,
    pub rx_drop: u64,
    pub tx_bytes: u64,
    pub tx_packets: u64,
    pub tx_errs: u64,
    pub tx_drop: u64,
}

/// Parses `/proc/net/dev` content.
///
/// Format:
/// Inter-|   Receive                                                |  Transmit
///  face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
///    lo: 1234567     1234    0    0    0     0          0         0  1234567     1234    0    0    0     0       0          0
///
/// A file without the `|` header is rejected; device lines with fewer than
/// sixteen value columns are skipped.
pub fn parse_net_dev(content: &str) -> Result<Vec<NetDevStats>, ParseError> {
    let mut devices = Vec::new();
    let mut saw_header = false;

    for line in content.lines() {
        if line.contains('|') {
            saw_header = true;
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }

        // Interface names never contain ':', but the counters can be glued
        // to it ("eth0:123"), so split on the first colon only.
        let Some((name, rest)) = line.split_once(':') else {
            continue;
        };

        let interface = name.trim().to_string();
        let values: Vec<&str> = rest.split_whitespace().collect();
        if interface.is_empty() || values.len() < 16 {
            continue;
        }

        let get_val =
            |idx: usize| -> u64 { values.get(idx).and_then(|s| s.parse().ok()).unwrap_or(0) };

        devices.push(NetDevStats {
            interface,
            rx_bytes: get_val(0),
            rx_packets: get_val(1),
            rx_errs: get_val(2),
            rx_drop: get_val(3),
            tx_bytes: get_val(8),
            tx_packets: get_val(9),
            tx_errs: get_val(10),
            tx_drop: get_val(11),
        });
    }

    if !saw_header {
        return Err(ParseError::new("missing /proc/net/dev header"));
    }

    Ok(devices)
}

// ============ Network SNMP Parser ============

/// Parsed cumulative counters from `/proc/net/snmp`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetSnmpStats {
    // IP statistics
    pub ip_in_receives: u64,
    pub ip_in_delivers: u64,
    pub ip_out_requests: u64,
    pub ip_in_discards: u64,
    // TCP statistics
    pub tcp_active_opens: u64,
    pub tcp_passive_opens: u64,
    pub tcp_attempt_fails: u64,
    pub tcp_estab_resets: u64,
    pub tcp_in_segs: u64,
    pub tcp_out_segs: u64,
    pub tcp_retrans_segs: u64,
    pub tcp_in_errs: u64,
    pub tcp_out_rsts: u64,
    // UDP statistics
    pub udp_in_datagrams: u64,
    pub udp_out_datagrams: u64,
    pub udp_in_errors: u64,
    pub udp_no_ports: u64,
    pub udp_rcvbuf_errors: u64,
    pub udp_sndbuf_errors: u64,
}

/// Parses `/proc/net/snmp` content.
///
/// Format: Each protocol has two lines - keys and values
/// Tcp: key1 key2 key3...
/// Tcp: val1 val2 val3...
pub fn parse_net_snmp(content: &str) -> Result<NetSnmpStats, ParseError> {
    let mut stats = NetSnmpStats::default();
    let lines: Vec<&str> = content.lines().collect();

    let mut i = 0;
    while i + 1 < lines.len() {
        let key_parts: Vec<&str> = lines[i].split_whitespace().collect();
        let val_parts: Vec<&str> = lines[i + 1].split_whitespace().collect();

        if key_parts.is_empty() || val_parts.is_empty() || key_parts[0] != val_parts[0] {
            i += 1;
            continue;
        }

        let prefix = key_parts[0].trim_end_matches(':');
        let keys = &key_parts[1..];
        let vals = &val_parts[1..];
        if keys.len() != vals.len() {
            return Err(ParseError::new(format!(
                "{prefix}: {} keys but {} values",
                keys.len(),
                vals.len()
            )));
        }

        for (key, raw) in keys.iter().zip(vals) {
            // MaxConn is -1 on most kernels; anything non-numeric reads as 0.
            let value: u64 = raw.parse().unwrap_or(0);
            match (prefix, *key) {
                ("Ip", "InReceives") => stats.ip_in_receives = value,
                ("Ip", "InDelivers") => stats.ip_in_delivers = value,
                ("Ip", "OutRequests") => stats.ip_out_requests = value,
                ("Ip", "InDiscards") => stats.ip_in_discards = value,
                ("Tcp", "ActiveOpens") => stats.tcp_active_opens = value,
                ("Tcp", "PassiveOpens") => stats.tcp_passive_opens = value,
                ("Tcp", "AttemptFails") => stats.tcp_attempt_fails = value,
                ("Tcp", "EstabResets") => stats.tcp_estab_resets = value,
                ("Tcp", "InSegs") => stats.tcp_in_segs = value,
                ("Tcp", "OutSegs") => stats.tcp_out_segs = value,
                ("Tcp", "RetransSegs") => stats.tcp_retrans_segs = value,
                ("Tcp", "InErrs") => stats.tcp_in_errs = value,
                ("Tcp", "OutRsts") => stats.tcp_out_rsts = value,
                ("Udp", "InDatagrams") => stats.udp_in_datagrams = value,
                ("Udp", "OutDatagrams") => stats.udp_out_datagrams = value,
                ("Udp", "InErrors") => stats.udp_in_errors = value,
                ("Udp", "NoPorts") => stats.udp_no_ports = value,
                ("Udp", "RcvbufErrors") => stats.udp_rcvbuf_errors = value,
                ("Udp", "SndbufErrors") => stats.udp_sndbuf_errors = value,
                _ => {}
            }
        }
        i += 2;
    }

    Ok(stats)
}
