//! Pre-built mock filesystem scenarios for testing.

use super::filesystem::MockFs;

const NET_DEV_HEADER: &str = "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
";

impl MockFs {
    /// Creates a host with loopback, one Ethernet interface, and the usual
    /// Ip/Icmp/Tcp/Udp SNMP tables.
    pub fn typical_host() -> Self {
        let mut fs = Self::new();

        fs.add_file(
            "/proc/net/dev",
            format!(
                "{NET_DEV_HEADER}\
    lo: 12345678     9876    0    0    0     0          0         0 12345678     9876    0    0    0     0       0          0
  eth0: 987654321   654321    5   10    0     0          0       100 123456789   456789    2    5    0     0       0          0
"
            ),
        );

        fs.add_file(
            "/proc/net/snmp",
            "\
Ip: Forwarding DefaultTTL InReceives InHdrErrors InAddrErrors ForwDatagrams InUnknownProtos InDiscards InDelivers OutRequests OutDiscards OutNoRoutes ReasmTimeout ReasmReqds ReasmOKs ReasmFails FragOKs FragFails FragCreates
Ip: 1 64 1000000 0 0 0 0 0 999900 800000 0 0 0 0 0 0 0 0 0
Icmp: InMsgs InErrors InCsumErrors InDestUnreachs OutMsgs OutErrors OutDestUnreachs
Icmp: 45 0 0 45 45 0 45
Tcp: RtoAlgorithm RtoMin RtoMax MaxConn ActiveOpens PassiveOpens AttemptFails EstabResets CurrEstab InSegs OutSegs RetransSegs InErrs OutRsts InCsumErrors
Tcp: 1 200 120000 -1 5000 3000 100 50 150 500000 450000 1000 10 200 0
Udp: InDatagrams NoPorts InErrors OutDatagrams RcvbufErrors SndbufErrors InCsumErrors IgnoredMulti MemErrors
Udp: 100000 500 5 80000 0 0 0 0 0
",
        );

        fs
    }

    /// Renders a `/proc/net/dev` table with the given
    /// `(interface, rx_bytes, tx_bytes)` rows; packet counts are bytes / 100.
    pub fn net_dev_table(rows: &[(&str, u64, u64)]) -> String {
        let mut out = String::from(NET_DEV_HEADER);
        for (name, rx, tx) in rows {
            out.push_str(&format!(
                "{name:>6}: {rx} {} 0 0 0 0 0 0 {tx} {} 0 0 0 0 0 0\n",
                rx / 100,
                tx / 100
            ));
        }
        out
    }
}
