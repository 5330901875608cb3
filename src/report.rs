//! Text report sink: one header line, then one line per interval.
//!
//! Lines are `;`-separated so the output can be fed straight to a grapher.
//! Every line is flushed as soon as it is written since readers tail the
//! stream live.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

use crate::model::{CounterSnapshot, Deltas, IF_COUNTERS, InterfaceCounters, SnmpCounters};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("open of statistics file {path} failed: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("write to report output failed: {0}")]
    Write(#[from] io::Error),
    #[error("report header already written")]
    HeaderTwice,
    #[error("report record written before the header")]
    NoHeader,
}

/// Where report lines go; fixed for the life of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

impl OutputTarget {
    /// Opens the destination, truncating an existing file.
    pub fn open(&self) -> Result<Box<dyn Write + Send>, SinkError> {
        match self {
            OutputTarget::Stdout => Ok(Box::new(io::stdout())),
            OutputTarget::File(path) => {
                let file = File::create(path).map_err(|source| SinkError::Open {
                    path: path.clone(),
                    source,
                })?;
                Ok(Box::new(BufWriter::new(file)))
            }
        }
    }
}

/// Writes the header and interval records to a destination.
///
/// The column layout is taken from the snapshot passed to
/// [`ReportSink::write_header`] and never changes afterwards.
pub struct ReportSink<W: Write> {
    out: W,
    /// Interfaces in column order; `None` until the header is written.
    layout: Option<Vec<String>>,
    /// Interfaces seen after the header, already logged once.
    unlisted: BTreeSet<String>,
    lines: u64,
}

impl<W: Write> ReportSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            layout: None,
            unlisted: BTreeSet::new(),
            lines: 0,
        }
    }

    /// Writes the column titles for the interfaces in `baseline`.
    ///
    /// Allowed exactly once per sink.
    pub fn write_header(&mut self, baseline: &CounterSnapshot) -> Result<(), SinkError> {
        if self.layout.is_some() {
            return Err(SinkError::HeaderTwice);
        }
        let layout: Vec<String> = baseline.interfaces.keys().cloned().collect();

        let mut line = String::from("Time sec");
        for name in &layout {
            for column in InterfaceCounters::COLUMNS {
                let _ = write!(line, "; {name}:{column}");
            }
            let _ = write!(line, "; {name}:rx_Mbit/s; {name}:tx_Mbit/s");
        }
        for column in SnmpCounters::COLUMNS {
            let _ = write!(line, "; snmp:{column}");
        }

        self.emit(&line)?;
        self.layout = Some(layout);
        Ok(())
    }

    /// Writes one interval record: elapsed seconds followed by the deltas
    /// in header order.
    pub fn write_record(
        &mut self,
        time_alive_secs: u64,
        snapshot: &CounterSnapshot,
        deltas: &Deltas,
    ) -> Result<(), SinkError> {
        let Some(layout) = &self.layout else {
            return Err(SinkError::NoHeader);
        };

        for name in snapshot.interfaces.keys() {
            if !layout.contains(name) && self.unlisted.insert(name.clone()) {
                info!("interface {} appeared after startup; not reported", name);
            }
        }

        let mut line = format!("{time_alive_secs} ");
        for name in layout {
            match deltas.interfaces.get(name) {
                Some(d) => {
                    for v in d.values {
                        let _ = write!(line, "; {v}");
                    }
                    let _ = write!(line, "; {}; {}", rate(d.rx_mbit_s), rate(d.tx_mbit_s));
                }
                None => {
                    for _ in 0..IF_COUNTERS {
                        line.push_str("; 0");
                    }
                    line.push_str("; -; -");
                }
            }
        }
        for v in deltas.snmp {
            let _ = write!(line, "; {v}");
        }

        self.emit(&line)
    }

    /// Flushes anything the destination still holds.
    pub fn flush(&mut self) -> Result<(), SinkError> {
        self.out.flush()?;
        Ok(())
    }

    pub fn header_written(&self) -> bool {
        self.layout.is_some()
    }

    /// Lines written so far, header included.
    pub fn lines(&self) -> u64 {
        self.lines
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    fn emit(&mut self, line: &str) -> Result<(), SinkError> {
        self.out.write_all(line.as_bytes())?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        self.lines += 1;
        Ok(())
    }
}

fn rate(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}"),
        None => "-".to_string(),
    }
}
