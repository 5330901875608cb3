//! The sampling/reporting loop.
//!
//! `Monitor` owns the snapshot store, the elapsed-time clock and the report
//! sink, and reacts to [`Event`]s from a single channel. Everything runs
//! on the thread that calls [`Monitor::run`].

use std::io::Write;
use std::sync::mpsc::Receiver;

use tracing::{debug, error, info};

use crate::clock::{Clock, time_alive_secs};
use crate::collector::CounterSource;
use crate::error::MonitorError;
use crate::report::{ReportSink, SinkError};
use crate::scheduler::{Event, SchedulerState};
use crate::store::SnapshotStore;

pub struct Monitor<S, C, W: Write> {
    store: SnapshotStore<S>,
    clock: C,
    sink: ReportSink<W>,
    state: SchedulerState,
    /// Intervals reported so far.
    reports: u64,
}

impl<S: CounterSource, C: Clock, W: Write> Monitor<S, C, W> {
    pub fn new(source: S, clock: C, sink: ReportSink<W>) -> Self {
        Self {
            store: SnapshotStore::new(source),
            clock,
            sink,
            state: SchedulerState::Idle,
            reports: 0,
        }
    }

    /// Takes the time-zero snapshot, starts the clock epoch and writes the
    /// header.
    ///
    /// `timer_armed` tells the monitor whether ticks will follow.
    pub fn start(&mut self, timer_armed: bool) -> Result<(), MonitorError> {
        if self.sink.header_written() {
            return Err(SinkError::HeaderTwice.into());
        }
        self.store.refresh(0).map_err(MonitorError::Baseline)?;
        self.clock.start();

        if let Some(baseline) = self.store.current() {
            debug!(
                "baseline: {} interfaces, TcpInSegs {}",
                baseline.interfaces.len(),
                baseline.snmp.get("TcpInSegs").unwrap_or(0)
            );
            self.sink.write_header(baseline)?;
        }

        if timer_armed {
            self.transition(SchedulerState::Armed);
        }
        Ok(())
    }

    /// One reporting cycle: sample, derive, emit.
    ///
    /// Returns the reported time-alive, or `None` when the counters could not
    /// be read this cycle (the previous snapshot is kept for the next one).
    pub fn on_tick(&mut self) -> Result<Option<u64>, MonitorError> {
        let resume = self.state;
        self.transition(SchedulerState::Reporting);

        self.clock.stop();
        let elapsed = self.clock.elapsed_micros();
        let alive = time_alive_secs(elapsed);

        if let Err(e) = self.store.refresh(elapsed) {
            error!("Failed to collect counters: {}", e);
            self.transition(resume);
            return Ok(None);
        }

        let deltas = self.store.compute_deltas();
        if let Some(current) = self.store.current() {
            self.sink.write_record(alive, current, &deltas)?;
        }
        self.reports += 1;

        self.transition(resume);
        Ok(Some(alive))
    }

    /// Handles events until a shutdown arrives, then flushes the sink.
    ///
    /// A closed channel is treated as a shutdown.
    pub fn run(&mut self, events: &Receiver<Event>) -> Result<(), MonitorError> {
        while let Ok(event) = events.recv() {
            match event {
                Event::Tick => {
                    self.on_tick()?;
                }
                Event::Shutdown => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }
        self.shutdown()
    }

    /// Flushes pending output and marks the loop terminated.
    pub fn shutdown(&mut self) -> Result<(), MonitorError> {
        self.transition(SchedulerState::Terminated);
        self.sink.flush()?;
        info!("{} intervals reported, process ended", self.reports);
        Ok(())
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn reports(&self) -> u64 {
        self.reports
    }

    pub fn store(&self) -> &SnapshotStore<S> {
        &self.store
    }

    pub fn sink(&self) -> &ReportSink<W> {
        &self.sink
    }

    fn transition(&mut self, to: SchedulerState) {
        if self.state != to {
            debug!("scheduler: {} -> {}", self.state, to);
            self.state = to;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::tests::ManualClock;
    use crate::model::CounterSnapshot;
    use crate::store::tests::{ScriptedSource, iface, snapshot};
    use std::sync::mpsc;

    type TestMonitor = Monitor<ScriptedSource, ManualClock, Vec<u8>>;

    fn monitor(readings: Vec<CounterSnapshot>, step_secs: i64) -> TestMonitor {
        Monitor::new(
            ScriptedSource::new(readings),
            ManualClock::stepping(step_secs * 1_000_000),
            ReportSink::new(Vec::new()),
        )
    }

    fn output(m: &TestMonitor) -> Vec<String> {
        String::from_utf8(m.sink().get_ref().clone())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn growing(n: u64) -> CounterSnapshot {
        snapshot(&[("eth0", iface(n * 1_000_000, n * 500_000))], n * 10)
    }

    #[test]
    fn start_writes_only_the_header() {
        let mut m = monitor(vec![growing(0)], 2);
        m.start(true).unwrap();

        let lines = output(&m);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("Time sec; eth0:rx_bytes"));
        assert_eq!(m.state(), SchedulerState::Armed);
    }

    #[test]
    fn second_start_is_rejected_without_sampling() {
        let mut m = monitor(vec![growing(0), growing(1)], 2);
        m.start(true).unwrap();
        let err = m.start(true).unwrap_err();
        assert!(matches!(err, MonitorError::Sink(SinkError::HeaderTwice)));
        assert_eq!(output(&m).len(), 1);
        assert!(m.store().previous().is_none());
    }

    #[test]
    fn deltas_at_time_zero_are_raw() {
        let mut m = monitor(vec![growing(3)], 2);
        m.start(true).unwrap();

        let d = m.store().compute_deltas();
        assert_eq!(d.interval_secs, None);
        assert!(d.interfaces["eth0"].baseline);
        assert_eq!(d.interfaces["eth0"].values[0], 3_000_000);
    }

    #[test]
    fn baseline_failure_is_fatal() {
        let mut m = monitor(Vec::new(), 2);
        assert!(matches!(m.start(true), Err(MonitorError::Baseline(_))));
        assert!(output(&m).is_empty());
    }

    #[test]
    fn two_ticks_in_five_seconds() {
        let (tx, rx) = mpsc::channel();
        let mut m = monitor(vec![growing(0), growing(1), growing(2)], 2);
        m.start(true).unwrap();

        // timer fires at t=2 and t=4; shutdown at t=5
        tx.send(Event::Tick).unwrap();
        tx.send(Event::Tick).unwrap();
        tx.send(Event::Shutdown).unwrap();
        m.run(&rx).unwrap();

        let lines = output(&m);
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("2 ; 1000000; 10000;"));
        assert!(lines[2].starts_with("4 ; 1000000; 10000;"));
        assert!(lines.iter().skip(1).all(|l| !l.starts_with("Time")));
        assert_eq!(m.reports(), 2);
        assert_eq!(m.state(), SchedulerState::Terminated);
    }

    #[test]
    fn record_fields_do_not_decrease_for_steady_traffic() {
        let (tx, rx) = mpsc::channel();
        let readings = (0..6).map(|n| growing(n * n)).collect();
        let mut m = monitor(readings, 1);
        m.start(true).unwrap();
        for _ in 0..5 {
            tx.send(Event::Tick).unwrap();
        }
        tx.send(Event::Shutdown).unwrap();
        m.run(&rx).unwrap();

        let lines = output(&m);
        let rx_bytes: Vec<u64> = lines[1..]
            .iter()
            .map(|l| l.split("; ").nth(1).unwrap().parse().unwrap())
            .collect();
        assert_eq!(rx_bytes.len(), 5);
        assert!(rx_bytes.windows(2).all(|w| w[1] >= w[0]));

        let alive: Vec<u64> = lines[1..]
            .iter()
            .map(|l| l.split(' ').next().unwrap().parse().unwrap())
            .collect();
        assert_eq!(alive, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn idle_mode_emits_header_only() {
        let (tx, rx) = mpsc::channel();
        let mut m = monitor(vec![growing(0)], 2);
        m.start(false).unwrap();
        assert_eq!(m.state(), SchedulerState::Idle);

        tx.send(Event::Shutdown).unwrap();
        m.run(&rx).unwrap();

        assert_eq!(output(&m).len(), 1);
        assert_eq!(m.reports(), 0);
    }

    #[test]
    fn failed_sample_skips_the_cycle() {
        let (tx, rx) = mpsc::channel();
        // only baseline + one reading; the second tick finds the source empty
        let mut m = monitor(vec![growing(0), growing(1)], 2);
        m.start(true).unwrap();
        tx.send(Event::Tick).unwrap();
        tx.send(Event::Tick).unwrap();
        tx.send(Event::Shutdown).unwrap();
        m.run(&rx).unwrap();

        assert_eq!(output(&m).len(), 2);
        assert_eq!(m.reports(), 1);
        assert_eq!(m.store().current().unwrap().taken_at_micros, 2_000_000);
    }

    #[test]
    fn closed_channel_ends_the_loop() {
        let (tx, rx) = mpsc::channel::<Event>();
        let mut m = monitor(vec![growing(0)], 2);
        m.start(true).unwrap();
        drop(tx);
        m.run(&rx).unwrap();
        assert_eq!(m.state(), SchedulerState::Terminated);
    }

    #[test]
    fn header_exactly_once_across_many_ticks() {
        let (tx, rx) = mpsc::channel();
        let readings = (0..21).map(growing).collect();
        let mut m = monitor(readings, 1);
        m.start(true).unwrap();
        for _ in 0..20 {
            tx.send(Event::Tick).unwrap();
        }
        tx.send(Event::Shutdown).unwrap();
        m.run(&rx).unwrap();

        let lines = output(&m);
        assert_eq!(lines.len(), 21);
        assert_eq!(lines.iter().filter(|l| l.starts_with("Time sec")).count(), 1);
        assert!(lines[0].starts_with("Time sec"));
    }
}
