//! Startup sequencing and the steady-state wait.
//!
//! Termination handlers are registered by the caller before anything here
//! runs; they only ever push [`Event::Shutdown`] onto `events`.

use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::affinity::{self, Affinity};
use crate::clock::{SelfTest, StopWatch, self_test};
use crate::collector::{NetCollector, RealFs};
use crate::config::Config;
use crate::error::MonitorError;
use crate::monitor::Monitor;
use crate::report::{OutputTarget, ReportSink};
use crate::scheduler::{Event, IntervalTimer};

/// How long the startup clock self-test sleeps.
pub const SELF_TEST_WAIT: Duration = Duration::from_secs(1);

/// Runs the monitor until a shutdown event arrives.
///
/// Steps, in order: CPU affinity, clock calibration, clock self-test,
/// output open, timer arm, baseline snapshot and clock epoch, header, then
/// the event loop. Each fatal failure returns before any later step runs.
pub fn run(
    config: &Config,
    events: &Receiver<Event>,
    sender: &Sender<Event>,
) -> Result<(), MonitorError> {
    if let Affinity::Mask(mask) = &config.affinity {
        debug!("cpu mask selects core(s) {}", mask);
    }
    match affinity::apply(&config.affinity) {
        Ok(Some(cores)) => info!("CPU affinity set to core(s) {:?}", cores),
        Ok(None) => debug!("CPU affinity not set"),
        Err(e) => warn!("Failed to set CPU affinity: {}", e),
    }

    let granularity = StopWatch::calibrate()?;
    debug!("monotonic clock step: {:?}", granularity);

    // Always run; quiet only hides the measurement.
    match self_test(SELF_TEST_WAIT, events) {
        SelfTest::Measured(us) if !config.quiet => info!("clock ticks for 1 sec = {} us", us),
        SelfTest::Measured(_) => {}
        SelfTest::Interrupted => {
            info!("Received shutdown signal during startup");
            return Ok(());
        }
    }
    if shutdown_pending(events) {
        info!("Received shutdown signal during startup");
        return Ok(());
    }

    if let OutputTarget::File(path) = &config.output {
        info!("Stats file name {}", path.display());
    }
    let sink = ReportSink::new(config.output.open()?);

    let timer = match config.interval {
        Some(interval) => {
            let timer = IntervalTimer::arm(interval, sender.clone())?;
            debug!("interval: {:?}", timer.interval());
            Some(timer)
        }
        None => {
            info!("No reporting interval set; idling until terminated");
            None
        }
    };

    let collector = NetCollector::new(RealFs::new(), config.proc_path.clone());
    debug!("reading counters from {}", collector.proc_path());
    let mut monitor = Monitor::new(collector, StopWatch::new(), sink);
    monitor.start(timer.is_some())?;

    let result = monitor.run(events);
    if let Some(timer) = timer {
        timer.disarm();
    }
    result
}

/// Consumes a queued shutdown request, if any.
///
/// Only valid before the timer is armed, when nothing else can be queued.
fn shutdown_pending(events: &Receiver<Event>) -> bool {
    match events.try_recv() {
        Ok(Event::Shutdown) => true,
        Ok(Event::Tick) | Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::MockFs;
    use crate::scheduler::TimerError;
    use std::path::Path;
    use std::sync::mpsc;

    fn fixture_proc(dir: &Path) {
        let net = dir.join("net");
        std::fs::create_dir_all(&net).unwrap();
        std::fs::write(
            net.join("dev"),
            MockFs::net_dev_table(&[("eth0", 1000, 2000), ("lo", 50, 50)]),
        )
        .unwrap();
    }

    fn quiet_config(proc: &Path, out: &Path) -> Config {
        Config {
            output: OutputTarget::File(out.to_path_buf()),
            quiet: true,
            proc_path: proc.display().to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn idle_run_writes_header_and_stops_on_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        fixture_proc(dir.path());
        let out = dir.path().join("stats.txt");
        let config = quiet_config(dir.path(), &out);

        let (tx, rx) = mpsc::channel();
        let signaller = tx.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(200));
            signaller.send(Event::Shutdown).unwrap();
        });

        run(&config, &rx, &tx).unwrap();
        handle.join().unwrap();

        let contents = std::fs::read_to_string(&out).unwrap();
        assert_eq!(contents.lines().count(), 1);
        assert!(contents.starts_with("Time sec; eth0:rx_bytes"));
    }

    #[test]
    fn unwritable_output_fails_before_header() {
        let dir = tempfile::tempdir().unwrap();
        fixture_proc(dir.path());
        let config = quiet_config(dir.path(), dir.path());

        let (tx, rx) = mpsc::channel();
        let err = run(&config, &rx, &tx).unwrap_err();
        assert!(matches!(err, MonitorError::Sink(_)));
    }

    #[test]
    fn shutdown_before_start_is_clean() {
        let dir = tempfile::tempdir().unwrap();
        fixture_proc(dir.path());
        let out = dir.path().join("stats.txt");
        let config = quiet_config(dir.path(), &out);

        let (tx, rx) = mpsc::channel();
        tx.send(Event::Shutdown).unwrap();
        run(&config, &rx, &tx).unwrap();

        // stopped before the output was opened
        assert!(!out.exists());
    }

    #[test]
    fn unrepresentable_interval_fails_before_header() {
        let dir = tempfile::tempdir().unwrap();
        fixture_proc(dir.path());
        let out = dir.path().join("stats.txt");
        let config = Config {
            interval: Some(Duration::from_secs(i64::MAX as u64)),
            ..quiet_config(dir.path(), &out)
        };

        let (tx, rx) = mpsc::channel();
        let err = run(&config, &rx, &tx).unwrap_err();
        assert!(matches!(
            err,
            MonitorError::Timer(TimerError::InvalidInterval(_))
        ));
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "");
    }

    #[test]
    fn missing_proc_tree_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("stats.txt");
        let config = quiet_config(&dir.path().join("nope"), &out);

        let (tx, rx) = mpsc::channel();
        let err = run(&config, &rx, &tx).unwrap_err();
        assert!(matches!(err, MonitorError::Baseline(_)));
    }
}
