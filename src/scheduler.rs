use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::clock::Clock;
use crate::error::{Result, WatchError};
use crate::scanner::Scanner;
use crate::watch::WatchCoordinator;

/// A task that fires once its tick counter reaches `interval`.
///
/// The counter is checked, reset on firing, and then advanced by one on
/// every tick whether or not the task fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodicTask {
    interval: u64,
    elapsed: u64,
}

impl PeriodicTask {
    pub fn new(interval: u64) -> Self {
        Self {
            interval,
            elapsed: 0,
        }
    }

    /// Advance one tick. Returns true when the task is due this tick.
    pub fn tick(&mut self) -> bool {
        let due = self.elapsed >= self.interval;
        if due {
            self.elapsed = 0;
        }
        self.elapsed += 1;
        due
    }

    pub fn elapsed(&self) -> u64 {
        self.elapsed
    }
}

/// Overwrites the summary file with one line per host.
#[derive(Debug, Clone)]
pub struct SummaryWriter {
    path: PathBuf,
}

impl SummaryWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, lines: &[String]) -> Result<()> {
        std::fs::write(&self.path, lines.join("\n")).map_err(|source| WatchError::Persist {
            path: self.path.clone(),
            source,
        })
    }
}

/// What happened during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub scanned: bool,
    pub flushed: bool,
}

/// Cooperative loop with two periodic tasks: scan and summary flush.
pub struct Scheduler<S, C> {
    watch: WatchCoordinator<S, C>,
    summary: SummaryWriter,
    scan: PeriodicTask,
    flush: PeriodicTask,
    tick_period: Duration,
}

impl<S: Scanner, C: Clock> Scheduler<S, C> {
    pub fn new(
        watch: WatchCoordinator<S, C>,
        summary: SummaryWriter,
        scan_interval: u64,
        log_interval: u64,
        tick_period: Duration,
    ) -> Self {
        Self {
            watch,
            summary,
            scan: PeriodicTask::new(scan_interval),
            flush: PeriodicTask::new(log_interval),
            tick_period,
        }
    }

    /// Run one tick: scan and/or flush if due. Any error ends the tick.
    pub async fn tick(&mut self) -> Result<TickReport> {
        let mut report = TickReport::default();
        let scan_due = self.scan.tick();
        let flush_due = self.flush.tick();

        if scan_due {
            info!("scan running");
            let applied = self.watch.scan_cycle().await?;
            info!(records = applied, "scan finished");
            report.scanned = true;
        }
        if flush_due {
            self.flush_summary()?;
            report.flushed = true;
        }
        Ok(report)
    }

    /// Write the summary file now.
    pub fn flush_summary(&self) -> Result<()> {
        let lines = self.watch.summaries();
        self.summary.write(&lines)?;
        info!(path = %self.summary.path().display(), hosts = lines.len(), "summary written");
        Ok(())
    }

    /// Tick forever, sleeping one tick period between ticks, until cancelled.
    ///
    /// Cancellation is only observed between ticks; a scan in progress runs
    /// to completion.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<()> {
        loop {
            if cancel.is_cancelled() {
                return Ok(());
            }
            self.tick().await?;
            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                _ = tokio::time::sleep(self.tick_period) => {}
            }
        }
    }

    pub fn watch(&self) -> &WatchCoordinator<S, C> {
        &self.watch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_fires_every_interval_ticks() {
        let mut task = PeriodicTask::new(5);
        let fired: Vec<usize> = (0..16).filter(|_| task.tick()).collect();
        assert_eq!(fired, vec![5, 10, 15]);
    }

    #[test]
    fn zero_interval_fires_every_tick() {
        let mut task = PeriodicTask::new(0);
        assert!((0..4).all(|_| task.tick()));
    }

    #[test]
    fn counters_advance_even_when_fired() {
        let mut task = PeriodicTask::new(2);
        task.tick();
        task.tick();
        assert!(task.tick());
        assert_eq!(task.elapsed(), 1);
    }

    #[test]
    fn summary_writer_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SummaryWriter::new(dir.path().join("log.log"));
        writer
            .write(&["a".to_string(), "b".to_string(), "c".to_string()])
            .unwrap();
        writer.write(&["only".to_string()]).unwrap();
        assert_eq!(std::fs::read_to_string(writer.path()).unwrap(), "only");
    }
}
