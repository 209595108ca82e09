use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use time::{macros::format_description, OffsetDateTime};

use crate::error::{Result, WatchError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Initialized,
    StatusChanged,
    PortChanged,
}

/// One host event, as produced by [`crate::host::HostState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEvent {
    pub kind: EventKind,
    pub address: String,
    pub hostname: String,
    pub at: OffsetDateTime,
    pub message: String,
}

impl HostEvent {
    /// `HH:MM:SS DD-MM-YYYY>>message`
    pub fn line(&self) -> String {
        format!("{}>>{}", stamp(self.at), self.message)
    }
}

fn stamp(at: OffsetDateTime) -> String {
    let fmt = format_description!("[hour]:[minute]:[second] [day]-[month]-[year]");
    at.format(fmt)
        .unwrap_or_else(|_| String::from("00:00:00 01-01-1970"))
}

/// Receiver of host events. Configured once and shared by every host.
pub trait EventSink: Send + Sync {
    fn initialization(&self, event: &HostEvent) -> Result<()>;
    fn host_event(&self, event: &HostEvent) -> Result<()>;
}

/// Writes event lines to stdout and, if a directory is set, appends them to a
/// per-host log file in it.
#[derive(Debug, Clone, Default)]
pub struct ConsoleSink {
    host_log_dir: Option<PathBuf>,
}

impl ConsoleSink {
    pub fn new(host_log_dir: Option<PathBuf>) -> Self {
        Self { host_log_dir }
    }

    fn write(&self, event: &HostEvent) -> Result<()> {
        let line = event.line();
        writeln!(std::io::stdout().lock(), "{line}")?;

        if let Some(dir) = &self.host_log_dir {
            let path = host_log_path(dir, &event.hostname, &event.address);
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|source| WatchError::Persist {
                    path: path.clone(),
                    source,
                })?;
            writeln!(file, "{line}").map_err(|source| WatchError::Persist { path, source })?;
        }
        Ok(())
    }
}

impl EventSink for ConsoleSink {
    fn initialization(&self, event: &HostEvent) -> Result<()> {
        self.write(event)
    }

    fn host_event(&self, event: &HostEvent) -> Result<()> {
        self.write(event)
    }
}

/// `<dir>/hostLog_<hostname>_<address>.log`
pub fn host_log_path(dir: &Path, hostname: &str, address: &str) -> PathBuf {
    dir.join(format!("hostLog_{hostname}_{address}.log"))
}

/// Keeps every event in memory. Handy for embedding and tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<HostEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<HostEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&self, event: &HostEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event.clone());
    }
}

impl EventSink for MemorySink {
    fn initialization(&self, event: &HostEvent) -> Result<()> {
        self.push(event);
        Ok(())
    }

    fn host_event(&self, event: &HostEvent) -> Result<()> {
        self.push(event);
        Ok(())
    }
}
