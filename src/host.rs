use std::sync::Arc;

use time::OffsetDateTime;

use crate::error::Result;
use crate::events::{EventKind, EventSink, HostEvent};
use crate::history::{Span, ToggleHistory, Uptime};
use crate::types::{HostRecord, HostStatus, PortState};

/// Status and uptime bookkeeping for one watched address.
///
/// Hostname, port, and protocols are bound once, from the first record that
/// carries a hostname, and never change afterwards.
pub struct HostState {
    address: String,
    hostname: String,
    port: String,
    transport_protocol: String,
    application_protocol: String,
    status: HostStatus,
    port_state: PortState,
    status_history: ToggleHistory,
    port_history: ToggleHistory,
    watch_start: OffsetDateTime,
    last_update: OffsetDateTime,
    sink: Arc<dyn EventSink>,
}

impl HostState {
    /// Create and initialize a host from its first record.
    pub fn initialize(
        record: &HostRecord,
        now: OffsetDateTime,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self> {
        let mut host = Self {
            address: record.address().to_string(),
            hostname: String::new(),
            port: String::new(),
            transport_protocol: String::new(),
            application_protocol: String::new(),
            status: record.status(),
            port_state: record.port_state(),
            status_history: ToggleHistory::new(),
            port_history: ToggleHistory::new(),
            watch_start: now,
            last_update: now,
            sink,
        };
        host.bind_identity(record);

        if host.status.is_up() {
            host.status_history.push(now);
        }
        if host.port_state.is_open() {
            host.port_history.push(now);
        }

        let event = host.event(
            EventKind::Initialized,
            now,
            format!("initialized. Status: {}", host.status),
        );
        host.sink.initialization(&event)?;
        Ok(host)
    }

    /// Apply a fresh observation. Emits one event per changed field and
    /// nothing when the record matches the current state.
    pub fn update(&mut self, record: &HostRecord, now: OffsetDateTime) -> Result<()> {
        self.last_update = self.last_update.max(now);

        if self.hostname.is_empty() {
            self.bind_identity(record);
        }

        if record.status() != self.status {
            self.status_history.push(now);
            self.status = record.status();
            let event = self.event(
                EventKind::StatusChanged,
                now,
                format!("changed its status. Status: {}", self.status),
            );
            self.sink.host_event(&event)?;
        }

        if record.port_state() != self.port_state {
            // The port history only tracks entering and leaving `open`.
            if record.port_state().is_open() != self.port_state.is_open() {
                self.port_history.push(now);
            }
            self.port_state = record.port_state();
            let event = self.event(
                EventKind::PortChanged,
                now,
                format!("updated. Port status: {}", self.port_state),
            );
            self.sink.host_event(&event)?;
        }

        Ok(())
    }

    fn bind_identity(&mut self, record: &HostRecord) {
        if record.hostname().is_empty() {
            return;
        }
        self.hostname = record.hostname().to_string();
        self.port = record.port().to_string();
        self.transport_protocol = record.transport_protocol().to_string();
        self.application_protocol = record.application_protocol().to_string();
    }

    fn event(&self, kind: EventKind, at: OffsetDateTime, what: String) -> HostEvent {
        HostEvent {
            kind,
            address: self.address.clone(),
            hostname: self.hostname.clone(),
            at,
            message: format!("Host {}:{} {}", self.hostname, self.address, what),
        }
    }

    /// Active time recorded in `history` against time since the watch started.
    pub fn compute_uptime(&self, history: &ToggleHistory, now: OffsetDateTime) -> Uptime {
        Uptime::new(history.active_duration(now), now - self.watch_start)
    }

    pub fn host_uptime(&self, now: OffsetDateTime) -> Uptime {
        self.compute_uptime(&self.status_history, now)
    }

    pub fn port_uptime(&self, now: OffsetDateTime) -> Uptime {
        self.compute_uptime(&self.port_history, now)
    }

    /// One summary line for the persisted statistics file.
    pub fn summary(&self, now: OffsetDateTime) -> String {
        let host = self.host_uptime(now);
        let port = self.port_uptime(now);
        format!(
            "Host: {}; ip: {}; Host UpTime: {} of overall watch time: {}; Proto UpTime: {} of overall watch time: {}.",
            self.hostname,
            self.address,
            Span(host.up),
            Span(host.observed),
            Span(port.up),
            Span(port.observed),
        )
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn transport_protocol(&self) -> &str {
        &self.transport_protocol
    }

    pub fn application_protocol(&self) -> &str {
        &self.application_protocol
    }

    pub fn status(&self) -> HostStatus {
        self.status
    }

    pub fn port_state(&self) -> PortState {
        self.port_state
    }

    pub fn status_history(&self) -> &ToggleHistory {
        &self.status_history
    }

    pub fn port_history(&self) -> &ToggleHistory {
        &self.port_history
    }

    pub fn watch_start(&self) -> OffsetDateTime {
        self.watch_start
    }

    pub fn last_update(&self) -> OffsetDateTime {
        self.last_update
    }
}
