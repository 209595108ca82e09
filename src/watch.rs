use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::{Result, WatchError};
use crate::events::EventSink;
use crate::host::HostState;
use crate::parser;
use crate::scanner::Scanner;
use crate::types::HostRecord;

/// Owns the fixed watch-list and one [`HostState`] per address.
///
/// The host set is decided by [`WatchCoordinator::start`] and never grows
/// afterwards; a later scan naming an unknown address is an error.
pub struct WatchCoordinator<S, C> {
    addresses: Vec<String>,
    port: u16,
    hosts: Vec<HostState>,
    index: HashMap<String, usize>,
    scanner: S,
    clock: C,
    sink: Arc<dyn EventSink>,
}

impl<S: Scanner, C: Clock> WatchCoordinator<S, C> {
    /// Run the initial scan and create every host.
    ///
    /// Hosts seen in the first scan come first, in scan order; watched
    /// addresses missing from it follow as down placeholders.
    pub async fn start(
        addresses: Vec<String>,
        port: u16,
        scanner: S,
        clock: C,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self> {
        let mut seen = HashSet::new();
        let addresses: Vec<String> = addresses
            .into_iter()
            .filter(|a| !a.is_empty() && seen.insert(a.clone()))
            .collect();

        let mut watch = Self {
            addresses,
            port,
            hosts: Vec::new(),
            index: HashMap::new(),
            scanner,
            clock,
            sink,
        };

        info!(hosts = watch.addresses.len(), port, "running initial scan");
        let output = watch.scanner.scan(&watch.addresses, port).await?;
        watch.initialize_from(&output)?;
        info!(tracked = watch.hosts.len(), "watch initialized");
        Ok(watch)
    }

    fn initialize_from(&mut self, output: &str) -> Result<()> {
        let records = parser::parse_str(output)
            .into_iter()
            .map(|parsed| parsed.into_checked())
            .collect::<Result<Vec<_>>>()?;
        let now = self.clock.now();

        for record in &records {
            if let Some(&i) = self.index.get(record.address()) {
                self.hosts[i].update(record, now)?;
                continue;
            }
            if !self.addresses.iter().any(|a| a == record.address()) {
                warn!(address = record.address(), "initial scan reported an address outside the host list");
            }
            self.insert(HostState::initialize(record, now, self.sink.clone())?);
        }

        let missing: Vec<String> = self
            .addresses
            .iter()
            .filter(|a| !self.index.contains_key(a.as_str()))
            .cloned()
            .collect();
        for address in missing {
            let placeholder = HostRecord::placeholder(address);
            self.insert(HostState::initialize(&placeholder, now, self.sink.clone())?);
        }
        Ok(())
    }

    fn insert(&mut self, host: HostState) {
        self.index.insert(host.address().to_string(), self.hosts.len());
        self.hosts.push(host);
    }

    /// Run one steady-state scan and apply it. Returns the number of records applied.
    pub async fn scan_cycle(&mut self) -> Result<usize> {
        let output = self.scanner.scan(&self.addresses, self.port).await?;
        self.apply_scan(&output)
    }

    /// Apply steady-state scan output.
    ///
    /// The whole output is checked before any host is touched: a ports line
    /// for the wrong host or an address outside the watch-list fails the cycle
    /// and leaves every host as it was.
    pub fn apply_scan(&mut self, output: &str) -> Result<usize> {
        let records = parser::parse_str(output)
            .into_iter()
            .map(|parsed| parsed.into_checked())
            .collect::<Result<Vec<_>>>()?;

        let mut targets = Vec::with_capacity(records.len());
        for record in &records {
            let i = self
                .index
                .get(record.address())
                .copied()
                .ok_or_else(|| WatchError::UnknownHost {
                    address: record.address().to_string(),
                })?;
            targets.push(i);
        }

        let now = self.clock.now();
        for (record, i) in records.iter().zip(targets) {
            debug!(address = record.address(), status = %record.status(), port = %record.port_state(), "applying record");
            self.hosts[i].update(record, now)?;
        }
        Ok(records.len())
    }

    /// Summary lines for every host, in insertion order.
    pub fn summaries(&self) -> Vec<String> {
        let now = self.clock.now();
        self.hosts.iter().map(|h| h.summary(now)).collect()
    }

    pub fn hosts(&self) -> &[HostState] {
        &self.hosts
    }

    pub fn host(&self, address: &str) -> Option<&HostState> {
        self.index.get(address).map(|&i| &self.hosts[i])
    }

    pub fn addresses(&self) -> &[String] {
        &self.addresses
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn scanner(&self) -> &S {
        &self.scanner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::events::MemorySink;
    use crate::scanner::ScriptedScanner;
    use crate::types::HostStatus;
    use time::Duration;

    const INIT: &str = "# Nmap 7.80 scan initiated\n\
Host: 10.0.0.1 (h1)\tStatus: Up\n\
Host: 10.0.0.1 (h1)\tPorts: 3632/open/tcp//distccd///\n\
# Nmap done\n";

    fn ips(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    async fn started(
        addresses: &[&str],
        outputs: &[&str],
    ) -> (WatchCoordinator<ScriptedScanner, ManualClock>, ManualClock, Arc<MemorySink>) {
        let clock = ManualClock::at_epoch();
        let sink = Arc::new(MemorySink::new());
        let watch = WatchCoordinator::start(
            ips(addresses),
            3632,
            ScriptedScanner::new(outputs.iter().copied()),
            clock.clone(),
            sink.clone(),
        )
        .await
        .unwrap();
        (watch, clock, sink)
    }

    #[tokio::test]
    async fn start_adds_placeholders_after_scanned_hosts() {
        let (watch, _, sink) = started(&["10.0.0.2", "10.0.0.1", "10.0.0.2", ""], &[INIT]).await;
        let order: Vec<&str> = watch.hosts().iter().map(|h| h.address()).collect();
        assert_eq!(order, vec!["10.0.0.1", "10.0.0.2"]);
        assert_eq!(watch.addresses(), &ips(&["10.0.0.2", "10.0.0.1"])[..]);
        assert_eq!(watch.host("10.0.0.2").unwrap().status(), HostStatus::Down);
        assert_eq!(sink.len(), 2);
    }

    #[tokio::test]
    async fn unknown_host_fails_cycle() {
        let (mut watch, _, _) = started(&["10.0.0.1"], &[INIT]).await;
        let err = watch
            .apply_scan("Host: 10.9.9.9 (stranger) Status: Up\n\n")
            .unwrap_err();
        assert!(matches!(err, WatchError::UnknownHost { ref address } if address == "10.9.9.9"));
    }

    #[tokio::test]
    async fn failed_cycle_leaves_hosts_untouched() {
        let (mut watch, clock, sink) = started(&["10.0.0.1"], &[INIT]).await;
        clock.advance(Duration::seconds(5));
        let output = "Host: 10.0.0.1 (h1) Status: Down\n\nHost: 10.9.9.9 () Status: Up\n\n";
        assert!(watch.apply_scan(output).is_err());
        let host = watch.host("10.0.0.1").unwrap();
        assert_eq!(host.status(), HostStatus::Up);
        assert_eq!(sink.len(), 1);
    }

    #[tokio::test]
    async fn mismatched_ports_line_is_inconsistency() {
        let (mut watch, _, _) = started(&["10.0.0.1", "10.0.0.2"], &[INIT]).await;
        let output = "Host: 10.0.0.1 (h1) Status: Up\nHost: 10.0.0.2 (h2) Ports: 3632/open/tcp//distccd///\n";
        let err = watch.apply_scan(output).unwrap_err();
        assert!(matches!(err, WatchError::ParseInconsistency { .. }));
    }

    #[tokio::test]
    async fn scan_cycle_updates_matching_host() {
        let down = "Host: 10.0.0.1 (h1)\tStatus: Down\n# Nmap done\n";
        let (mut watch, clock, sink) = started(&["10.0.0.1"], &[INIT, down]).await;
        clock.advance(Duration::seconds(10));
        assert_eq!(watch.scan_cycle().await.unwrap(), 1);
        let host = watch.host("10.0.0.1").unwrap();
        assert_eq!(host.status(), HostStatus::Down);
        assert_eq!(host.status_history().len(), 2);
        // init + status change + port change (open -> unknown)
        assert_eq!(sink.len(), 3);
        assert_eq!(watch.scanner().calls(), 2);
    }
}
