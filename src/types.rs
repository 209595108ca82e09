use std::fmt;

use serde::{Serialize, Serializer};

/// Reachability reported by a status line.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HostStatus {
    Up,
    #[default]
    Down,
}

impl HostStatus {
    /// Anything other than `Up` counts as down.
    pub fn from_word(word: &str) -> Self {
        if word.trim() == "Up" {
            HostStatus::Up
        } else {
            HostStatus::Down
        }
    }

    pub fn is_up(self) -> bool {
        matches!(self, HostStatus::Up)
    }
}

impl fmt::Display for HostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostStatus::Up => f.write_str("Up"),
            HostStatus::Down => f.write_str("Down"),
        }
    }
}

/// State of the watched port. `Unknown` covers hosts without a ports line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PortState {
    Open,
    Closed,
    Filtered,
    #[default]
    Unknown,
}

impl PortState {
    /// Unrecognised or empty words map to `Unknown`.
    pub fn from_word(word: &str) -> Self {
        match word.trim() {
            "open" => PortState::Open,
            "closed" => PortState::Closed,
            "filtered" => PortState::Filtered,
            _ => PortState::Unknown,
        }
    }

    pub fn is_open(self) -> bool {
        matches!(self, PortState::Open)
    }

    /// Spelling used in grepable output; empty for `Unknown`.
    pub fn as_grepable(self) -> &'static str {
        match self {
            PortState::Open => "open",
            PortState::Closed => "closed",
            PortState::Filtered => "filtered",
            PortState::Unknown => "",
        }
    }
}

impl fmt::Display for PortState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortState::Unknown => f.write_str("unknown"),
            other => f.write_str(other.as_grepable()),
        }
    }
}

impl Serialize for PortState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_grepable())
    }
}

/// One host as described by a status line and, optionally, the ports line after it.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct HostRecord {
    #[serde(rename = "ip")]
    address: String,
    #[serde(rename = "hostName")]
    hostname: String,
    status: HostStatus,
    /// Port text as it appeared in the scan, empty when absent.
    port: String,
    #[serde(rename = "pStatus")]
    port_state: PortState,
    #[serde(rename = "tProto")]
    transport_protocol: String,
    #[serde(rename = "aProto")]
    application_protocol: String,
}

impl HostRecord {
    pub fn builder(address: impl Into<String>) -> HostRecordBuilder {
        HostRecordBuilder {
            address: address.into(),
            hostname: String::new(),
            status: HostStatus::Down,
            port: String::new(),
            port_state: PortState::Unknown,
            transport_protocol: String::new(),
            application_protocol: String::new(),
        }
    }

    /// Placeholder for a watched address that has not been seen in a scan.
    pub fn placeholder(address: impl Into<String>) -> Self {
        Self::builder(address).build()
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn status(&self) -> HostStatus {
        self.status
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    /// The port as a number, if the scan text holds a valid one.
    pub fn port_number(&self) -> Option<u16> {
        self.port.parse().ok()
    }

    pub fn port_state(&self) -> PortState {
        self.port_state
    }

    pub fn transport_protocol(&self) -> &str {
        &self.transport_protocol
    }

    pub fn application_protocol(&self) -> &str {
        &self.application_protocol
    }
}

/// Builder for [`HostRecord`]. Unset fields default to a down host with no port data.
#[derive(Debug, Clone)]
pub struct HostRecordBuilder {
    address: String,
    hostname: String,
    status: HostStatus,
    port: String,
    port_state: PortState,
    transport_protocol: String,
    application_protocol: String,
}

impl HostRecordBuilder {
    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    pub fn status(mut self, status: HostStatus) -> Self {
        self.status = status;
        self
    }

    pub fn port(mut self, port: impl Into<String>) -> Self {
        self.port = port.into();
        self
    }

    pub fn port_state(mut self, port_state: PortState) -> Self {
        self.port_state = port_state;
        self
    }

    pub fn transport_protocol(mut self, proto: impl Into<String>) -> Self {
        self.transport_protocol = proto.into();
        self
    }

    pub fn application_protocol(mut self, proto: impl Into<String>) -> Self {
        self.application_protocol = proto.into();
        self
    }

    pub fn build(self) -> HostRecord {
        HostRecord {
            address: self.address,
            hostname: self.hostname,
            status: self.status,
            port: self.port,
            port_state: self.port_state,
            transport_protocol: self.transport_protocol,
            application_protocol: self.application_protocol,
        }
    }
}
