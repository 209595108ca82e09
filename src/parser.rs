//! Parser for grepable (`-oG`) scan output.
//!
//! Two line shapes are recognised:
//! - `Host: <ip> (<hostname>) Status: <status>`
//! - `Host: <ip> (<hostname>) Ports: <port>/<state>/<tproto>//<aproto>///[, ...]`
//!
//! The parser keeps a single pending status line. The line following it is
//! always consumed: if it is a ports line for the same host its first port
//! group is merged, otherwise it is dropped. A status line that directly
//! follows another status line is therefore lost, and so is a status line
//! that ends the input.
use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::error::{Result, WatchError};
use crate::types::{HostRecord, HostStatus, PortState};

const IP: &str = r"[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}";
const PORT_GROUP: &str = r"[0-9]*/[a-z]*/[a-z]*//[\w.-]*///";

fn status_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let pattern =
            format!(r"^Host:\s*(?P<ip>{IP})\s*\((?P<host>.*)\)\s*Status:\s*(?P<status>.*)$");
        Regex::new(&pattern).expect("status pattern is valid")
    })
}

fn ports_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Only the first group is captured; later groups just have to be well formed.
        // A trailing tab-separated field (e.g. `Ignored State:`) is tolerated.
        let pattern = format!(
            r"^Host:\s*(?P<ip>{IP})\s*\((?P<host>.*)\)\s*Ports:\s*(?P<port>[0-9]*)/(?P<state>[a-z]*)/(?P<tproto>[a-z]*)//(?P<aproto>[\w.-]*)///(?:,\s?{PORT_GROUP})*\s*(?:\t.*)?$"
        );
        Regex::new(&pattern).expect("ports pattern is valid")
    })
}

/// Ports line that named a different host than the status line before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortsConflict {
    pub address: String,
    pub hostname: String,
}

/// A parsed host record, plus the conflicting ports line if one was seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRecord {
    pub record: HostRecord,
    pub conflict: Option<PortsConflict>,
}

impl ParsedRecord {
    /// Turn a conflict into [`WatchError::ParseInconsistency`].
    pub fn into_checked(self) -> Result<HostRecord> {
        match self.conflict {
            None => Ok(self.record),
            Some(c) => Err(WatchError::ParseInconsistency {
                address: self.record.address().to_string(),
                hostname: self.record.hostname().to_string(),
                ports_address: c.address,
                ports_hostname: c.hostname,
            }),
        }
    }
}

struct StatusLine {
    address: String,
    hostname: String,
    status: HostStatus,
}

struct PortsLine {
    address: String,
    hostname: String,
    port: String,
    state: PortState,
    transport: String,
    application: String,
}

fn group<'t>(caps: &Captures<'t>, name: &str) -> &'t str {
    caps.name(name).map_or("", |m| m.as_str())
}

fn match_status(line: &str) -> Option<StatusLine> {
    let caps = status_re().captures(line)?;
    Some(StatusLine {
        address: group(&caps, "ip").to_string(),
        hostname: group(&caps, "host").to_string(),
        status: HostStatus::from_word(group(&caps, "status")),
    })
}

fn match_ports(line: &str) -> Option<PortsLine> {
    let caps = ports_re().captures(line)?;
    Some(PortsLine {
        address: group(&caps, "ip").to_string(),
        hostname: group(&caps, "host").to_string(),
        port: group(&caps, "port").to_string(),
        state: PortState::from_word(group(&caps, "state")),
        transport: group(&caps, "tproto").to_string(),
        application: group(&caps, "aproto").to_string(),
    })
}

/// Parse scan output lines into host records, in input order.
pub fn parse_lines<'a, I>(lines: I) -> Vec<ParsedRecord>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out = Vec::new();
    let mut pending: Option<StatusLine> = None;

    for line in lines {
        let Some(status) = pending.take() else {
            pending = match_status(line);
            continue;
        };

        let mut builder = HostRecord::builder(status.address.as_str())
            .hostname(status.hostname.as_str())
            .status(status.status);
        let mut conflict = None;

        if let Some(ports) = match_ports(line) {
            if ports.address == status.address && ports.hostname == status.hostname {
                builder = builder
                    .port(ports.port)
                    .port_state(ports.state)
                    .transport_protocol(ports.transport)
                    .application_protocol(ports.application);
            } else {
                conflict = Some(PortsConflict {
                    address: ports.address,
                    hostname: ports.hostname,
                });
            }
        }

        out.push(ParsedRecord {
            record: builder.build(),
            conflict,
        });
    }

    out
}

/// Parse a whole block of scan output.
pub fn parse_str(text: &str) -> Vec<ParsedRecord> {
    parse_lines(text.lines())
}
