use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, WatchError};

/// One entry of the host-list file. Extra keys (such as the rest of a parsed
/// scan record) are ignored.
#[derive(Debug, Deserialize)]
struct HostListEntry {
    ip: String,
}

/// Parse a JSON host list into a deduplicated list of addresses.
///
/// The input is an array of objects with at least an `ip` string. Order of
/// first appearance is kept and empty addresses are skipped.
pub fn parse_host_list_str(s: &str) -> serde_json::Result<Vec<String>> {
    let entries: Vec<HostListEntry> = serde_json::from_str(s)?;
    let mut out: Vec<String> = Vec::new();
    let mut seen = HashSet::new();

    for entry in entries {
        let ip = entry.ip.trim();
        if ip.is_empty() {
            continue;
        }
        if seen.insert(ip.to_string()) {
            out.push(ip.to_string());
        }
    }

    Ok(out)
}

/// Load the watch-list from a file. Errors if the file cannot be read or parsed.
pub fn load_host_list(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| WatchError::HostListRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_host_list_str(&content).map_err(|source| WatchError::HostListFormat {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedups_and_keeps_order() {
        let input = r#"[{"ip":"10.0.0.2"},{"ip":"10.0.0.1"},{"ip":"10.0.0.2"}]"#;
        let ips = parse_host_list_str(input).unwrap();
        assert_eq!(ips, vec!["10.0.0.2", "10.0.0.1"]);
    }

    #[test]
    fn skips_empty_and_ignores_extra_keys() {
        let input = r#"[
            {"ip": "", "hostName": "nobody"},
            {"ip": "10.0.0.3", "hostName": "h3", "status": "Up", "port": "3632"}
        ]"#;
        let ips = parse_host_list_str(input).unwrap();
        assert_eq!(ips, vec!["10.0.0.3"]);
    }

    #[test]
    fn missing_ip_is_an_error() {
        assert!(parse_host_list_str(r#"[{"hostName":"h1"}]"#).is_err());
    }
}
