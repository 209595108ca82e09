use std::collections::VecDeque;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, WatchError};

/// Produces grepable scan output for a set of addresses and one port.
#[allow(async_fn_in_trait)]
pub trait Scanner {
    async fn scan(&mut self, addresses: &[String], port: u16) -> Result<String>;
}

/// Runs `nmap` (or a compatible tool) as a subprocess and captures stdout.
///
/// The command line is `<program> <args...> -p <port> -oG - <addresses...>`.
#[derive(Debug, Clone)]
pub struct NmapScanner {
    program: String,
    args: Vec<String>,
}

impl NmapScanner {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn command(&self, addresses: &[String], port: u16) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg("-p")
            .arg(port.to_string())
            .args(["-oG", "-"])
            .args(addresses)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        cmd
    }
}

impl Default for NmapScanner {
    fn default() -> Self {
        Self::new("nmap", vec!["-sS".to_string()])
    }
}

impl Scanner for NmapScanner {
    async fn scan(&mut self, addresses: &[String], port: u16) -> Result<String> {
        debug!(program = %self.program, hosts = addresses.len(), port, "starting scan");
        let output = self
            .command(addresses, port)
            .output()
            .await
            .map_err(|source| WatchError::ScanSpawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(WatchError::ScanExit {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Replays canned scan outputs in order, one per call. Used to drive the
/// watcher under simulated time.
#[derive(Debug, Clone, Default)]
pub struct ScriptedScanner {
    outputs: VecDeque<String>,
    calls: usize,
}

impl ScriptedScanner {
    pub fn new<I, S>(outputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            outputs: outputs.into_iter().map(Into::into).collect(),
            calls: 0,
        }
    }

    /// Number of scans requested so far.
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl Scanner for ScriptedScanner {
    async fn scan(&mut self, _addresses: &[String], _port: u16) -> Result<String> {
        self.calls += 1;
        // Once the script runs out the last output keeps repeating.
        match self.outputs.len() {
            0 => Ok(String::new()),
            1 => Ok(self.outputs[0].clone()),
            _ => Ok(self.outputs.pop_front().unwrap_or_default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        let mut scanner = NmapScanner::new("definitely-not-a-real-scanner-binary", vec![]);
        let err = scanner
            .scan(&["127.0.0.1".to_string()], 3632)
            .await
            .unwrap_err();
        assert!(matches!(err, WatchError::ScanSpawn { .. }));
    }

    #[tokio::test]
    async fn failing_program_is_exit_error() {
        let mut scanner = NmapScanner::new("false", vec![]);
        let err = scanner.scan(&[], 3632).await.unwrap_err();
        assert!(matches!(err, WatchError::ScanExit { .. }));
    }

    #[tokio::test]
    async fn scripted_scanner_repeats_last_output() {
        let mut scanner = ScriptedScanner::new(["a", "b"]);
        assert_eq!(scanner.scan(&[], 1).await.unwrap(), "a");
        assert_eq!(scanner.scan(&[], 1).await.unwrap(), "b");
        assert_eq!(scanner.scan(&[], 1).await.unwrap(), "b");
        assert_eq!(scanner.calls(), 3);
    }
}
