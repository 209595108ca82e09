//! Library crate for lan-uptime-rs: grepable scan parsing, per-host uptime
//! tracking, and the polling scheduler that ties them together.
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod history;
pub mod host;
pub mod hostlist;
pub mod offline;
pub mod parser;
pub mod scanner;
pub mod scheduler;
pub mod types;
pub mod watch;
