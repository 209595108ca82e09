use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter};

use crate::error::{Result, WatchError};
use crate::parser;
use crate::types::HostRecord;

/// Two-space indented JSON with no space after `:` (`"ip":"10.0.0.1"`).
struct TightPretty<'a>(PrettyFormatter<'a>);

impl TightPretty<'_> {
    fn new() -> Self {
        Self(PrettyFormatter::with_indent(b"  "))
    }
}

impl Formatter for TightPretty<'_> {
    fn begin_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.begin_array(writer)
    }

    fn end_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.0.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.begin_object(writer)
    }

    fn end_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.0.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b":")
    }

    fn end_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_object_value(writer)
    }
}

/// Parse a saved scan output file and write its records as indented JSON.
///
/// Ports lines that contradict their status line are ignored here: the record
/// is written with the status data alone. Returns the number of records.
pub fn convert_scan_file(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<usize> {
    let text = fs::read_to_string(input.as_ref())?;
    let records: Vec<HostRecord> = parser::parse_str(&text)
        .into_iter()
        .map(|parsed| parsed.record)
        .collect();

    let path = output.as_ref();
    let persist = |source| WatchError::Persist {
        path: path.to_path_buf(),
        source,
    };
    let mut out = BufWriter::new(File::create(path).map_err(persist)?);
    let mut ser = serde_json::Serializer::with_formatter(&mut out, TightPretty::new());
    records.serialize(&mut ser)?;
    out.flush().map_err(persist)?;
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_tight_two_space_json() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("scan.txt");
        let output = dir.path().join("out.json");
        fs::write(
            &input,
            "Host: 10.0.0.1 (h1) Status: Up\nHost: 10.0.0.1 (h1) Ports: 3632/open/tcp//distccd///\n",
        )
        .unwrap();

        assert_eq!(convert_scan_file(&input, &output).unwrap(), 1);
        let expected = "[\n  {\n    \"ip\":\"10.0.0.1\",\n    \"hostName\":\"h1\",\n    \"status\":\"Up\",\n    \"port\":\"3632\",\n    \"pStatus\":\"open\",\n    \"tProto\":\"tcp\",\n    \"aProto\":\"distccd\"\n  }\n]";
        assert_eq!(fs::read_to_string(&output).unwrap(), expected);
    }

    #[test]
    fn down_host_gets_empty_port_fields() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("scan.txt");
        let output = dir.path().join("out.json");
        // The comment line is consumed as the line after the down host.
        fs::write(
            &input,
            "Host: 10.0.0.1 (h1) Status: Up\nHost: 10.0.0.1 (h1) Ports: 3632/open/tcp//distccd///\nHost: 10.0.0.2 () Status: Down\n# Nmap done\n",
        )
        .unwrap();

        assert_eq!(convert_scan_file(&input, &output).unwrap(), 2);
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        let second = &value[1];
        assert_eq!(second["ip"], "10.0.0.2");
        assert_eq!(second["status"], "Down");
        assert_eq!(second["port"], "");
        assert_eq!(second["pStatus"], "");
        assert_eq!(second["aProto"], "");
    }

    #[test]
    fn trailing_status_line_is_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("scan.txt");
        let output = dir.path().join("out.json");
        fs::write(&input, "Host: 10.0.0.2 () Status: Down").unwrap();

        assert_eq!(convert_scan_file(&input, &output).unwrap(), 0);
        assert_eq!(fs::read_to_string(&output).unwrap(), "[]");
    }
}
