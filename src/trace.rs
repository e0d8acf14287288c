//! Trace file parsing: turns lines of text (or JSON lines) into
//! [`AccessEvent`]s.
//!
//! This is thin glue around the core engine, not part of the hard
//! coherence logic, but it is built the way the rest of this codebase
//! reads input files: buffered, streaming, and wrapping I/O errors with
//! `anyhow::Context`-style messages via [`SimError`].

use std::io::BufRead;

use serde::Deserialize;

use crate::error::{SimError, SimResult};
use crate::event::{AccessEvent, AccessOp};

/// Which textual encoding a trace is read as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceFormat {
    /// `<core> <address> <load|store>` per line; blank lines and `#`
    /// comments are skipped.
    Text,
    /// One JSON object per line: `{"core": u, "address": u64, "op": "load"}`.
    JsonLines,
}

impl TraceFormat {
    /// Guess the format from a file extension, defaulting to [`TraceFormat::Text`].
    pub fn from_extension(path: &std::path::Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("jsonl") | Some("json") => TraceFormat::JsonLines,
            _ => TraceFormat::Text,
        }
    }
}

#[derive(Debug, Deserialize)]
struct JsonEvent {
    core: usize,
    address: AddressValue,
    op: String,
}

/// Accepts either a JSON number or a `"0x..."` string for the address field.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AddressValue {
    Number(u64),
    Text(String),
}

fn parse_address(token: &str) -> Option<u64> {
    let token = token.trim();
    if let Some(hex) = token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else {
        token.parse::<u64>().ok()
    }
}

/// Parse a single line of text-format trace into an event. `line_no` is the
/// 1-based line number, used only to annotate errors.
fn parse_text_line(line_no: usize, line: &str) -> SimResult<Option<AccessEvent>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    let mut fields = trimmed.split_whitespace();
    let core_token = fields.next().ok_or_else(|| SimError::EventDecode {
        line: line_no,
        message: "missing core id".to_string(),
    })?;
    let addr_token = fields.next().ok_or_else(|| SimError::EventDecode {
        line: line_no,
        message: "missing address".to_string(),
    })?;
    let op_token = fields.next().ok_or_else(|| SimError::EventDecode {
        line: line_no,
        message: "missing load/store".to_string(),
    })?;

    let core_id: usize = core_token.parse().map_err(|_| SimError::EventDecode {
        line: line_no,
        message: format!("invalid core id '{core_token}'"),
    })?;
    let address = parse_address(addr_token).ok_or_else(|| SimError::EventDecode {
        line: line_no,
        message: format!("invalid address '{addr_token}'"),
    })?;
    let op = AccessOp::parse(op_token).ok_or_else(|| SimError::EventDecode {
        line: line_no,
        message: format!("unknown op '{op_token}'"),
    })?;

    Ok(Some(AccessEvent {
        core_id,
        address,
        op,
    }))
}

fn parse_json_line(line_no: usize, line: &str) -> SimResult<Option<AccessEvent>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let parsed: JsonEvent = serde_json::from_str(trimmed).map_err(|e| SimError::EventDecode {
        line: line_no,
        message: format!("invalid JSON: {e}"),
    })?;
    let address = match parsed.address {
        AddressValue::Number(n) => n,
        AddressValue::Text(s) => parse_address(&s).ok_or_else(|| SimError::EventDecode {
            line: line_no,
            message: format!("invalid address '{s}'"),
        })?,
    };
    let op = AccessOp::parse(&parsed.op).ok_or_else(|| SimError::EventDecode {
        line: line_no,
        message: format!("unknown op '{}'", parsed.op),
    })?;
    Ok(Some(AccessEvent {
        core_id: parsed.core,
        address,
        op,
    }))
}

/// Streams [`AccessEvent`]s out of a buffered reader, one line at a time,
/// so the simulator never needs the whole trace resident in memory.
pub struct TraceReader<R> {
    reader: R,
    format: TraceFormat,
    line_no: usize,
}

impl<R: BufRead> TraceReader<R> {
    pub fn new(reader: R, format: TraceFormat) -> Self {
        Self {
            reader,
            format,
            line_no: 0,
        }
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = SimResult<AccessEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let mut buf = String::new();
            let read = match self.reader.read_line(&mut buf) {
                Ok(n) => n,
                Err(e) => return Some(Err(SimError::Io(e))),
            };
            if read == 0 {
                return None;
            }
            self.line_no += 1;
            let parsed = match self.format {
                TraceFormat::Text => parse_text_line(self.line_no, &buf),
                TraceFormat::JsonLines => parse_json_line(self.line_no, &buf),
            };
            match parsed {
                Ok(Some(event)) => return Some(Ok(event)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn events_from_text(input: &str) -> SimResult<Vec<AccessEvent>> {
        TraceReader::new(Cursor::new(input), TraceFormat::Text).collect()
    }

    #[test]
    fn parses_well_formed_text_trace() {
        let events = events_from_text("0 0x10 load\n1 32 store\n").unwrap();
        assert_eq!(
            events,
            vec![
                AccessEvent {
                    core_id: 0,
                    address: 0x10,
                    op: AccessOp::Load
                },
                AccessEvent {
                    core_id: 1,
                    address: 32,
                    op: AccessOp::Store
                },
            ]
        );
    }

    #[test]
    fn skips_blank_lines_and_comments() {
        let events = events_from_text("# a comment\n\n0 0x0 load\n").unwrap();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn reports_line_number_on_bad_op() {
        let err = events_from_text("0 0x0 load\n0 0x0 frobnicate\n").unwrap_err();
        match err {
            SimError::EventDecode { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn reports_line_number_on_missing_field() {
        let err = events_from_text("0 0x0\n").unwrap_err();
        match err {
            SimError::EventDecode { line, .. } => assert_eq!(line, 1),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parses_json_lines_trace() {
        let input = "{\"core\": 0, \"address\": 16, \"op\": \"load\"}\n";
        let events: SimResult<Vec<AccessEvent>> =
            TraceReader::new(Cursor::new(input), TraceFormat::JsonLines).collect();
        let events = events.unwrap();
        assert_eq!(events[0].address, 16);
        assert_eq!(events[0].op, AccessOp::Load);
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(
            TraceFormat::from_extension(std::path::Path::new("x.jsonl")),
            TraceFormat::JsonLines
        );
        assert_eq!(
            TraceFormat::from_extension(std::path::Path::new("x.trace")),
            TraceFormat::Text
        );
    }
}
