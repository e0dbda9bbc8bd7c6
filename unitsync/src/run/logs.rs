//! Parsing of the server-push log stream of a running unit

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Marker that starts a data frame
const DATA_MARKER: &str = "data:";

/// One decoded message of the log stream
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LogMessage {
    #[serde(default)]
    pub log: Option<Value>,

    #[serde(default)]
    pub ts: Option<Value>,

    #[serde(default)]
    pub slot: Option<Value>,

    #[serde(default)]
    pub memory: Option<Value>,

    #[serde(default)]
    pub cpu: Option<Value>,
}

/// Something worth surfacing from the log stream
#[derive(Debug, Clone, PartialEq)]
pub enum LogEvent {
    /// A new timestamp group starts
    Timestamp(String),
    /// A log line of the unit
    Line { slot: String, text: String },
    /// Resource usage sample; not acted upon
    Stats { memory: Option<Value>, cpu: Option<Value> },
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Splits a byte stream into lines and turns `data:` frames into events.
///
/// Chunk boundaries may fall anywhere; partial lines are buffered. A new
/// timestamp header is emitted only when it differs from the last one.
#[derive(Debug, Default)]
pub struct LogParser {
    buffer: String,
    last_ts: Option<Value>,
}

impl LogParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and collect the events it completes
    pub fn push(&mut self, chunk: &[u8]) -> Vec<LogEvent> {
        self.buffer.push_str(&String::from_utf8_lossy(chunk));
        let mut events = Vec::new();
        while let Some(pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=pos).collect();
            self.parse_line(line.trim_end_matches(['\r', '\n']), &mut events);
        }
        events
    }

    /// Flush a trailing line left when the stream ends
    pub fn finish(&mut self) -> Vec<LogEvent> {
        let mut events = Vec::new();
        let rest = std::mem::take(&mut self.buffer);
        if !rest.trim().is_empty() {
            self.parse_line(rest.trim_end(), &mut events);
        }
        events
    }

    fn parse_line(&mut self, line: &str, events: &mut Vec<LogEvent>) {
        let Some(payload) = line.strip_prefix(DATA_MARKER) else {
            return;
        };
        let message: LogMessage = match serde_json::from_str(payload.trim()) {
            Ok(message) => message,
            Err(e) => {
                debug!("Skipping unreadable log frame: {}", e);
                return;
            }
        };

        if let Some(log) = &message.log {
            if let Some(ts) = &message.ts {
                if self.last_ts.as_ref() != Some(ts) {
                    events.push(LogEvent::Timestamp(display(ts)));
                    self.last_ts = Some(ts.clone());
                }
            }
            events.push(LogEvent::Line {
                slot: message.slot.as_ref().map(display).unwrap_or_default(),
                text: display(log),
            });
        }
        if message.memory.is_some() || message.cpu.is_some() {
            events.push(LogEvent::Stats {
                memory: message.memory,
                cpu: message.cpu,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_groups_lines_by_timestamp() {
        let mut parser = LogParser::new();
        let events = parser.push(
            b"data: {\"ts\": 1, \"slot\": \"main\", \"log\": \"a\"}\n\n\
              data: {\"ts\": 1, \"slot\": \"main\", \"log\": \"b\"}\n\n\
              data: {\"ts\": 2, \"slot\": \"main\", \"log\": \"c\"}\n\n",
        );
        assert_eq!(
            events,
            vec![
                LogEvent::Timestamp("1".to_string()),
                LogEvent::Line { slot: "main".to_string(), text: "a".to_string() },
                LogEvent::Line { slot: "main".to_string(), text: "b".to_string() },
                LogEvent::Timestamp("2".to_string()),
                LogEvent::Line { slot: "main".to_string(), text: "c".to_string() },
            ]
        );
    }

    #[test]
    fn test_frames_split_across_chunks() {
        let mut parser = LogParser::new();
        assert!(parser.push(b"data: {\"ts\": \"t\", \"lo").is_empty());
        let events = parser.push(b"g\": \"hello\"}\n");
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[1],
            LogEvent::Line { slot: String::new(), text: "hello".to_string() }
        );
    }

    #[test]
    fn test_ignores_other_frames_and_garbage() {
        let mut parser = LogParser::new();
        let events = parser.push(b"event: ping\n: comment\ndata: not json\ndata: {\"ts\": 1}\n");
        assert!(events.is_empty());
    }

    #[test]
    fn test_stats_are_reported_separately() {
        let mut parser = LogParser::new();
        let events = parser.push(b"data: {\"memory\": 1024, \"cpu\": 0.5}\n");
        assert_eq!(
            events,
            vec![LogEvent::Stats { memory: Some(json!(1024)), cpu: Some(json!(0.5)) }]
        );
    }

    #[test]
    fn test_finish_flushes_unterminated_line() {
        let mut parser = LogParser::new();
        assert!(parser.push(b"data: {\"log\": \"last\"}").is_empty());
        assert_eq!(
            parser.finish(),
            vec![LogEvent::Line { slot: String::new(), text: "last".to_string() }]
        );
    }
}
