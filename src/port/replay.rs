//! Newline-delimited JSON event logs.
//!
//! A reader thread parses one [`InputEvent`] per line and forwards it over a
//! bounded channel, so event order in the file is the delivery order.

use crate::port::types::InputEvent;
use crossbeam_channel::{bounded, Receiver};
use std::io::BufRead;
use std::thread::{self, JoinHandle};
use thiserror::Error;

/// Capacity of the reader channel.
const CHANNEL_CAPACITY: usize = 10_000;

/// Errors raised while reading an event log.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid event on line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Parse a single log line.
///
/// Blank lines and `#` comments yield `Ok(None)`.
pub fn parse_line(line: &str, line_no: usize) -> Result<Option<InputEvent>, ReplayError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|source| ReplayError::Json {
            line: line_no,
            source,
        })
}

/// Read every event from `reader`, skipping malformed lines.
pub fn read_events<R: BufRead>(reader: R) -> Result<Vec<InputEvent>, ReplayError> {
    let mut events = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        match parse_line(&line?, idx + 1) {
            Ok(Some(event)) => events.push(event),
            Ok(None) => {}
            Err(e) => tracing::warn!("Skipping event: {e}"),
        }
    }
    Ok(events)
}

/// Spawn a thread that streams events from `reader` into a channel.
///
/// The channel disconnects when the reader is exhausted. An IO error ends
/// the stream early and is returned from the join handle.
pub fn spawn_reader<R>(reader: R) -> (Receiver<InputEvent>, JoinHandle<Result<usize, ReplayError>>)
where
    R: BufRead + Send + 'static,
{
    let (sender, receiver) = bounded(CHANNEL_CAPACITY);

    let handle = thread::spawn(move || {
        let mut forwarded = 0;
        for (idx, line) in reader.lines().enumerate() {
            match parse_line(&line?, idx + 1) {
                Ok(Some(event)) => {
                    if sender.send(event).is_err() {
                        // Receiver dropped; nobody is listening any more.
                        break;
                    }
                    forwarded += 1;
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("Skipping event: {e}"),
            }
        }
        Ok(forwarded)
    });

    (receiver, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::types::{KeyEvent, PasteEvent};
    use std::io::Cursor;

    const LOG: &str = r#"
# two keys and a paste
{"type":"press","key":"t","timestamp_ms":0}
{"type":"release","key":"t","timestamp_ms":60}
not json at all
{"type":"paste","text_len":12}
"#;

    #[test]
    fn test_read_events_skips_noise() {
        let events = read_events(Cursor::new(LOG)).unwrap();
        assert_eq!(
            events,
            vec![
                InputEvent::Press(KeyEvent::new("t", 0.0)),
                InputEvent::Release(KeyEvent::new("t", 60.0)),
                InputEvent::Paste(PasteEvent { text_len: 12 }),
            ]
        );
    }

    #[test]
    fn test_parse_line_reports_line_number() {
        let err = parse_line("{", 7).unwrap_err();
        assert!(err.to_string().contains("line 7"));
    }

    #[test]
    fn test_spawn_reader_preserves_order() {
        let (receiver, handle) = spawn_reader(Cursor::new(LOG.to_string()));
        let events: Vec<InputEvent> = receiver.iter().collect();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], InputEvent::Press(_)));
        assert!(matches!(events[2], InputEvent::Paste(_)));
        assert_eq!(handle.join().unwrap().unwrap(), 3);
    }
}
