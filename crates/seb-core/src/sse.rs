//! Incremental `text/event-stream` decoder.
//!
//! Chunks arrive from the HTTP body at arbitrary boundaries; the decoder
//! buffers partial lines and emits complete events once their terminating
//! blank line has been seen.

use crate::error::FrameError;
use std::time::Duration;

pub const DEFAULT_MAX_EVENT_BYTES: usize = 256 * 1024;
pub const DEFAULT_EVENT_TYPE: &str = "message";
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SseEvent {
    pub event: String,
    pub data: String,
    pub id: Option<String>,
}

impl SseEvent {
    pub fn is_message(&self) -> bool {
        self.event == DEFAULT_EVENT_TYPE
    }
}

#[derive(Debug, Default)]
pub struct SseReport {
    pub events: Vec<SseEvent>,
    pub errors: Vec<FrameError>,
    /// Reconnection delay requested by the server, if any line carried one.
    pub retry: Option<Duration>,
}

pub struct SseFrameDecoder {
    max_event_bytes: usize,
    pending: Vec<u8>,
    event_type: Option<String>,
    data: Vec<String>,
    data_bytes: usize,
    discarding: bool,
    last_event_id: Option<String>,
    /// The previous line ended in a bare `\r`; a `\n` right after it
    /// belongs to the same terminator.
    after_cr: bool,
    bom_checked: bool,
}

impl Default for SseFrameDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_EVENT_BYTES)
    }
}

impl SseFrameDecoder {
    pub fn new(max_event_bytes: usize) -> Self {
        Self {
            max_event_bytes,
            pending: Vec::new(),
            event_type: None,
            data: Vec::new(),
            data_bytes: 0,
            discarding: false,
            last_event_id: None,
            after_cr: false,
            bom_checked: false,
        }
    }

    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    pub fn push_chunk(&mut self, chunk: &[u8]) -> SseReport {
        let mut report = SseReport::default();
        if !chunk.is_empty() {
            self.pending.extend_from_slice(chunk);
        }

        if !self.bom_checked {
            if self.pending.len() < UTF8_BOM.len() && UTF8_BOM.starts_with(&self.pending) {
                return report;
            }
            if self.pending.starts_with(UTF8_BOM) {
                self.pending.drain(..UTF8_BOM.len());
            }
            self.bom_checked = true;
        }

        loop {
            if self.after_cr && !self.pending.is_empty() {
                if self.pending[0] == b'\n' {
                    self.pending.remove(0);
                }
                self.after_cr = false;
            }
            let Some(end) = self
                .pending
                .iter()
                .position(|byte| *byte == b'\n' || *byte == b'\r')
            else {
                break;
            };
            let terminator = self.pending[end];
            let mut line = self.pending.drain(..=end).collect::<Vec<u8>>();
            line.pop();
            if terminator == b'\r' {
                self.after_cr = true;
            }
            match String::from_utf8(line) {
                Ok(line) => self.process_line(&line, &mut report),
                Err(_) => report.errors.push(FrameError::InvalidUtf8),
            }
        }

        if self.pending.len() > self.max_event_bytes {
            report.errors.push(FrameError::OversizedFrame {
                size: self.pending.len(),
                max: self.max_event_bytes,
            });
            self.pending.clear();
            self.discard_event();
            self.discarding = true;
        }

        report
    }

    /// Drops whatever is buffered. An event without its terminating blank
    /// line when the stream ends is never dispatched.
    pub fn finish(&mut self) -> usize {
        let dropped = self.pending.len() + self.data_bytes;
        self.pending.clear();
        self.discard_event();
        self.discarding = false;
        self.after_cr = false;
        self.bom_checked = false;
        dropped
    }

    fn process_line(&mut self, line: &str, report: &mut SseReport) {
        if line.is_empty() {
            self.dispatch(report);
            return;
        }
        if line.starts_with(':') {
            return;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "data" => {
                if self.discarding {
                    return;
                }
                self.data_bytes += value.len();
                if self.data_bytes > self.max_event_bytes {
                    report.errors.push(FrameError::OversizedFrame {
                        size: self.data_bytes,
                        max: self.max_event_bytes,
                    });
                    self.discard_event();
                    self.discarding = true;
                    return;
                }
                self.data.push(value.to_string());
            }
            "event" => self.event_type = Some(value.to_string()),
            "id" => {
                if !value.contains('\0') {
                    self.last_event_id = Some(value.to_string());
                }
            }
            "retry" => {
                if let Ok(millis) = value.trim().parse::<u64>() {
                    report.retry = Some(Duration::from_millis(millis));
                }
            }
            _ => {}
        }
    }

    fn dispatch(&mut self, report: &mut SseReport) {
        if self.discarding {
            self.discarding = false;
            self.discard_event();
            return;
        }
        if self.data.is_empty() {
            self.event_type = None;
            return;
        }
        let event = self
            .event_type
            .take()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_EVENT_TYPE.to_string());
        let data = std::mem::take(&mut self.data).join("\n");
        self.data_bytes = 0;
        report.events.push(SseEvent {
            event,
            data,
            id: self.last_event_id.clone(),
        });
    }

    fn discard_event(&mut self) {
        self.event_type = None;
        self.data.clear();
        self.data_bytes = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_flask_style_data_frames() {
        let mut decoder = SseFrameDecoder::default();
        let report = decoder.push_chunk(b"data: {\"cpu_percent\": 1.5}\n\ndata: {\"cpu_percent\": 2}\n\n");
        assert!(report.errors.is_empty());
        assert_eq!(report.events.len(), 2);
        assert!(report.events[0].is_message());
        assert_eq!(report.events[0].data, "{\"cpu_percent\": 1.5}");
        assert_eq!(report.events[1].data, "{\"cpu_percent\": 2}");
    }

    #[test]
    fn reassembles_events_split_across_chunks() {
        let mut decoder = SseFrameDecoder::default();
        assert!(decoder.push_chunk(b"da").events.is_empty());
        assert!(decoder.push_chunk(b"ta: {\"a\"").events.is_empty());
        assert!(decoder.push_chunk(b": 1}\r\n").events.is_empty());
        let report = decoder.push_chunk(b"\r\n");
        assert_eq!(report.events.len(), 1);
        assert_eq!(report.events[0].data, "{\"a\": 1}");
    }

    #[test]
    fn joins_multi_line_data_and_reads_fields() {
        let mut decoder = SseFrameDecoder::default();
        let report = decoder.push_chunk(
            b": keep-alive\nevent: status\nid: 7\nretry: 2500\ndata: first\ndata:second\n\n",
        );
        assert_eq!(report.retry, Some(Duration::from_millis(2500)));
        assert_eq!(report.events.len(), 1);
        let event = &report.events[0];
        assert_eq!(event.event, "status");
        assert_eq!(event.data, "first\nsecond");
        assert_eq!(event.id.as_deref(), Some("7"));
        assert_eq!(decoder.last_event_id(), Some("7"));
        assert!(!event.is_message());
    }

    #[test]
    fn blank_lines_without_data_dispatch_nothing() {
        let mut decoder = SseFrameDecoder::default();
        let report = decoder.push_chunk(b"event: ping\n\n\n");
        assert!(report.events.is_empty());
        let report = decoder.push_chunk(b"data: x\n\n");
        assert_eq!(report.events[0].event, DEFAULT_EVENT_TYPE);
    }

    #[test]
    fn oversized_event_is_dropped_and_decoding_continues() {
        let mut decoder = SseFrameDecoder::new(16);
        let mut chunk = format!("data: {}\n\n", "x".repeat(64)).into_bytes();
        chunk.extend_from_slice(b"data: ok\n\n");
        let report = decoder.push_chunk(&chunk);
        assert_eq!(report.errors.len(), 1);
        assert!(matches!(
            report.errors[0],
            FrameError::OversizedFrame { .. }
        ));
        assert_eq!(report.events.len(), 1);
        assert_eq!(report.events[0].data, "ok");
    }

    #[test]
    fn unterminated_line_beyond_limit_is_discarded() {
        let mut decoder = SseFrameDecoder::new(16);
        let report = decoder.push_chunk("data: ".repeat(8).as_bytes());
        assert_eq!(report.errors.len(), 1);
        let report = decoder.push_chunk(b"tail\n\ndata: next\n\n");
        assert_eq!(report.events.len(), 1);
        assert_eq!(report.events[0].data, "next");
    }

    #[test]
    fn finish_drops_incomplete_event() {
        let mut decoder = SseFrameDecoder::default();
        let report = decoder.push_chunk(b"data: partial\n");
        assert!(report.events.is_empty());
        assert!(decoder.finish() > 0);
        let report = decoder.push_chunk(b"\n");
        assert!(report.events.is_empty());
    }

    #[test]
    fn leading_byte_order_mark_is_skipped() {
        let mut decoder = SseFrameDecoder::default();
        assert!(decoder.push_chunk(b"\xEF\xBB").events.is_empty());
        let report = decoder.push_chunk(b"\xBFdata: first\n\n");
        assert!(report.errors.is_empty());
        assert_eq!(report.events.len(), 1);
        assert_eq!(report.events[0].data, "first");

        let report = decoder.push_chunk("data: \u{FEFF}kept\n\n".as_bytes());
        assert_eq!(report.events[0].data, "\u{FEFF}kept");
    }

    #[test]
    fn bare_carriage_returns_terminate_lines() {
        let mut decoder = SseFrameDecoder::default();
        let report = decoder.push_chunk(b"data: one\r\rdata: two\r");
        assert_eq!(report.events.len(), 1);
        assert_eq!(report.events[0].data, "one");

        let report = decoder.push_chunk(b"\ndata: more\r\n\r\n");
        assert_eq!(report.events.len(), 1);
        assert_eq!(report.events[0].data, "two\nmore");
    }

    #[test]
    fn invalid_utf8_line_is_reported() {
        let mut decoder = SseFrameDecoder::default();
        let report = decoder.push_chunk(b"data: \xff\xfe\n\ndata: fine\n\n");
        assert_eq!(report.errors, vec![FrameError::InvalidUtf8]);
        assert_eq!(report.events.len(), 1);
        assert_eq!(report.events[0].data, "fine");
    }
}
