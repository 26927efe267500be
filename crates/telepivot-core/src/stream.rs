//! Incremental record streams.
//!
//! The telemetry backend streams a query as server-sent events. Each event's
//! `data:` payload is one JSON message tagged by `type`:
//!
//! ```text
//! data: {"type":"data","item":{...record...}}
//!
//! data: {"type":"progress","loaded":500}
//!
//! data: {"type":"stats","total":1000,"limited":false}
//! ```
//!
//! `stats` ends a successful stream and `error` ends a failed one. The same
//! messages are also accepted one per line without SSE framing (NDJSON),
//! which is what a recorded stream usually looks like on disk.
//!
//! [`StreamDecoder`] turns lines into [`StreamMessage`]s; [`StreamIngest`]
//! applies those messages to a [`Dataset`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::record::record_from_value;

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamMessage {
    /// One record. The item is kept as raw JSON so that a malformed record
    /// is rejected on its own instead of breaking the stream.
    Data {
        item: Value,
    },
    Progress {
        loaded: u64,
    },
    Stats {
        total: u64,
        #[serde(default)]
        limited: bool,
    },
    Error {
        message: String,
    },
}

impl StreamMessage {
    /// Whether this message ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stats { .. } | Self::Error { .. })
    }
}

// ---------------------------------------------------------------------------
// Line decoder
// ---------------------------------------------------------------------------

/// Line-at-a-time decoder for SSE-framed or NDJSON message streams.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    line: usize,
    event_line: usize,
    data: Vec<String>,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line (without its trailing newline). Returns a message when
    /// the line completes one.
    pub fn feed_line(&mut self, line: &str) -> Result<Option<StreamMessage>> {
        self.line += 1;
        let line = line.strip_suffix('\r').unwrap_or(line);

        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return Ok(None);
        }
        if self.data.is_empty() && line.trim_start().starts_with('{') {
            return parse_message(line, self.line).map(Some);
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        if field == "data" {
            if self.data.is_empty() {
                self.event_line = self.line;
            }
            self.data.push(value.to_string());
        } else {
            log::trace!("ignoring SSE field {field:?} at line {}", self.line);
        }
        Ok(None)
    }

    /// Flush an event left open by a stream that ended without a blank line.
    pub fn finish(&mut self) -> Result<Option<StreamMessage>> {
        self.dispatch()
    }

    /// Decode a complete stream held in memory.
    pub fn decode_all(input: &str) -> Result<Vec<StreamMessage>> {
        let mut decoder = Self::new();
        let mut messages = Vec::new();
        for line in input.lines() {
            messages.extend(decoder.feed_line(line)?);
        }
        messages.extend(decoder.finish()?);
        Ok(messages)
    }

    fn dispatch(&mut self) -> Result<Option<StreamMessage>> {
        if self.data.is_empty() {
            return Ok(None);
        }
        let payload = self.data.join("\n");
        self.data.clear();
        parse_message(&payload, self.event_line).map(Some)
    }
}

fn parse_message(payload: &str, line: usize) -> Result<StreamMessage> {
    serde_json::from_str(payload).map_err(|e| Error::Stream {
        line,
        reason: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Ingest
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum StreamStatus {
    Open,
    Completed { total: u64, limited: bool },
    Failed { message: String },
}

/// What applying one message did.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A record was added. `refresh` is set every `stream_refresh_every`
    /// records, when a consumer should redraw its partial view.
    Record { loaded: usize, refresh: bool },
    Progress { loaded: u64 },
    Completed { total: u64, limited: bool },
    Failed { message: String },
    /// The message arrived after the stream had already ended.
    Ignored,
}

/// Applies stream messages to a [`Dataset`].
#[derive(Debug)]
pub struct StreamIngest {
    dataset: Dataset,
    received: usize,
    rejected: usize,
    status: StreamStatus,
}

impl StreamIngest {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset,
            received: 0,
            rejected: 0,
            status: StreamStatus::Open,
        }
    }

    /// Apply one message.
    ///
    /// A `data` item that fails validation is returned as
    /// [`Error::Validation`], indexed by its position in the stream, and
    /// leaves the dataset unchanged; the stream stays open.
    pub fn apply(&mut self, message: StreamMessage) -> Result<StreamEvent> {
        if self.status != StreamStatus::Open {
            log::warn!("message after end of stream ignored: {message:?}");
            return Ok(StreamEvent::Ignored);
        }

        match message {
            StreamMessage::Data { item } => {
                let index = self.received;
                self.received += 1;
                let record = record_from_value(item, index).inspect_err(|_| self.rejected += 1)?;
                self.dataset.push(record);
                let loaded = self.dataset.len();
                let every = self.dataset.config().stream_refresh_every.max(1);
                Ok(StreamEvent::Record {
                    loaded,
                    refresh: loaded % every == 0,
                })
            }
            StreamMessage::Progress { loaded } => Ok(StreamEvent::Progress { loaded }),
            StreamMessage::Stats { total, limited } => {
                if total != self.received as u64 {
                    log::warn!(
                        "stream reported {total} records but {} were received",
                        self.received
                    );
                }
                self.status = StreamStatus::Completed { total, limited };
                Ok(StreamEvent::Completed { total, limited })
            }
            StreamMessage::Error { message } => {
                self.status = StreamStatus::Failed {
                    message: message.clone(),
                };
                Ok(StreamEvent::Failed { message })
            }
        }
    }

    pub fn status(&self) -> &StreamStatus {
        &self.status
    }

    pub fn is_finished(&self) -> bool {
        self.status != StreamStatus::Open
    }

    /// `data` messages seen, including ones that failed validation.
    pub fn received(&self) -> usize {
        self.received
    }

    /// `data` messages that failed validation.
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn into_dataset(self) -> Dataset {
        self.dataset
    }
}
