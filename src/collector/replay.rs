//! Collector that replays a recorded accelerometer stream.
//!
//! Lines are parsed on a background thread and forwarded as [`SampleRecord`]s
//! over a bounded channel, the same way a live sensor callback would feed the
//! engine. The channel disconnects once the source is exhausted.

use crate::collector::stride::InputStride;
use crate::collector::types::SampleRecord;
use crossbeam_channel::{bounded, Receiver};
use serde::Deserialize;
use std::io::BufRead;
use std::path::Path;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

/// Channel depth between the reader thread and the consumer.
const CHANNEL_CAPACITY: usize = 10_000;

/// Encoding of a recorded sample stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamFormat {
    /// `x,y,z[,timestamp_ms]` per line; a header row and `#` comments are skipped
    Csv,
    /// One `{"x":..,"y":..,"z":..,"timestamp":..}` object per line
    JsonLines,
}

impl StreamFormat {
    /// Guess the format from a file extension, defaulting to CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("jsonl") | Some("ndjson") | Some("json") => StreamFormat::JsonLines,
            _ => StreamFormat::Csv,
        }
    }
}

impl FromStr for StreamFormat {
    type Err = CollectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(StreamFormat::Csv),
            "jsonl" | "ndjson" | "json" => Ok(StreamFormat::JsonLines),
            other => Err(CollectorError::Parse {
                line: 0,
                message: format!("unknown stream format '{other}'"),
            }),
        }
    }
}

/// Errors that can occur during collection.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectorError {
    AlreadyRunning,
    Io(String),
    Parse { line: usize, message: String },
}

impl std::fmt::Display for CollectorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectorError::AlreadyRunning => write!(f, "Collector is already running"),
            CollectorError::Io(e) => write!(f, "IO error: {e}"),
            CollectorError::Parse { line, message } => {
                write!(f, "Parse error on line {line}: {message}")
            }
        }
    }
}

impl std::error::Error for CollectorError {}

#[derive(Deserialize)]
struct JsonSample {
    x: f32,
    y: f32,
    z: f32,
    #[serde(default)]
    timestamp: Option<i64>,
}

/// Parse one line of a recorded stream.
///
/// Returns `Ok(None)` for blank lines, comments and a CSV header row. Samples
/// without a timestamp are stamped with the current time.
pub fn parse_line(
    format: StreamFormat,
    line_number: usize,
    line: &str,
) -> Result<Option<SampleRecord>, CollectorError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let parse_error = |message: String| CollectorError::Parse {
        line: line_number,
        message,
    };

    match format {
        StreamFormat::JsonLines => {
            let raw: JsonSample =
                serde_json::from_str(line).map_err(|e| parse_error(e.to_string()))?;
            Ok(Some(SampleRecord::with_optional_timestamp(
                raw.x,
                raw.y,
                raw.z,
                raw.timestamp,
            )))
        }
        StreamFormat::Csv => {
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            if fields[0].eq_ignore_ascii_case("x") {
                return Ok(None);
            }
            if fields.len() != 3 && fields.len() != 4 {
                return Err(parse_error(format!(
                    "expected 3 or 4 fields, found {}",
                    fields.len()
                )));
            }

            let axis = |i: usize| {
                fields[i]
                    .parse::<f32>()
                    .map_err(|e| parse_error(format!("field {}: {e}", i + 1)))
            };
            let (x, y, z) = (axis(0)?, axis(1)?, axis(2)?);

            let timestamp = match fields.get(3) {
                Some(ts) if !ts.is_empty() => Some(
                    ts.parse::<i64>()
                        .map_err(|e| parse_error(format!("timestamp: {e}")))?,
                ),
                _ => None,
            };

            Ok(Some(SampleRecord::with_optional_timestamp(x, y, z, timestamp)))
        }
    }
}

/// Replays a line-oriented sample stream into a channel.
pub struct ReplayCollector {
    source: Option<Box<dyn BufRead + Send>>,
    format: StreamFormat,
    stride: InputStride,
    receiver: Receiver<SampleRecord>,
    sender: Option<crossbeam_channel::Sender<SampleRecord>>,
    running: Arc<AtomicBool>,
    skipped: Arc<AtomicU64>,
}

impl ReplayCollector {
    /// Create a collector over any buffered reader.
    pub fn new(source: Box<dyn BufRead + Send>, format: StreamFormat, stride: InputStride) -> Self {
        let (sender, receiver) = bounded(CHANNEL_CAPACITY);
        Self {
            source: Some(source),
            format,
            stride,
            receiver,
            sender: Some(sender),
            running: Arc::new(AtomicBool::new(false)),
            skipped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Create a collector over a file on disk.
    pub fn from_file(
        path: &Path,
        format: StreamFormat,
        stride: InputStride,
    ) -> Result<Self, CollectorError> {
        let file = std::fs::File::open(path)
            .map_err(|e| CollectorError::Io(format!("{}: {e}", path.display())))?;
        Ok(Self::new(
            Box::new(std::io::BufReader::new(file)),
            format,
            stride,
        ))
    }

    /// Start the reader thread.
    ///
    /// A collector replays its source once; starting it again is an error.
    pub fn start(&mut self) -> Result<(), CollectorError> {
        let (source, sender) = match (self.source.take(), self.sender.take()) {
            (Some(source), Some(sender)) => (source, sender),
            _ => return Err(CollectorError::AlreadyRunning),
        };

        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();
        let skipped = self.skipped.clone();
        let format = self.format;
        let mut stride = self.stride.clone();

        thread::spawn(move || {
            for (index, line) in source.lines().enumerate() {
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        tracing::warn!(error = %e, "sample source read failed");
                        break;
                    }
                };

                match parse_line(format, index + 1, &line) {
                    Ok(Some(sample)) => {
                        if stride.admit() && sender.send(sample).is_err() {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        skipped.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!(error = %e, "skipping malformed sample line");
                    }
                }
            }
            running.store(false, Ordering::SeqCst);
        });

        Ok(())
    }

    /// Ask the reader thread to stop after its current line.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Check if the reader thread is still producing samples.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Get the receiver for samples.
    pub fn receiver(&self) -> &Receiver<SampleRecord> {
        &self.receiver
    }

    /// Try to receive a sample without blocking.
    pub fn try_recv(&self) -> Option<SampleRecord> {
        self.receiver.try_recv().ok()
    }

    /// Number of lines that failed to parse so far.
    pub fn skipped_lines(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }
}
