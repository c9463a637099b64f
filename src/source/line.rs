//! Line-oriented decode source.
//!
//! Reads detections from any line stream: the stdout of `zbarcam --raw`, a
//! decoder that prints JSON, or a replay file. Each line is one of:
//!
//! ```text
//! {"code":"5901234123457","format":"ean_13","confidence":0.04}
//! EAN-13:5901234123457
//! 5901234123457 ean_13 0.04
//! ```
//!
//! Anything else, such as `SN:ABC12345` or `LOT 2024 0001`, is one raw code.
//! A blank line counts as a processed frame with no detection.

use super::{DecodeSource, MediaConstraints};
use crate::models::{DecodeEvent, ScanEvent};
use crate::{Error, Result};
use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use tokio::sync::mpsc;

/// zbar symbology names, compared after [`symbology_key`] normalization.
const SYMBOLOGIES: &[&str] = &[
    "EAN2", "EAN5", "EAN8", "EAN13", "UPCA", "UPCE", "ISBN10", "ISBN13", "I2/5", "I25",
    "DATABAR", "DATABAREXP", "CODABAR", "CODE39", "CODE93", "CODE128", "PDF417", "QRCODE",
    "SQCODE",
];

/// Parses one line of decoder output.
///
/// Unparseable JSON is logged and treated as a processed frame. A
/// `TYPE:DATA` prefix and trailing format or confidence tokens are only
/// split off when they have that exact shape; any other line is taken whole
/// as the code. Implausible codes are left to the deduplicator.
#[must_use]
pub fn parse_detection_line(line: &str) -> DecodeEvent {
    let line = line.trim();
    if line.is_empty() {
        return DecodeEvent::Processed;
    }

    if line.starts_with('{') {
        return match serde_json::from_str::<ScanEvent>(line) {
            Ok(event) => DecodeEvent::Detected(event),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring malformed JSON detection");
                DecodeEvent::Processed
            },
        };
    }

    if let Some((symbology, data)) = split_zbar(line) {
        return DecodeEvent::Detected(
            ScanEvent::new(data).with_format(symbology.replace('-', "_")),
        );
    }

    DecodeEvent::Detected(split_annotated(line).unwrap_or_else(|| ScanEvent::new(line)))
}

/// Uppercases and drops `-`/`_` so `EAN-13`, `ean_13` and `EAN13` compare equal.
fn symbology_key(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '-' && *c != '_')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

fn is_symbology(name: &str) -> bool {
    let key = symbology_key(name);
    SYMBOLOGIES.contains(&key.as_str())
}

/// Splits `TYPE:DATA` when `TYPE` is a zbar symbology name.
fn split_zbar(line: &str) -> Option<(&str, &str)> {
    let (symbology, data) = line.split_once(':')?;
    (is_symbology(symbology) && !data.is_empty()).then_some((symbology, data))
}

/// Parses `CODE [FORMAT] [CONFIDENCE]`.
///
/// Returns `None` unless every trailing token is a symbology name or a
/// decimal error score in `0.0..=1.0`, each at most once.
fn split_annotated(line: &str) -> Option<ScanEvent> {
    let mut parts = line.split_whitespace();
    let mut event = ScanEvent::new(parts.next()?);

    for part in parts {
        match part.parse::<f32>() {
            Ok(score)
                if event.confidence.is_none()
                    && part.contains('.')
                    && (0.0..=1.0).contains(&score) =>
            {
                event = event.with_confidence(score);
            },
            Err(_) if event.format.is_none() && is_symbology(part) => {
                event = event.with_format(part);
            },
            _ => return None,
        }
    }
    Some(event)
}

/// Decode source reading detections from a line stream on a worker thread.
pub struct LineSource<R: BufRead + Send + 'static> {
    reader: Option<R>,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<usize>>,
}

impl<R: BufRead + Send + 'static> LineSource<R> {
    /// Creates a source over `reader`. The stream can be consumed once.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            reader: Some(reader),
            stop: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    /// Returns true while the worker thread is reading.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    fn pump(reader: R, stop: &AtomicBool, events: &mpsc::Sender<DecodeEvent>) -> usize {
        let mut delivered = 0;
        for line in reader.lines() {
            if stop.load(Ordering::SeqCst) {
                break;
            }
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    tracing::warn!(error = %e, "Stopped reading detections");
                    break;
                },
            };
            if events.blocking_send(parse_detection_line(&line)).is_err() {
                tracing::debug!("Session dropped the event channel");
                break;
            }
            delivered += 1;
        }
        tracing::debug!(delivered, "Line source finished");
        delivered
    }
}

impl<R: BufRead + Send + 'static> DecodeSource for LineSource<R> {
    fn start(
        &mut self,
        _constraints: &MediaConstraints,
        events: mpsc::Sender<DecodeEvent>,
    ) -> Result<()> {
        let reader = self.reader.take().ok_or_else(|| Error::SourceUnavailable {
            reason: "input stream already consumed".to_string(),
        })?;

        self.stop.store(false, Ordering::SeqCst);
        let stop = Arc::clone(&self.stop);
        let worker = std::thread::Builder::new()
            .name("shelfscan-line-source".to_string())
            .spawn(move || Self::pump(reader, &stop, &events))
            .map_err(|e| Error::SourceUnavailable {
                reason: e.to_string(),
            })?;

        self.worker = Some(worker);
        Ok(())
    }

    fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        // A worker blocked on a read is left to finish on its own
        if let Some(worker) = self.worker.take_if(|w| w.is_finished()) {
            let _ = worker.join();
        }
    }
}

impl<R: BufRead + Send + 'static> std::fmt::Debug for LineSource<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineSource")
            .field("consumed", &self.reader.is_none())
            .field("running", &self.is_running())
            .finish()
    }
}
