//! Integration tests for shelfscan.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::too_many_lines,
    clippy::doc_markdown
)]

use chrono::{DateTime, TimeZone, Utc};
use shelfscan::catalog::{Catalog, StaticCatalog};
use shelfscan::config::ShelfscanConfig;
use shelfscan::models::{DecodeEvent, ProductInfo, ScanEvent, ScanHistory, ScanStats};
use shelfscan::rendering::{Feedback, NoFeedback, PresentationSink, Severity};
use shelfscan::services::deduplication::DeduplicationConfig;
use shelfscan::services::{ManualClock, ScanSession};
use shelfscan::source::{DecodeSource, LineSource, MediaConstraints};
use shelfscan::storage::{FilesystemStore, HistoryStore, MemoryStore};
use shelfscan::{Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::sync::mpsc;

// ============================================================================
// Test doubles
// ============================================================================

/// What a sink was asked to show.
#[derive(Debug, Clone, PartialEq)]
enum Shown {
    History(Vec<String>),
    Stats(ScanStats),
    Status(String, Severity),
}

/// Sink that records every notification.
#[derive(Clone, Default)]
struct CollectingSink(Arc<Mutex<Vec<Shown>>>);

impl CollectingSink {
    fn shown(&self) -> Vec<Shown> {
        self.0.lock().unwrap().clone()
    }

    fn statuses(&self) -> Vec<String> {
        self.shown()
            .into_iter()
            .filter_map(|s| match s {
                Shown::Status(message, _) => Some(message),
                _ => None,
            })
            .collect()
    }

    fn last_stats(&self) -> Option<ScanStats> {
        self.shown().into_iter().rev().find_map(|s| match s {
            Shown::Stats(stats) => Some(stats),
            _ => None,
        })
    }
}

impl PresentationSink for CollectingSink {
    fn render_history(&mut self, history: &ScanHistory) -> Result<()> {
        let codes = history.iter().map(|r| r.code.clone()).collect();
        self.0.lock().unwrap().push(Shown::History(codes));
        Ok(())
    }

    fn render_stats(&mut self, stats: &ScanStats) -> Result<()> {
        self.0.lock().unwrap().push(Shown::Stats(*stats));
        Ok(())
    }

    fn render_status(&mut self, message: &str, severity: Severity) -> Result<()> {
        self.0
            .lock()
            .unwrap()
            .push(Shown::Status(message.to_string(), severity));
        Ok(())
    }
}

/// Sink whose output device is gone.
struct BrokenSink;

impl PresentationSink for BrokenSink {
    fn render_history(&mut self, _history: &ScanHistory) -> Result<()> {
        Err(Error::OperationFailed {
            operation: "render_history".to_string(),
            cause: "broken pipe".to_string(),
        })
    }

    fn render_stats(&mut self, _stats: &ScanStats) -> Result<()> {
        Err(Error::OperationFailed {
            operation: "render_stats".to_string(),
            cause: "broken pipe".to_string(),
        })
    }

    fn render_status(&mut self, _message: &str, _severity: Severity) -> Result<()> {
        Err(Error::OperationFailed {
            operation: "render_status".to_string(),
            cause: "broken pipe".to_string(),
        })
    }
}

/// Feedback device that always fails.
struct BrokenFeedback;

impl Feedback for BrokenFeedback {
    fn notify(&mut self) -> Result<()> {
        Err(Error::OperationFailed {
            operation: "notify".to_string(),
            cause: "no audio device".to_string(),
        })
    }
}

/// Catalog whose contents can change after a session starts.
#[derive(Default)]
struct MutableCatalog(RwLock<HashMap<String, ProductInfo>>);

impl MutableCatalog {
    fn set(&self, code: &str, product: ProductInfo) {
        self.0.write().unwrap().insert(code.to_string(), product);
    }
}

impl Catalog for MutableCatalog {
    fn lookup(&self, code: &str) -> Option<ProductInfo> {
        self.0.read().unwrap().get(code).cloned()
    }

    fn len(&self) -> usize {
        self.0.read().unwrap().len()
    }
}

/// Source that hands its channel to the test.
#[derive(Default)]
struct ChannelSource {
    sender: Option<mpsc::Sender<DecodeEvent>>,
    unavailable: bool,
}

impl DecodeSource for ChannelSource {
    fn start(
        &mut self,
        _constraints: &MediaConstraints,
        events: mpsc::Sender<DecodeEvent>,
    ) -> Result<()> {
        if self.unavailable {
            return Err(Error::SourceUnavailable {
                reason: "camera permission denied".to_string(),
            });
        }
        self.sender = Some(events);
        Ok(())
    }

    fn stop(&mut self) {
        self.sender = None;
    }
}

fn epoch() -> DateTime<Utc> {
    Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()
}

struct Harness {
    session: ScanSession,
    clock: Arc<ManualClock>,
    sink: CollectingSink,
    source: ChannelSource,
}

impl Harness {
    fn open(config: &ShelfscanConfig, store: Box<dyn HistoryStore>, catalog: Arc<dyn Catalog>) -> Self {
        let clock = Arc::new(ManualClock::new(epoch()));
        let sink = CollectingSink::default();
        let session = ScanSession::open(
            config,
            store,
            catalog,
            Box::new(sink.clone()),
            Box::new(NoFeedback),
        )
        .with_clock(Box::new(Arc::clone(&clock)));

        Self {
            session,
            clock,
            sink,
            source: ChannelSource::default(),
        }
    }

    fn started(mut self) -> Self {
        let _events = self.session.start(&mut self.source).unwrap();
        self
    }

    /// Delivers `(code, ms since epoch)` pairs and returns the accepted codes.
    fn feed(&mut self, events: &[(&str, i64)]) -> Vec<String> {
        let mut accepted = Vec::new();
        for (code, at) in events {
            self.clock.set(epoch() + chrono::Duration::milliseconds(*at));
            let decision = self
                .session
                .handle(DecodeEvent::Detected(ScanEvent::new(*code)));
            if let Some(decision) = decision.filter(|d| d.accepted) {
                accepted.push(decision.code);
            }
        }
        accepted
    }

    fn codes(&self) -> Vec<String> {
        self.session.history().iter().map(|r| r.code.clone()).collect()
    }
}

fn window_config(ms: u64) -> ShelfscanConfig {
    ShelfscanConfig::default().with_dedup(DeduplicationConfig::time_window(
        Duration::from_millis(ms),
    ))
}

fn builtin() -> Arc<dyn Catalog> {
    Arc::new(StaticCatalog::builtin())
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_error_types() {
    let err = Error::InvalidInput("history_cap must be at least 1".to_string());
    let display = format!("{err}");
    assert!(display.contains("invalid input"));
    assert!(display.contains("history_cap"));

    let err = Error::OperationFailed {
        operation: "save_history".to_string(),
        cause: "disk full".to_string(),
    };
    let display = format!("{err}");
    assert!(display.contains("save_history"));
    assert!(display.contains("disk full"));

    let err = Error::SourceUnavailable {
        reason: "no camera".to_string(),
    };
    assert!(format!("{err}").contains("no camera"));
}

// ============================================================================
// Deduplication through the session
// ============================================================================

mod dedup_tests {
    use super::*;

    #[test]
    fn test_repeats_inside_window_collapse() {
        let mut h = Harness::open(&window_config(2000), Box::new(MemoryStore::new()), builtin())
            .started();

        let accepted = h.feed(&[
            ("0123456789012", 0),
            ("0123456789012", 500),
            ("0123456789012", 1200),
            ("5901234123457", 1300),
        ]);

        assert_eq!(accepted, vec!["0123456789012", "5901234123457"]);
        assert_eq!(h.codes(), vec!["5901234123457", "0123456789012"]);
        assert_eq!(
            h.session.history().records()[1].timestamp,
            epoch(),
            "first record keeps the time of the first read"
        );
    }

    #[test]
    fn test_repeat_after_window_is_new_record() {
        let mut h = Harness::open(&window_config(2000), Box::new(MemoryStore::new()), builtin())
            .started();

        let accepted = h.feed(&[("0123456789012", 0), ("0123456789012", 2500)]);

        assert_eq!(accepted.len(), 2);
        assert_eq!(h.session.history().len(), 2);
        let ids: Vec<_> = h.session.history().iter().map(|r| r.id).collect();
        assert!(ids[0] > ids[1]);
    }

    #[test]
    fn test_confirmation_buffer_policy() {
        let config =
            ShelfscanConfig::default().with_dedup(DeduplicationConfig::confirmation_buffer(2));
        let mut h = Harness::open(&config, Box::new(MemoryStore::new()), builtin()).started();

        let accepted = h.feed(&[
            ("0123456789012", 0),
            ("5901234123457", 10),
            ("5901234123457", 20),
            ("5901234123457", 30),
            ("5901234123457", 40),
            ("5901234123457", 60_000),
        ]);

        assert_eq!(accepted, vec!["5901234123457"]);
    }

    #[test]
    fn test_low_confidence_reads_are_dropped() {
        let config =
            ShelfscanConfig::default().with_dedup(DeduplicationConfig::confirmation_buffer(2));
        let mut h = Harness::open(&config, Box::new(MemoryStore::new()), builtin()).started();

        let noisy = ScanEvent::new("0123456789012").with_confidence(0.9);
        for _ in 0..5 {
            let decision = h.session.handle(DecodeEvent::Detected(noisy.clone())).unwrap();
            assert!(!decision.accepted);
        }
        assert!(h.session.history().is_empty());
    }

    #[test]
    fn test_malformed_events_are_not_errors() {
        let mut h = Harness::open(&window_config(2000), Box::new(MemoryStore::new()), builtin())
            .started();

        let accepted = h.feed(&[("", 0), ("   ", 10), ("123", 20)]);
        assert!(accepted.is_empty());
        assert!(h.session.history().is_empty());
    }
}

// ============================================================================
// History lifecycle
// ============================================================================

mod lifecycle_tests {
    use super::*;

    #[test]
    fn test_history_never_exceeds_cap() {
        let config = window_config(0).with_history_cap(3);
        let mut h = Harness::open(&config, Box::new(MemoryStore::new()), builtin()).started();

        for i in 0..10_i64 {
            let code = format!("{i:013}");
            h.feed(&[(code.as_str(), i * 10)]);
            assert!(h.session.history().len() <= 3);
        }

        assert_eq!(
            h.codes(),
            vec!["0000000000009", "0000000000008", "0000000000007"]
        );
    }

    #[test]
    fn test_reload_restores_history() {
        let dir = tempfile::tempdir().unwrap();
        let config = window_config(2000).with_data_dir(dir.path());
        let path = config.history_path();

        let before = {
            let mut h =
                Harness::open(&config, Box::new(FilesystemStore::new(&path)), builtin()).started();
            h.feed(&[
                ("0123456789012", 0),
                ("0987654321098", 100),
                ("4006381333931", 200),
            ]);
            h.session.history().clone()
        };

        let h = Harness::open(&config, Box::new(FilesystemStore::new(&path)), builtin());
        assert_eq!(h.session.history(), &before);
        assert_eq!(h.codes()[0], "4006381333931");

        // The initial render shows the loaded history
        assert_eq!(
            h.sink.shown().first(),
            Some(&Shown::History(h.codes()))
        );
    }

    #[test]
    fn test_reload_with_smaller_cap_keeps_newest() {
        let store = MemoryStore::new();
        {
            let mut h =
                Harness::open(&window_config(0), Box::new(store.clone()), builtin()).started();
            for i in 0..6_i64 {
                let code = format!("{i:013}");
                h.feed(&[(code.as_str(), i)]);
            }
        }

        let h = Harness::open(&window_config(0).with_history_cap(2), Box::new(store), builtin());
        assert_eq!(h.codes(), vec!["0000000000005", "0000000000004"]);
    }

    #[test]
    fn test_clear_history_resets_stats() {
        let store = MemoryStore::new();
        let mut h = Harness::open(&window_config(2000), Box::new(store.clone()), builtin())
            .started();
        h.feed(&[("0123456789012", 0), ("4006381333931", 10)]);
        assert_eq!(h.session.stats().total, 2);

        h.session.clear_history();

        assert_eq!(h.session.stats(), ScanStats::default());
        assert_eq!(h.sink.last_stats(), Some(ScanStats::default()));
        assert!(store.raw().is_none());
        assert_eq!(
            h.sink.statuses().last().map(String::as_str),
            Some("Scan history cleared")
        );
    }

    #[test]
    fn test_clear_keeps_dedup_state() {
        let mut h = Harness::open(&window_config(2000), Box::new(MemoryStore::new()), builtin())
            .started();
        h.feed(&[("0123456789012", 0)]);
        h.session.clear_history();

        // Still inside the cooldown of the last acceptance
        assert!(h.feed(&[("0123456789012", 500)]).is_empty());
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "{ not json").unwrap();

        let h = Harness::open(&window_config(2000), Box::new(FilesystemStore::new(&path)), builtin());
        assert!(h.session.history().is_empty());
    }

    #[test]
    fn test_stats_counts_found_and_today() {
        let mut h = Harness::open(&window_config(2000), Box::new(MemoryStore::new()), builtin())
            .started();
        h.clock.set(Utc::now());
        for code in ["0123456789012", "4006381333931", "1234567890123"] {
            h.clock.advance_ms(10);
            h.session
                .handle(DecodeEvent::Detected(ScanEvent::new(code)))
                .unwrap();
        }

        let stats = h.session.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.found, 2);
        assert_eq!(stats.today, 3);
    }
}

// ============================================================================
// Recorder behavior
// ============================================================================

mod recorder_tests {
    use super::*;

    #[test]
    fn test_product_snapshot_survives_catalog_change() {
        let catalog = Arc::new(MutableCatalog::default());
        catalog.set(
            "0123456789012",
            ProductInfo::new("Apple Juice", "$4.99", "Nature's Best", "1L"),
        );

        let store = MemoryStore::new();
        let mut h = Harness::open(
            &window_config(2000),
            Box::new(store.clone()),
            Arc::clone(&catalog) as Arc<dyn Catalog>,
        )
        .started();
        h.feed(&[("0123456789012", 0)]);

        catalog.set(
            "0123456789012",
            ProductInfo::new("Pear Juice", "$9.99", "Other", "2L"),
        );
        h.feed(&[("4006381333931", 100)]);

        let old = &h.session.history().records()[1];
        assert_eq!(old.display_name(), "Apple Juice");
        assert!(store.raw().unwrap().contains("Apple Juice"));
    }

    #[test]
    fn test_persistence_failure_is_swallowed() {
        let store = MemoryStore::new();
        store.fail_writes(true);
        let mut h = Harness::open(&window_config(2000), Box::new(store.clone()), builtin())
            .started();

        let accepted = h.feed(&[("0123456789012", 0)]);

        assert_eq!(accepted.len(), 1);
        assert_eq!(h.session.history().len(), 1);
        assert_eq!(store.save_count(), 0);
        assert!(h.sink.shown().contains(&Shown::History(vec![
            "0123456789012".to_string()
        ])));
        assert!(
            h.sink
                .statuses()
                .contains(&"Successfully scanned: Organic Apple Juice".to_string())
        );
    }

    #[test]
    fn test_output_failures_do_not_halt_accept() {
        let store = MemoryStore::new();
        let clock = Arc::new(ManualClock::new(epoch()));
        let mut session = ScanSession::open(
            &window_config(2000),
            Box::new(store.clone()),
            builtin(),
            Box::new(BrokenSink),
            Box::new(BrokenFeedback),
        )
        .with_clock(Box::new(Arc::clone(&clock)));
        let mut source = ChannelSource::default();
        let _events = session.start(&mut source).unwrap();

        let decision = session
            .handle(DecodeEvent::Detected(ScanEvent::new("0123456789012")))
            .unwrap();
        assert!(decision.accepted);

        clock.advance_ms(100);
        let decision = session
            .handle(DecodeEvent::Detected(ScanEvent::new("5901234123457")))
            .unwrap();
        assert!(decision.accepted);

        assert_eq!(session.history().len(), 2);
        assert_eq!(store.save_count(), 2);
        assert_eq!(store.load().len(), 2);

        session.stop(&mut source);
        assert!(!session.is_active());
    }

    #[test]
    fn test_unknown_product_status() {
        let mut h = Harness::open(&window_config(2000), Box::new(MemoryStore::new()), builtin())
            .started();
        h.feed(&[("4006381333931", 0)]);

        let record = h.session.history().newest().unwrap();
        assert!(record.product.is_none());
        assert_eq!(record.format, "UNKNOWN");
        assert!(
            h.sink
                .statuses()
                .contains(&"Successfully scanned: Unknown Product".to_string())
        );
    }
}

// ============================================================================
// Session lifecycle
// ============================================================================

mod session_tests {
    use super::*;

    #[test]
    fn test_unavailable_source() {
        let mut h = Harness::open(&window_config(2000), Box::new(MemoryStore::new()), builtin());
        h.source.unavailable = true;

        let err = h.session.start(&mut h.source).unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable { .. }));
        assert!(!h.session.is_active());

        let last = h.sink.shown().last().cloned();
        assert!(matches!(last, Some(Shown::Status(_, Severity::Error))));
    }

    #[test]
    fn test_event_after_stop_is_ignored() {
        let mut h = Harness::open(&window_config(2000), Box::new(MemoryStore::new()), builtin())
            .started();
        h.feed(&[("0123456789012", 0)]);

        h.session.stop(&mut h.source);
        let accepted = h.feed(&[("4006381333931", 5000)]);

        assert!(accepted.is_empty());
        assert_eq!(h.session.history().len(), 1);
        assert_eq!(
            h.sink.statuses().last().map(String::as_str),
            Some("Scanner stopped")
        );
    }

    #[test]
    fn test_restart_after_stop() {
        let mut h = Harness::open(&window_config(2000), Box::new(MemoryStore::new()), builtin())
            .started();
        h.session.stop(&mut h.source);

        let _events = h.session.start(&mut h.source).unwrap();
        assert!(h.session.is_active());
        assert_eq!(h.feed(&[("0123456789012", 0)]).len(), 1);
    }

    #[tokio::test]
    async fn test_run_over_line_source() {
        let input = std::io::Cursor::new(
            "EAN-13:5901234123457\n\
             EAN-13:5901234123457\n\
             \n\
             {\"code\":\"0123456789012\",\"format\":\"ean_13\",\"confidence\":0.02}\n\
             1234567890123 code_128\n",
        );

        let store = MemoryStore::new();
        let mut h = Harness::open(&window_config(2000), Box::new(store.clone()), builtin());
        let mut source = LineSource::new(input);

        let events = h.session.start(&mut source).unwrap();
        let accepted = h.session.run(events).await;
        h.session.stop(&mut source);

        assert_eq!(accepted, 3);
        assert_eq!(
            h.codes(),
            vec!["1234567890123", "0123456789012", "5901234123457"]
        );
        assert_eq!(h.session.history().records()[2].format, "EAN_13");
        assert_eq!(h.session.history().records()[0].format, "CODE_128");
        assert_eq!(store.save_count(), 3);
    }

    #[tokio::test]
    async fn test_stop_handle_ends_run() {
        let mut h = Harness::open(&window_config(2000), Box::new(MemoryStore::new()), builtin());
        let events = h.session.start(&mut h.source).unwrap();
        let sender = h.source.sender.clone().unwrap();

        sender
            .send(DecodeEvent::Detected(ScanEvent::new("0123456789012")))
            .await
            .unwrap();
        h.session.stop_handle().request_stop();

        // The stop request wins over pending events
        assert_eq!(h.session.run(events).await, 0);
        assert!(h.session.history().is_empty());
    }
}
