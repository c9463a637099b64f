//! Property-based tests for the scan pipeline.
//!
//! Uses proptest to verify invariants across random inputs:
//! - The history never exceeds its cap
//! - The history is newest first with strictly decreasing ids
//! - The time-window policy never records a repeat inside the window
//! - Stats are consistent with the history

// Property tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use proptest::prelude::*;
use shelfscan::catalog::StaticCatalog;
use shelfscan::config::ShelfscanConfig;
use shelfscan::models::{DecodeEvent, ScanEvent};
use shelfscan::rendering::{JsonLinesSink, NoFeedback};
use shelfscan::services::deduplication::{DeduplicationConfig, DeduplicationService};
use shelfscan::services::{ManualClock, ScanSession, compute_stats_now};
use shelfscan::source::{DecodeSource, MediaConstraints};
use shelfscan::storage::MemoryStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Codes from a small pool so repeats are common.
fn code_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("0123456789012".to_string()),
        Just("0123456789013".to_string()),
        Just("5901234123457".to_string()),
        Just("4006381333931".to_string()),
        "[0-9]{8,13}",
        "[0-9]{0,7}",
    ]
}

/// `(code, delay before it in ms)` sequences.
fn events_strategy() -> impl Strategy<Value = Vec<(String, i64)>> {
    prop::collection::vec((code_strategy(), 0_i64..4000), 0..60)
}

struct NullSource;

impl DecodeSource for NullSource {
    fn start(
        &mut self,
        _constraints: &MediaConstraints,
        _events: mpsc::Sender<DecodeEvent>,
    ) -> shelfscan::Result<()> {
        Ok(())
    }

    fn stop(&mut self) {}
}

fn run_session(
    config: &ShelfscanConfig,
    events: &[(String, i64)],
) -> (ScanSession, Vec<(String, i64)>) {
    let start = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
    let clock = Arc::new(ManualClock::new(start));
    let mut session = ScanSession::open(
        config,
        Box::new(MemoryStore::new()),
        Arc::new(StaticCatalog::builtin()),
        Box::new(JsonLinesSink::new(std::io::sink())),
        Box::new(NoFeedback),
    )
    .with_clock(Box::new(Arc::clone(&clock)));

    let _events = session.start(&mut NullSource).unwrap();

    let mut accepted = Vec::new();
    let mut now = 0_i64;
    for (code, delay) in events {
        clock.advance_ms(*delay);
        now += delay;
        let decision = session
            .handle(DecodeEvent::Detected(ScanEvent::new(code.clone())))
            .unwrap();
        if decision.accepted {
            accepted.push((code.clone(), now));
        }
    }
    (session, accepted)
}

proptest! {
    /// Property: history length never exceeds the cap.
    #[test]
    fn prop_history_respects_cap(events in events_strategy(), cap in 1_usize..10) {
        let config = ShelfscanConfig::default()
            .with_history_cap(cap)
            .with_dedup(DeduplicationConfig::time_window(Duration::from_millis(500)));
        let (session, accepted) = run_session(&config, &events);

        prop_assert!(session.history().len() <= cap);
        prop_assert_eq!(session.history().len(), accepted.len().min(cap));
    }

    /// Property: the history is the accepted codes in reverse order, with
    /// strictly decreasing ids.
    #[test]
    fn prop_history_newest_first(events in events_strategy()) {
        let config = ShelfscanConfig::default()
            .with_history_cap(100)
            .with_dedup(DeduplicationConfig::time_window(Duration::from_millis(2000)));
        let (session, accepted) = run_session(&config, &events);

        let codes: Vec<String> = session.history().iter().map(|r| r.code.clone()).collect();
        let expected: Vec<String> = accepted.iter().rev().map(|(c, _)| c.clone()).collect();
        prop_assert_eq!(codes, expected);

        let ids: Vec<i64> = session.history().iter().map(|r| r.id.as_millis()).collect();
        prop_assert!(ids.windows(2).all(|w| w[0] > w[1]));
    }

    /// Property: with a time window, a code is never accepted twice within
    /// the window unless another code was accepted in between.
    #[test]
    fn prop_no_repeat_inside_window(events in events_strategy(), window in 1_u64..3000) {
        let config = ShelfscanConfig::default()
            .with_history_cap(100)
            .with_dedup(DeduplicationConfig::time_window(Duration::from_millis(window)));
        let (_session, accepted) = run_session(&config, &events);

        for pair in accepted.windows(2) {
            let ((prev, prev_at), (next, next_at)) = (&pair[0], &pair[1]);
            if prev == next {
                prop_assert!(next_at - prev_at >= i64::try_from(window).unwrap());
            }
        }
    }

    /// Property: stats agree with the history they are derived from.
    #[test]
    fn prop_stats_consistent(events in events_strategy()) {
        let config = ShelfscanConfig::default()
            .with_dedup(DeduplicationConfig::time_window(Duration::from_millis(1000)));
        let (session, _accepted) = run_session(&config, &events);

        let stats = compute_stats_now(session.history());
        prop_assert_eq!(stats.total, session.history().len());
        prop_assert!(stats.found <= stats.total);
        prop_assert!(stats.today <= stats.total);
        prop_assert_eq!(
            stats.found,
            session.history().iter().filter(|r| r.has_product()).count()
        );
    }

    /// Property: codes shorter than the minimum length are never accepted.
    #[test]
    fn prop_short_codes_rejected(code in "[0-9 ]{0,7}") {
        let mut service = DeduplicationService::default();
        let now = Utc::now();
        for offset in 0..3 {
            let decision = service.check(
                &ScanEvent::new(code.clone()),
                now + ChronoDuration::seconds(offset * 10),
            );
            prop_assert!(!decision.accepted);
        }
    }
}
