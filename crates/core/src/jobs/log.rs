// crates/core/src/jobs/log.rs
//! Log generation: a single entry inline, or a stream of entries on a timer.

use std::future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::registry::{JobGuard, JobRegistry};
use super::types::{JobKind, JobOutcome};
use crate::messages::resolve_message;
use crate::params::{LogParams, Severity};

/// Target generated entries are emitted on, so they can be filtered apart
/// from the server's own diagnostics.
pub const GENERATED_TARGET: &str = "dummybox::generated";

/// One generated log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Destination for generated entries.
pub trait LogSink: Send + Sync + 'static {
    fn emit(&self, entry: &LogEntry);
}

/// Emits entries as `tracing` events at their own severity.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, entry: &LogEntry) {
        let correlation_id = entry.correlation_id.as_deref();
        match entry.severity {
            Severity::Info => {
                tracing::info!(target: GENERATED_TARGET, correlation_id, "{}", entry.message)
            }
            Severity::Warning => {
                tracing::warn!(target: GENERATED_TARGET, correlation_id, "{}", entry.message)
            }
            Severity::Error => {
                tracing::error!(target: GENERATED_TARGET, correlation_id, "{}", entry.message)
            }
        }
    }
}

/// Records entries in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(e) => {
                tracing::error!("Mutex poisoned reading log entries: {e}");
                Vec::new()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LogSink for MemorySink {
    fn emit(&self, entry: &LogEntry) {
        match self.entries.lock() {
            Ok(mut entries) => entries.push(entry.clone()),
            Err(e) => tracing::error!("Mutex poisoned recording log entry: {e}"),
        }
    }
}

/// Starts log generation.
pub struct LogRunner {
    registry: Arc<JobRegistry>,
    sink: Arc<dyn LogSink>,
}

impl LogRunner {
    pub fn new(registry: Arc<JobRegistry>, sink: Arc<dyn LogSink>) -> Self {
        Self { registry, sink }
    }

    /// Emit according to `params`. Returns the job key when a repeating job
    /// was registered.
    ///
    /// - no interval, no duration: one entry, written before returning
    /// - no interval, a duration: one entry, written from a detached task
    /// - an interval: one entry now, then one per interval until the duration
    ///   elapses (or forever when the duration is zero)
    pub fn start(&self, params: &LogParams, correlation_id: Option<&str>) -> Option<String> {
        let correlation_id = correlation_id
            .filter(|_| params.include_correlation)
            .map(str::to_string);
        let template = EntryTemplate {
            params: params.clone(),
            correlation_id,
        };

        if params.interval == 0 && params.duration == 0 {
            emit_once(self.sink.as_ref(), &template);
            return None;
        }

        if params.interval == 0 {
            let sink = Arc::clone(&self.sink);
            tokio::spawn(async move {
                let outcome = emit_once(sink.as_ref(), &template);
                tracing::debug!(outcome = outcome.as_str(), "detached log entry written");
            });
            return None;
        }

        let key = self.registry.next_key(JobKind::Log);
        let token = CancellationToken::new();
        self.registry.register(&key, JobKind::Log, token.clone());
        tracing::info!(
            job_key = %key,
            interval = params.interval,
            duration = params.duration,
            level = %params.level,
            "log generation started"
        );

        let sink = Arc::clone(&self.sink);
        let guard = JobGuard::new(Arc::clone(&self.registry), key.clone());
        let interval = Duration::from_secs(params.interval);
        let deadline = (params.duration > 0).then(|| Instant::now() + Duration::from_secs(params.duration));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let expiry = async move {
                match deadline {
                    Some(deadline) => tokio::time::sleep_until(deadline).await,
                    None => future::pending::<()>().await,
                }
            };
            tokio::pin!(expiry);

            let mut emitted = 0u64;
            let outcome = loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break JobOutcome::Cancelled,
                    _ = &mut expiry => {
                        token.cancel();
                        break JobOutcome::Expired;
                    }
                    _ = ticker.tick() => {
                        sink.emit(&template.next_entry());
                        emitted += 1;
                    }
                }
            };
            tracing::info!(job_key = guard.key(), outcome = outcome.as_str(), emitted, "log generation stopped");
        });

        Some(key)
    }
}

fn emit_once(sink: &dyn LogSink, template: &EntryTemplate) -> JobOutcome {
    sink.emit(&template.next_entry());
    JobOutcome::Completed
}

/// Per-job settings; level and message are re-resolved for every entry.
struct EntryTemplate {
    params: LogParams,
    correlation_id: Option<String>,
}

impl EntryTemplate {
    fn next_entry(&self) -> LogEntry {
        LogEntry {
            severity: self.params.level.resolve(),
            message: resolve_message(self.params.message.as_deref(), self.params.size),
            correlation_id: self.correlation_id.clone(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{LogInput, LogLevel, MESSAGE_MARKER};

    fn runner() -> (Arc<JobRegistry>, Arc<MemorySink>, LogRunner) {
        let registry = Arc::new(JobRegistry::new());
        let sink = Arc::new(MemorySink::new());
        let runner = LogRunner::new(Arc::clone(&registry), sink.clone());
        (registry, sink, runner)
    }

    fn params(interval: i64, duration: i64) -> LogParams {
        LogInput {
            interval: Some(interval),
            duration: Some(duration),
            ..Default::default()
        }
        .validate()
    }

    #[tokio::test]
    async fn test_single_inline_entry() {
        let (registry, sink, runner) = runner();
        let key = runner.start(&params(0, 0), Some("abc"));
        assert_eq!(key, None);
        assert_eq!(sink.len(), 1);
        assert!(registry.is_empty());

        let entry = &sink.entries()[0];
        assert_eq!(entry.severity, Severity::Info);
        assert_eq!(entry.correlation_id.as_deref(), Some("abc"));
        assert!(entry.message.ends_with(MESSAGE_MARKER));
    }

    /// Records the runtime clock at every emit, so spacing is observable
    /// under paused time.
    #[derive(Default)]
    struct ClockSink {
        emitted_at: Mutex<Vec<Instant>>,
    }

    impl ClockSink {
        fn instants(&self) -> Vec<Instant> {
            self.emitted_at.lock().unwrap().clone()
        }
    }

    impl LogSink for ClockSink {
        fn emit(&self, _entry: &LogEntry) {
            self.emitted_at.lock().unwrap().push(Instant::now());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_entries_until_duration() {
        let registry = Arc::new(JobRegistry::new());
        let sink = Arc::new(ClockSink::default());
        let runner = LogRunner::new(Arc::clone(&registry), sink.clone());

        let started = Instant::now();
        let key = runner.start(&params(2, 10), None).unwrap();
        assert!(registry.contains(&key));

        tokio::time::sleep(Duration::from_secs(12)).await;
        let instants = sink.instants();
        assert!((5..=6).contains(&instants.len()), "got {} entries", instants.len());
        assert!(!registry.contains(&key));

        assert!(instants[0] - started < Duration::from_millis(100));
        for pair in instants.windows(2) {
            let gap = pair[1] - pair[0];
            assert!(
                gap >= Duration::from_millis(1900) && gap <= Duration::from_millis(2100),
                "gap {gap:?}"
            );
        }
    }

    #[test]
    fn test_one_shot_reports_completed() {
        let sink = MemorySink::new();
        let template = EntryTemplate {
            params: params(0, 0),
            correlation_id: None,
        };
        assert_eq!(emit_once(&sink, &template), JobOutcome::Completed);
        assert_eq!(sink.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_entry_is_immediate() {
        let (registry, sink, runner) = runner();
        runner.start(&params(60, 0), None).unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(sink.len(), 1);
        registry.cancel_all();
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_duration_runs_until_cancelled() {
        let (registry, sink, runner) = runner();
        let key = runner.start(&params(1, 0), None).unwrap();

        tokio::time::sleep(Duration::from_millis(4500)).await;
        assert_eq!(sink.len(), 5);
        assert!(registry.contains(&key));

        assert!(registry.cancel(&key));
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(sink.len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_duration_without_interval_emits_once_detached() {
        let (registry, sink, runner) = runner();
        assert_eq!(runner.start(&params(0, 30), None), None);
        assert!(registry.is_empty());

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(sink.len(), 1);
    }

    #[tokio::test]
    async fn test_correlation_can_be_disabled() {
        let (_registry, sink, runner) = runner();
        let mut p = params(0, 0);
        p.include_correlation = false;
        runner.start(&p, Some("abc"));
        assert_eq!(sink.entries()[0].correlation_id, None);
    }

    #[tokio::test]
    async fn test_custom_message_and_level() {
        let (_registry, sink, runner) = runner();
        let p = LogInput {
            level: Some("ERROR".into()),
            message: Some("disk full".into()),
            ..Default::default()
        }
        .validate();
        assert_eq!(p.level, LogLevel::Error);
        runner.start(&p, None);

        let entry = &sink.entries()[0];
        assert_eq!(entry.severity, Severity::Error);
        assert_eq!(entry.message, "disk full (Fake message)");
    }

    #[test]
    fn test_tracing_sink_does_not_panic_without_subscriber() {
        TracingSink.emit(&LogEntry {
            severity: Severity::Warning,
            message: "hello (Fake message)".into(),
            correlation_id: Some("abc".into()),
            timestamp: Utc::now(),
        });
    }
}
