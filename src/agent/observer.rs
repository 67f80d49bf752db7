//! Progress and trace observers.
//!
//! Both are optional, fire-and-forget sinks passed in by the caller. Neither
//! can influence the outcome of a run.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::message::TokenUsage;

/// Receives human-readable progress strings at each state transition.
pub trait ProgressObserver: Send + Sync {
    /// Called with one progress line.
    fn on_progress(&self, message: &str);
}

impl<F> ProgressObserver for F
where
    F: Fn(&str) + Send + Sync,
{
    fn on_progress(&self, message: &str) {
        self(message);
    }
}

/// One reasoning call, tagged with the run's session id.
#[derive(Debug, Clone, Serialize)]
pub struct TraceEvent {
    /// Run-scoped session id.
    pub session_id: Uuid,
    /// Call name (`choose_agent`, `get_sub_queries`, ...).
    pub name: &'static str,
    /// Call parameters worth recording.
    pub metadata: Value,
}

/// Receives a [`TraceEvent`] for every reasoning call.
pub trait TraceObserver: Send + Sync {
    /// Records one event.
    fn record(&self, event: &TraceEvent);
}

/// Default trace observer: emits events as `tracing` debug records.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl TraceObserver for TracingObserver {
    fn record(&self, event: &TraceEvent) {
        debug!(
            session_id = %event.session_id,
            trace = event.name,
            metadata = %event.metadata,
            "trace event"
        );
    }
}

/// Observers, session id and token totals for one run.
///
/// Clones share the same totals, so every task of the run adds to one count.
#[derive(Clone)]
pub struct RunScope {
    session_id: Uuid,
    trace: Arc<dyn TraceObserver>,
    progress: Option<Arc<dyn ProgressObserver>>,
    usage: Arc<Mutex<TokenUsage>>,
}

impl RunScope {
    /// Creates a scope with a fresh session id.
    #[must_use]
    pub fn new(
        trace: Arc<dyn TraceObserver>,
        progress: Option<Arc<dyn ProgressObserver>>,
    ) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            trace,
            progress,
            usage: Arc::default(),
        }
    }

    /// A scope with the tracing observer and no progress sink.
    #[must_use]
    pub fn detached() -> Self {
        Self::new(Arc::new(TracingObserver), None)
    }

    /// Session id shared by all events of the run.
    #[must_use]
    pub const fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Records a trace event for a reasoning call.
    pub fn trace(&self, name: &'static str, metadata: Value) {
        self.trace.record(&TraceEvent {
            session_id: self.session_id,
            name,
            metadata,
        });
    }

    /// Adds one reasoning call's token usage to the run totals.
    pub fn record_usage(&self, usage: TokenUsage) {
        if let Ok(mut total) = self.usage.lock() {
            total.accumulate(usage);
        }
    }

    /// Token totals recorded so far.
    #[must_use]
    pub fn usage(&self) -> TokenUsage {
        self.usage.lock().map(|total| *total).unwrap_or_default()
    }

    /// Reports a state transition.
    pub fn progress(&self, message: &str) {
        info!(session_id = %self.session_id, "{message}");
        if let Some(p) = &self.progress {
            p.on_progress(message);
        }
    }

    /// Reports a recoverable failure. The run continues.
    pub fn degraded(&self, message: &str) {
        warn!(session_id = %self.session_id, "{message}");
        if let Some(p) = &self.progress {
            p.on_progress(&format!("⚠️ {message}"));
        }
    }
}

impl std::fmt::Debug for RunScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunScope")
            .field("session_id", &self.session_id)
            .field("progress", &self.progress.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<TraceEvent>>);

    impl TraceObserver for Recorder {
        fn record(&self, event: &TraceEvent) {
            if let Ok(mut events) = self.0.lock() {
                events.push(event.clone());
            }
        }
    }

    #[test]
    fn test_closure_is_progress_observer() {
        let lines = Arc::new(Mutex::new(Vec::<String>::new()));
        let sink = Arc::clone(&lines);
        let observer: Arc<dyn ProgressObserver> = Arc::new(move |msg: &str| {
            if let Ok(mut l) = sink.lock() {
                l.push(msg.to_string());
            }
        });
        let scope = RunScope::new(Arc::new(TracingObserver), Some(observer));
        scope.progress("planning");
        scope.degraded("search failed");
        let lines = lines.lock().map(|l| l.clone()).unwrap_or_default();
        assert_eq!(lines, vec!["planning".to_string(), "⚠️ search failed".to_string()]);
    }

    #[test]
    fn test_usage_is_shared_across_clones() {
        let scope = RunScope::detached();
        let task_scope = scope.clone();
        let call = TokenUsage {
            prompt_tokens: 70,
            completion_tokens: 30,
            total_tokens: 100,
        };
        scope.record_usage(call);
        task_scope.record_usage(call);
        assert_eq!(scope.usage().total_tokens, 200);
        assert_eq!(task_scope.usage().completion_tokens, 60);
    }

    #[test]
    fn test_trace_events_share_session_id() {
        let recorder = Arc::new(Recorder::default());
        let scope = RunScope::new(Arc::clone(&recorder) as Arc<dyn TraceObserver>, None);
        scope.trace("choose_agent", serde_json::json!({"query": "q"}));
        scope.trace("generate_report", serde_json::json!({}));
        let events = recorder.0.lock().map(|e| e.clone()).unwrap_or_default();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.session_id == scope.session_id()));
        assert_eq!(events[0].name, "choose_agent");
    }
}
