//! In-memory warning log, recorded alongside the stderr `tracing` output so
//! a run can be dumped to `--write-issues PATH` and `--deny-warnings` can
//! check "did anything warn" without re-parsing log text.
//!
//! Grounded on `rari-doc/src/issues.rs`'s `InMemoryLayer`, trimmed down: we
//! don't need span-scoped field accumulation since every warning site in
//! this crate emits its `source`/`page`/`line` fields directly on the event.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock};

use dashmap::DashMap;
use serde::Serialize;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

#[derive(Debug, Clone, Default, Serialize)]
pub struct Issue {
    pub source: String,
    pub page: Option<String>,
    pub line: Option<u64>,
    pub message: String,
}

#[derive(Default)]
struct Visitor {
    issue: Issue,
}

impl Visit for Visitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.record_str(field, &format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "source" => self.issue.source = value.trim_matches('"').to_string(),
            "page" => self.issue.page = Some(value.trim_matches('"').to_string()),
            "message" => self.issue.message = value.to_string(),
            _ => {}
        }
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        if field.name() == "line" {
            self.issue.line = Some(value);
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        if field.name() == "line" && value >= 0 {
            self.issue.line = Some(value as u64);
        }
    }
}

static ISSUE_COUNTER: AtomicUsize = AtomicUsize::new(0);

#[derive(Clone, Default)]
pub struct InMemoryLayer {
    issues: Arc<DashMap<usize, Issue>>,
}

impl InMemoryLayer {
    pub fn issues(&self) -> Vec<Issue> {
        self.issues.iter().map(|e| e.value().clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

impl<S> Layer<S> for InMemoryLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() != Level::WARN {
            return;
        }
        let mut visitor = Visitor::default();
        event.record(&mut visitor);
        let id = ISSUE_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.issues.insert(id, visitor.issue);
    }
}

pub static IN_MEMORY: LazyLock<InMemoryLayer> = LazyLock::new(InMemoryLayer::default);
