//! Invocation tracing and the boot trace report.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use bootline_protocols::{InvocationMode, TraceMode};

use crate::action::Action;

/// One action call within an invocation.
#[derive(Debug, Clone, Serialize)]
pub struct ActionRecord {
    /// Registration position within the target.
    pub index: usize,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub ok: bool,
}

impl ActionRecord {
    pub fn duration_ms(&self) -> f64 {
        duration_ms(self.started_at, self.finished_at)
    }
}

/// One invocation of a target.
#[derive(Debug, Clone, Serialize)]
pub struct InvocationRecord {
    pub target: String,
    pub mode: InvocationMode,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub ok: bool,
    pub actions: Vec<ActionRecord>,
}

fn duration_ms(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start)
        .num_microseconds()
        .map(|us| us as f64 / 1000.0)
        .unwrap_or_default()
}

#[derive(Default)]
struct TraceLog {
    /// Records removed by [`Tracer::take`] so far.
    drained: usize,
    records: Vec<InvocationRecord>,
}

/// Collects invocation records in start order.
///
/// Records are kept for the lifetime of the context, including invocations
/// made after the boot through `Booted::context`. Long-lived
/// contexts should drain them with [`take`](Self::take).
pub struct Tracer {
    log: Mutex<TraceLog>,
}

impl Tracer {
    pub fn new() -> Self {
        Self {
            log: Mutex::new(TraceLog::default()),
        }
    }

    /// Open a record for an invocation that is about to run.
    pub(crate) fn begin(&self, target: &str, mode: InvocationMode) -> InvocationScope<'_> {
        let mut log = self.log.lock();
        log.records.push(InvocationRecord {
            target: target.to_string(),
            mode,
            started_at: Utc::now(),
            finished_at: None,
            ok: false,
            actions: Vec::new(),
        });
        InvocationScope {
            tracer: self,
            seq: log.drained + log.records.len() - 1,
            actions: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of every record so far.
    pub fn records(&self) -> Vec<InvocationRecord> {
        self.log.lock().records.clone()
    }

    /// Remove and return every record so far.
    ///
    /// Invocations still running when their record is taken are not updated
    /// when they finish.
    pub fn take(&self) -> Vec<InvocationRecord> {
        let mut log = self.log.lock();
        log.drained += log.records.len();
        std::mem::take(&mut log.records)
    }

    /// Number of recorded invocations.
    pub fn len(&self) -> usize {
        self.log.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render the report in the requested style.
    pub fn render(&self, mode: TraceMode) -> String {
        let records = self.records();
        match mode {
            TraceMode::Full => serde_json::to_string_pretty(&records).unwrap_or_default(),
            TraceMode::Compact => render_compact(&records),
        }
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::new()
    }
}

fn render_compact(records: &[InvocationRecord]) -> String {
    let mut lines = Vec::new();
    for record in records.iter().filter(|r| !r.actions.is_empty()) {
        let status = if record.ok { "" } else { " FAILED" };
        lines.push(format!("{} [{}]{}", record.target, record.mode, status));
        for action in &record.actions {
            let mut line = format!("  - {} ({:.2}ms)", action.name, action.duration_ms());
            if let Some(source) = &action.source {
                line.push_str(&format!(" @ {}", source));
            }
            if !action.ok {
                line.push_str(" FAILED");
            }
            lines.push(line);
        }
    }
    lines.join("\n")
}

/// An invocation in progress. Action records may arrive in any order and are
/// sorted by registration position when the scope finishes.
pub(crate) struct InvocationScope<'a> {
    tracer: &'a Tracer,
    /// Position of the record since the tracer was created.
    seq: usize,
    actions: Mutex<Vec<ActionRecord>>,
}

impl InvocationScope<'_> {
    pub(crate) fn record(&self, index: usize, action: &Action, started_at: DateTime<Utc>, ok: bool) {
        self.actions.lock().push(ActionRecord {
            index,
            name: action.name.clone(),
            source: action.trace.clone(),
            started_at,
            finished_at: Utc::now(),
            ok,
        });
    }

    pub(crate) fn finish(self, ok: bool) {
        let mut actions = self.actions.into_inner();
        actions.sort_by_key(|record| record.index);

        let mut log = self.tracer.log.lock();
        let slot = self.seq.checked_sub(log.drained);
        if let Some(record) = slot.and_then(|slot| log.records.get_mut(slot)) {
            record.finished_at = Some(Utc::now());
            record.ok = ok;
            record.actions = actions;
        }
    }
}
