//! Per-category counters, reported through the `stats`/`stats-json`
//! control commands.
//!
//! Each worker owns its own [`Stats`] -- incrementing a plain `u64` on the
//! hot path rather than a cross-process atomic, avoiding cross-process
//! contention there. Workers report a snapshot to the master over the
//! same IPC channel used for packet dequeue acks; the master sums
//! snapshots when `stats`/`stats-json` is requested.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One worker's counters at a point in time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stats {
    /// messages that reached a worker and were successfully parsed.
    pub received: u64,
    /// messages for which a response was sent on the wire.
    pub responded: u64,
    /// framing errors: couldn't parse at all.
    pub malformed: u64,
    /// `IgnoreMessage` aborts.
    pub ignored: u64,
    /// `IncompleteMessage` aborts -- distinct bucket, same observable
    /// behavior as `ignored`.
    pub incomplete: u64,
    /// `CannotRespond` aborts.
    pub cannot_respond: u64,
    /// `RateLimited` aborts.
    pub rate_limited: u64,
    /// handler exceptions during `handle` (counted toward the watchdog).
    pub handler_errors: u64,
    /// packets dropped because the work queue was full.
    pub queue_overflow: u64,
    /// bundles that exceeded the soft pipeline deadline.
    pub deadline_exceeded: u64,
    /// worker processes that crashed and were replaced.
    pub worker_restarts: u64,
    /// relay chains rejected for exceeding the hop ceiling.
    pub relay_too_deep: u64,
}

impl Stats {
    pub fn record_outcome(&mut self, bucket: &str) {
        match bucket {
            "ignored" => self.ignored += 1,
            "incomplete" => self.incomplete += 1,
            "cannot_respond" => self.cannot_respond += 1,
            "rate_limited" => self.rate_limited += 1,
            "handler_error" => self.handler_errors += 1,
            _ => {}
        }
    }

    /// sum another worker's counters into this one, field by field. Used
    /// by the master aggregating per-worker snapshots for `stats`.
    pub fn merge(&mut self, other: &Stats) {
        self.received += other.received;
        self.responded += other.responded;
        self.malformed += other.malformed;
        self.ignored += other.ignored;
        self.incomplete += other.incomplete;
        self.cannot_respond += other.cannot_respond;
        self.rate_limited += other.rate_limited;
        self.handler_errors += other.handler_errors;
        self.queue_overflow += other.queue_overflow;
        self.deadline_exceeded += other.deadline_exceeded;
        self.worker_restarts += other.worker_restarts;
        self.relay_too_deep += other.relay_too_deep;
    }

    /// render as `key value` lines for the plain-text `stats` control
    /// command: a multi-line block terminated by a line containing a
    /// single `.`.
    pub fn to_lines(&self) -> Vec<String> {
        vec![
            format!("received {}", self.received),
            format!("responded {}", self.responded),
            format!("malformed {}", self.malformed),
            format!("ignored {}", self.ignored),
            format!("incomplete {}", self.incomplete),
            format!("cannot_respond {}", self.cannot_respond),
            format!("rate_limited {}", self.rate_limited),
            format!("handler_errors {}", self.handler_errors),
            format!("queue_overflow {}", self.queue_overflow),
            format!("deadline_exceeded {}", self.deadline_exceeded),
            format!("worker_restarts {}", self.worker_restarts),
            format!("relay_too_deep {}", self.relay_too_deep),
        ]
    }
}

/// Aggregate counters keyed by worker id, kept by the master so `stats`
/// can report both totals and per-worker breakdowns.
#[derive(Debug, Clone, Default)]
pub struct StatsTable {
    pub per_worker: HashMap<u32, Stats>,
}

impl StatsTable {
    pub fn update(&mut self, worker_id: u32, snapshot: Stats) {
        self.per_worker.insert(worker_id, snapshot);
    }

    pub fn total(&self) -> Stats {
        let mut total = Stats::default();
        for s in self.per_worker.values() {
            total.merge(s);
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_sums_fields() {
        let mut a = Stats {
            received: 1,
            rate_limited: 2,
            ..Default::default()
        };
        let b = Stats {
            received: 3,
            rate_limited: 4,
            ..Default::default()
        };
        a.merge(&b);
        assert_eq!(a.received, 4);
        assert_eq!(a.rate_limited, 6);
    }

    #[test]
    fn table_total_sums_all_workers() {
        let mut table = StatsTable::default();
        table.update(
            0,
            Stats {
                received: 5,
                ..Default::default()
            },
        );
        table.update(
            1,
            Stats {
                received: 7,
                ..Default::default()
            },
        );
        assert_eq!(table.total().received, 12);
    }
}
