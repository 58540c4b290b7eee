//! Desired-state vs observed-state reconciliation.
//!
//! [`reconcile`] is the core of the sync engine: given the desired event set
//! (freshly normalized from the itinerary) and the observed event set (read
//! from the target calendar at the start of the pass), it computes the
//! minimal plan of creates and field-minimal updates.
//!
//! The function is pure; applying the plan against the target is the
//! daemon's job. Statelessness across passes is the load-bearing invariant:
//! both inputs are re-materialized every pass, so a plan can never act on
//! stale local bookkeeping.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::event::{CalendarEvent, EventKey, EventPatch, ObservedEvent};

/// A single scheduled update: which target event to patch, and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOp {
    /// Provider-assigned identifier of the event to patch.
    pub event_id: String,
    /// External key of the flight, for reporting.
    pub key: EventKey,
    /// The fields to change. Never empty.
    pub patch: EventPatch,
}

/// The outcome of diffing desired against observed state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// Desired events with no observed counterpart.
    pub to_create: Vec<CalendarEvent>,
    /// Observed events whose fields drifted from the desired state.
    pub to_update: Vec<UpdateOp>,
    /// Number of desired events already in sync.
    pub unchanged: usize,
    /// Keys of events this system created whose flight no longer appears in
    /// the desired set. Reported, never deleted: a transient partial fetch
    /// upstream must not destroy calendar state.
    pub orphaned: Vec<EventKey>,
}

impl ReconcilePlan {
    /// Returns true if the plan requires no writes.
    pub fn is_noop(&self) -> bool {
        self.to_create.is_empty() && self.to_update.is_empty()
    }

    /// Returns the number of write operations in the plan.
    pub fn operation_count(&self) -> usize {
        self.to_create.len() + self.to_update.len()
    }
}

/// Diffs the desired event set against the observed event set.
///
/// Matching is by external key. Observed events without a recognizable key
/// (created manually by the user) are excluded from matching and never
/// touched. Desired events are processed in (start, key) order so plans and
/// logs are reproducible across runs.
pub fn reconcile(desired: &[CalendarEvent], observed: &[ObservedEvent]) -> ReconcilePlan {
    // Index keyed observed events. First claim on a key wins; later
    // claimants are left untouched since mutating either copy risks data.
    let mut by_key: HashMap<&EventKey, &ObservedEvent> = HashMap::new();
    for event in observed {
        let Some(ref key) = event.key else {
            continue;
        };
        if let Some(existing) = by_key.get(key) {
            warn!(
                key = %key,
                kept = %existing.id,
                ignored = %event.id,
                "multiple observed events claim the same key"
            );
            continue;
        }
        by_key.insert(key, event);
    }

    let mut ordered: Vec<&CalendarEvent> = desired.iter().collect();
    ordered.sort_by(|a, b| (a.start, &a.key).cmp(&(b.start, &b.key)));

    let mut plan = ReconcilePlan::default();
    let mut desired_keys: HashSet<&EventKey> = HashSet::new();

    for event in ordered {
        desired_keys.insert(&event.key);
        match by_key.get(&event.key) {
            None => plan.to_create.push(event.clone()),
            Some(existing) => {
                let patch = event.diff(existing);
                if patch.is_empty() {
                    plan.unchanged += 1;
                } else {
                    plan.to_update.push(UpdateOp {
                        event_id: existing.id.clone(),
                        key: event.key.clone(),
                        patch,
                    });
                }
            }
        }
    }

    plan.orphaned = by_key
        .keys()
        .filter(|key| !desired_keys.contains(*key))
        .map(|key| (*key).clone())
        .collect();
    plan.orphaned.sort();

    plan
}
