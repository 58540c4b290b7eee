//! One reconciliation pass: fetch, normalize, diff, apply.
//!
//! A pass materializes the full desired and observed sets before diffing —
//! there is no incremental state carried between passes, which is what makes
//! repeated unsynchronized polling safe. A fetch failure on either side
//! aborts the pass before any write; per-operation apply failures are
//! collected into the [`PassReport`] without stopping the remaining writes.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use futures_util::StreamExt;
use tracing::debug;

use tripsync_core::{CalendarEvent, ReconcilePlan, UpdateOp, normalize_trips, reconcile};
use tripsync_providers::{EventTarget, ItinerarySource, TripFilter};

use crate::config::DaemonConfig;
use crate::error::DaemonResult;
use crate::report::{ApplyFailure, ApplyOperation, PassReport};

/// How far back the observed-event listing reaches.
///
/// Without past trips we still look one day back so a flight currently in
/// the air stays patchable; with past trips we reach a year back, matching
/// how far a personal itinerary realistically extends.
fn list_window_start(now: DateTime<Utc>, include_past: bool) -> DateTime<Utc> {
    if include_past {
        now - Duration::days(365)
    } else {
        now - Duration::days(1)
    }
}

enum WriteOp {
    Create(CalendarEvent),
    Update(UpdateOp),
}

enum Applied {
    Created,
    Updated,
}

/// Executes reconciliation passes against a source and a target.
pub struct SyncPass {
    source: Arc<dyn ItinerarySource>,
    target: Arc<dyn EventTarget>,
    config: DaemonConfig,
}

impl SyncPass {
    /// Creates a pass runner.
    pub fn new(
        source: Arc<dyn ItinerarySource>,
        target: Arc<dyn EventTarget>,
        config: DaemonConfig,
    ) -> Self {
        Self {
            source,
            target,
            config,
        }
    }

    /// Runs one complete pass.
    ///
    /// Returns `Err` only when a full fetch fails; apply failures are part
    /// of the returned report.
    pub async fn run(&self) -> DaemonResult<PassReport> {
        let filter = TripFilter::new()
            .with_past(self.config.include_past)
            .with_cancelled(self.config.include_cancelled);

        let trips = self.source.list_trips(filter).await?;
        let desired = normalize_trips(&trips);
        debug!(
            trips = trips.len(),
            desired = desired.len(),
            "normalized itinerary"
        );

        let from = list_window_start(Utc::now(), self.config.include_past);
        let observed = self
            .target
            .list_events(&self.config.calendar_id, from)
            .await?;

        let plan = reconcile(&desired, &observed);
        debug!(
            creates = plan.to_create.len(),
            updates = plan.to_update.len(),
            unchanged = plan.unchanged,
            "computed plan"
        );

        Ok(self.apply(plan).await)
    }

    /// Applies the plan with bounded concurrency.
    ///
    /// Every operation targets a distinct external key, so ordering among
    /// them does not matter; only the bound does.
    async fn apply(&self, plan: ReconcilePlan) -> PassReport {
        let mut report = PassReport {
            unchanged: plan.unchanged,
            orphaned: plan.orphaned,
            ..Default::default()
        };

        let ops: Vec<WriteOp> = plan
            .to_create
            .into_iter()
            .map(WriteOp::Create)
            .chain(plan.to_update.into_iter().map(WriteOp::Update))
            .collect();

        let results: Vec<Result<Applied, ApplyFailure>> =
            futures_util::stream::iter(ops.into_iter().map(|op| self.apply_one(op)))
                .buffer_unordered(self.config.apply_concurrency.max(1))
                .collect()
                .await;

        for result in results {
            match result {
                Ok(Applied::Created) => report.created += 1,
                Ok(Applied::Updated) => report.updated += 1,
                Err(failure) => report.failures.push(failure),
            }
        }

        report
    }

    async fn apply_one(&self, op: WriteOp) -> Result<Applied, ApplyFailure> {
        match op {
            WriteOp::Create(event) => self
                .target
                .create_event(&self.config.calendar_id, &event)
                .await
                .map(|_| Applied::Created)
                .map_err(|e| ApplyFailure {
                    key: event.key.clone(),
                    operation: ApplyOperation::Create,
                    code: e.code(),
                    message: e.to_string(),
                }),
            WriteOp::Update(update) => self
                .target
                .update_event(&self.config.calendar_id, &update.event_id, &update.patch)
                .await
                .map(|_| Applied::Updated)
                .map_err(|e| ApplyFailure {
                    key: update.key.clone(),
                    operation: ApplyOperation::Update,
                    code: e.code(),
                    message: e.to_string(),
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::{FixedOffset, TimeZone};

    use tripsync_core::{
        EventPatch, FlightSegment, ObservedEvent, SegmentStatus, Trip,
    };
    use tripsync_providers::{
        BoxFuture, ProviderError, ProviderErrorCode, ProviderResult,
    };

    fn at(offset_hours: i32, y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(offset_hours * 3600)
            .unwrap()
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
    }

    fn segment(number: &str, day: u32) -> FlightSegment {
        FlightSegment::new("AB", number, "JFK", "LHR")
            .with_departure(at(-4, 2024, 5, day, 18, 0))
            .with_arrival(at(1, 2024, 5, day + 1, 6, 0))
            .with_status(SegmentStatus::Scheduled)
    }

    fn config() -> DaemonConfig {
        DaemonConfig::new("primary")
    }

    struct StubSource {
        trips: Vec<Trip>,
    }

    impl ItinerarySource for StubSource {
        fn name(&self) -> &str {
            "stub"
        }

        fn list_trips(&self, _filter: TripFilter) -> BoxFuture<'_, ProviderResult<Vec<Trip>>> {
            let trips = self.trips.clone();
            Box::pin(async move { Ok(trips) })
        }
    }

    struct FailingSource;

    impl ItinerarySource for FailingSource {
        fn name(&self) -> &str {
            "failing"
        }

        fn list_trips(&self, _filter: TripFilter) -> BoxFuture<'_, ProviderResult<Vec<Trip>>> {
            Box::pin(async {
                Err(ProviderError::source_unavailable("upstream down").with_provider("failing"))
            })
        }
    }

    /// In-memory event target with optional per-key create rejection.
    struct StubTarget {
        events: Mutex<Vec<ObservedEvent>>,
        reject_creates: HashSet<String>,
        next_id: AtomicUsize,
        writes: AtomicUsize,
    }

    impl StubTarget {
        fn new(events: Vec<ObservedEvent>) -> Self {
            Self {
                events: Mutex::new(events),
                reject_creates: HashSet::new(),
                next_id: AtomicUsize::new(1),
                writes: AtomicUsize::new(0),
            }
        }

        fn rejecting(mut self, key: &str) -> Self {
            self.reject_creates.insert(key.to_string());
            self
        }

        fn snapshot(&self) -> Vec<ObservedEvent> {
            self.events.lock().unwrap().clone()
        }

        fn write_count(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }
    }

    impl EventTarget for StubTarget {
        fn name(&self) -> &str {
            "stub"
        }

        fn list_events(
            &self,
            _calendar_id: &str,
            _from: DateTime<Utc>,
        ) -> BoxFuture<'_, ProviderResult<Vec<ObservedEvent>>> {
            let events = self.snapshot();
            Box::pin(async move { Ok(events) })
        }

        fn create_event(
            &self,
            _calendar_id: &str,
            event: &CalendarEvent,
        ) -> BoxFuture<'_, ProviderResult<ObservedEvent>> {
            let event = event.clone();
            Box::pin(async move {
                self.writes.fetch_add(1, Ordering::SeqCst);
                if self.reject_creates.contains(event.key.as_str()) {
                    return Err(
                        ProviderError::target_rejected("create rejected").with_provider("stub")
                    );
                }
                let id = format!("gen-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
                let observed = ObservedEvent::from_desired(id, &event);
                self.events.lock().unwrap().push(observed.clone());
                Ok(observed)
            })
        }

        fn update_event(
            &self,
            _calendar_id: &str,
            event_id: &str,
            patch: &EventPatch,
        ) -> BoxFuture<'_, ProviderResult<ObservedEvent>> {
            let event_id = event_id.to_string();
            let patch = patch.clone();
            Box::pin(async move {
                self.writes.fetch_add(1, Ordering::SeqCst);
                let mut events = self.events.lock().unwrap();
                let Some(event) = events.iter_mut().find(|e| e.id == event_id) else {
                    return Err(
                        ProviderError::target_rejected("no such event").with_provider("stub")
                    );
                };
                patch.apply_to(event);
                Ok(event.clone())
            })
        }
    }

    fn pass_with(trips: Vec<Trip>, target: Arc<StubTarget>) -> SyncPass {
        SyncPass::new(Arc::new(StubSource { trips }), target, config())
    }

    mod full_pass {
        use super::*;

        #[tokio::test]
        async fn creates_events_for_fresh_itinerary() {
            let trip = Trip::new("trip-1")
                .with_segment(segment("123", 1))
                .with_segment(segment("124", 8));
            let target = Arc::new(StubTarget::new(Vec::new()));

            let report = pass_with(vec![trip], target.clone()).run().await.unwrap();

            assert_eq!(report.created, 2);
            assert_eq!(report.updated, 0);
            assert_eq!(report.unchanged, 0);
            assert!(!report.completed_with_errors());
            assert_eq!(target.snapshot().len(), 2);
        }

        #[tokio::test]
        async fn second_pass_is_noop() {
            let trip = Trip::new("trip-1")
                .with_segment(segment("123", 1))
                .with_segment(segment("124", 8));
            let target = Arc::new(StubTarget::new(Vec::new()));

            let first = pass_with(vec![trip.clone()], target.clone())
                .run()
                .await
                .unwrap();
            assert_eq!(first.applied(), 2);

            let second = pass_with(vec![trip], target.clone()).run().await.unwrap();
            assert_eq!(second.applied(), 0);
            assert_eq!(second.unchanged, 2);
            assert_eq!(target.write_count(), 2);
        }

        #[tokio::test]
        async fn drifted_event_is_patched_then_stable() {
            let trip = Trip::new("trip-1").with_segment(segment("123", 1));
            let target = Arc::new(StubTarget::new(Vec::new()));

            pass_with(vec![trip.clone()], target.clone())
                .run()
                .await
                .unwrap();

            // Upstream moves the departure by 25 minutes.
            let moved = Trip::new("trip-1").with_segment(
                segment("123", 1).with_departure(at(-4, 2024, 5, 1, 18, 25)),
            );
            let report = pass_with(vec![moved.clone()], target.clone())
                .run()
                .await
                .unwrap();
            assert_eq!(report.updated, 1);

            let stable = pass_with(vec![moved], target.clone()).run().await.unwrap();
            assert_eq!(stable.applied(), 0);
            assert_eq!(stable.unchanged, 1);
        }
    }

    mod failure_handling {
        use super::*;

        #[tokio::test]
        async fn fetch_failure_aborts_before_any_write() {
            let target = Arc::new(StubTarget::new(Vec::new()));
            let pass = SyncPass::new(Arc::new(FailingSource), target.clone(), config());

            let err = pass.run().await.unwrap_err();
            assert!(matches!(err, crate::error::DaemonError::Fetch(_)));
            assert_eq!(target.write_count(), 0);
        }

        #[tokio::test]
        async fn rejected_create_does_not_abort_the_rest() {
            let trip = Trip::new("trip-1")
                .with_segment(segment("123", 1))
                .with_segment(segment("124", 8))
                .with_segment(segment("125", 15));
            let target =
                Arc::new(StubTarget::new(Vec::new()).rejecting("AB124-2024-05-08"));

            let report = pass_with(vec![trip], target.clone()).run().await.unwrap();

            assert_eq!(report.created, 2);
            assert_eq!(report.failures.len(), 1);
            assert!(report.completed_with_errors());

            let failure = &report.failures[0];
            assert_eq!(failure.key.as_str(), "AB124-2024-05-08");
            assert_eq!(failure.operation, ApplyOperation::Create);
            assert_eq!(failure.code, ProviderErrorCode::TargetRejected);
            assert_eq!(target.snapshot().len(), 2);
        }

        #[tokio::test]
        async fn failed_create_retried_on_next_pass() {
            let trip = Trip::new("trip-1").with_segment(segment("123", 1));
            let rejecting =
                Arc::new(StubTarget::new(Vec::new()).rejecting("AB123-2024-05-01"));

            let report = pass_with(vec![trip.clone()], rejecting.clone())
                .run()
                .await
                .unwrap();
            assert_eq!(report.failures.len(), 1);

            // Same calendar contents, target healthy again: the desired event
            // is recomputed fresh and created this time.
            let healthy = Arc::new(StubTarget::new(rejecting.snapshot()));
            let report = pass_with(vec![trip], healthy.clone()).run().await.unwrap();
            assert_eq!(report.created, 1);
            assert!(!report.completed_with_errors());
        }
    }

    mod safety {
        use super::*;

        #[tokio::test]
        async fn orphans_are_reported_and_untouched() {
            let trip = Trip::new("trip-1").with_segment(segment("123", 1));
            let target = Arc::new(StubTarget::new(Vec::new()));

            pass_with(vec![trip], target.clone()).run().await.unwrap();

            // Upstream now returns nothing at all.
            let report = pass_with(Vec::new(), target.clone()).run().await.unwrap();
            assert_eq!(report.orphaned.len(), 1);
            assert_eq!(report.orphaned[0].as_str(), "AB123-2024-05-01");
            assert_eq!(report.applied(), 0);
            // Only the original create ever wrote to the target.
            assert_eq!(target.write_count(), 1);
            assert_eq!(target.snapshot().len(), 1);
        }

        #[tokio::test]
        async fn manual_events_are_never_written_to() {
            let manual = ObservedEvent::new(
                "manual-1",
                at(-4, 2024, 5, 1, 18, 0),
                at(1, 2024, 5, 2, 6, 0),
            )
            .with_title("My own note");
            let trip = Trip::new("trip-1").with_segment(segment("123", 1));
            let target = Arc::new(StubTarget::new(vec![manual.clone()]));

            let report = pass_with(vec![trip], target.clone()).run().await.unwrap();

            assert_eq!(report.created, 1);
            let snapshot = target.snapshot();
            let untouched = snapshot.iter().find(|e| e.id == "manual-1").unwrap();
            assert_eq!(untouched, &manual);
        }
    }
}
