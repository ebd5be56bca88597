//! Concurrent execution of gatherer units.
//!
//! The runner drives every enabled unit with a bounded number in flight,
//! gives each unit its own deadline, and never lets one unit's failure stop
//! another. Results keep registry order regardless of completion order.

use crate::{
    config::RunnerConfig,
    context::GatherContext,
    error::GatherError,
    gatherers::{GatherUnit, Gatherer},
    record::{ArchiveEntry, GatherResult, Record},
};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Instant;
use uuid::Uuid;

/// Archive path of the run summary.
pub const METADATA_ENTRY_PATH: &str = "clustersnap/gathers.json";

/// Outcome of one unit.
#[derive(Debug)]
pub struct UnitReport {
    /// Unit identifier
    pub id: String,
    /// Records in the order the unit produced them
    pub records: Vec<Record>,
    /// Errors the unit reported
    pub errors: Vec<GatherError>,
    /// Wall time spent in the unit (in milliseconds)
    pub duration_ms: u64,
}

impl UnitReport {
    /// Returns true when the unit reported at least one error.
    pub fn failed(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Per-unit line of the run summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStatus {
    /// Unit identifier
    pub name: String,
    /// Number of records produced
    pub records: usize,
    /// Error messages, empty on success
    pub errors: Vec<String>,
    /// Wall time spent in the unit (in milliseconds)
    pub duration_ms: u64,
}

/// A failure attributed to one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitFailure {
    /// Unit the failure belongs to
    pub gatherer: String,
    /// Error message describing the failure
    pub error_message: String,
}

/// Summary of one gather run, archived next to the records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatherMetadata {
    /// Unique identifier of this run
    pub run_id: Uuid,

    /// When the run started
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// Total run duration (in milliseconds)
    pub total_duration_ms: u64,

    /// Number of units that ran
    pub units_run: usize,

    /// Number of units that reported errors
    pub units_failed: usize,

    /// Ids of units skipped because they were disabled
    pub units_skipped: Vec<String>,

    /// Number of records produced across all units
    pub records_collected: usize,

    /// Maximum concurrency used
    pub max_concurrency: usize,

    /// Collector version
    pub collector_version: String,

    /// Per-unit outcome, in registry order
    pub status: Vec<UnitStatus>,

    /// Every failure of the run, including marshalling failures
    pub failures: Vec<UnitFailure>,
}

impl GatherMetadata {
    /// Moves a record that failed to marshal from the collected counts to
    /// the failures of `gatherer`.
    fn record_marshal_failure(&mut self, gatherer: &str, error_message: String) {
        self.records_collected = self.records_collected.saturating_sub(1);
        if let Some(status) = self.status.iter_mut().find(|s| s.name == gatherer) {
            if status.errors.is_empty() {
                self.units_failed = self.units_failed.saturating_add(1);
            }
            status.records = status.records.saturating_sub(1);
            status.errors.push(error_message.clone());
        }
        self.failures.push(UnitFailure {
            gatherer: gatherer.to_string(),
            error_message,
        });
    }
}

/// Everything one run produced.
#[derive(Debug)]
pub struct GatherReport {
    /// Unit outcomes, in registry order
    pub units: Vec<UnitReport>,
    /// Run summary
    pub metadata: GatherMetadata,
}

/// Marshalled output of a run, ready to be written.
#[derive(Debug, Clone, Default)]
pub struct ArchiveBundle {
    /// Archive entries, the run summary last
    pub entries: Vec<ArchiveEntry>,
    /// Every failure of the run
    pub failures: Vec<UnitFailure>,
}

impl GatherReport {
    /// All records of the run, in registry order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.units.iter().flat_map(|unit| unit.records.iter())
    }

    /// Reports of units that failed.
    pub fn failed_units(&self) -> impl Iterator<Item = &UnitReport> {
        self.units.iter().filter(|unit| unit.failed())
    }

    /// Marshals every record and appends the run summary.
    ///
    /// A record that fails to marshal is dropped and its failure attributed
    /// to the unit that produced it, in both the failure list and the unit's
    /// summary line. When two records share an archive path the first one
    /// that marshals wins.
    pub fn into_archive(self, ctx: &GatherContext) -> ArchiveBundle {
        let mut metadata = self.metadata;
        let mut entries = Vec::new();
        let mut seen = HashSet::new();

        for unit in self.units {
            for record in unit.records {
                let path = record.entry_path();
                if seen.contains(&path) {
                    tracing::warn!(
                        "Gatherer {} produced duplicate record {}, keeping the first",
                        unit.id,
                        path
                    );
                    continue;
                }

                match record.to_entry(ctx) {
                    Ok(entry) => {
                        seen.insert(path);
                        entries.push(entry);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to marshal record {}: {}", record.name, e);
                        metadata.record_marshal_failure(
                            &unit.id,
                            format!("record {}: {}", record.name, e),
                        );
                    }
                }
            }
        }

        match serde_json::to_vec_pretty(&metadata) {
            Ok(bytes) => entries.push(ArchiveEntry {
                path: METADATA_ENTRY_PATH.to_string(),
                bytes,
            }),
            Err(e) => tracing::error!("Failed to serialize run summary: {}", e),
        }

        ArchiveBundle {
            entries,
            failures: metadata.failures,
        }
    }
}

/// Runs gatherer units with bounded concurrency.
#[derive(Debug, Clone, Default)]
pub struct GatherRunner {
    config: RunnerConfig,
}

impl GatherRunner {
    /// Creates a runner. Concurrency below one is raised to one.
    pub fn new(config: RunnerConfig) -> Self {
        let max_concurrency = config.max_concurrency;
        Self {
            config: config.with_max_concurrency(max_concurrency),
        }
    }

    /// The configuration this runner uses.
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Runs every enabled unit of `units` against `gatherer`.
    ///
    /// Each unit gets a child of the gatherer's context bounded by the unit
    /// timeout; cancelling the gatherer's context cancels all of them.
    pub async fn run(&self, gatherer: &Gatherer, units: &[Box<dyn GatherUnit>]) -> GatherReport {
        let started_at = chrono::Utc::now();
        let start = Instant::now();

        let (enabled, skipped): (Vec<_>, Vec<_>) = units
            .iter()
            .partition(|unit| self.config.is_enabled(unit.id()));
        let units_skipped: Vec<String> = skipped.iter().map(|u| u.id().to_string()).collect();

        for id in &units_skipped {
            tracing::info!("Gatherer {} is disabled, skipping", id);
        }
        tracing::info!(
            "Running {} gatherers with max concurrency {}",
            enabled.len(),
            self.config.max_concurrency
        );

        let unit_futures = enabled.into_iter().map(|unit| {
            let scoped = gatherer.scoped(gatherer.context().with_timeout(self.config.unit_timeout));
            async move { run_unit(&**unit, &scoped).await }
        });

        let reports: Vec<UnitReport> = stream::iter(unit_futures)
            .buffered(self.config.max_concurrency)
            .collect()
            .await;

        let metadata = summarize(
            &reports,
            units_skipped,
            started_at,
            start,
            self.config.max_concurrency,
        );

        tracing::info!(
            "Gather finished: {} gatherers, {} failed, {} records in {}ms",
            metadata.units_run,
            metadata.units_failed,
            metadata.records_collected,
            metadata.total_duration_ms
        );

        GatherReport {
            units: reports,
            metadata,
        }
    }
}

async fn run_unit(unit: &dyn GatherUnit, gatherer: &Gatherer) -> UnitReport {
    let id = unit.id();
    let start = Instant::now();

    tracing::debug!("Starting gatherer {}", id);
    let GatherResult { records, errors } = unit.gather(gatherer).await;
    let duration_ms = elapsed_ms(start);

    if errors.is_empty() {
        tracing::info!(
            "Gatherer {} collected {} record(s) in {}ms",
            id,
            records.len(),
            duration_ms
        );
    } else {
        for error in &errors {
            tracing::warn!("Gatherer {} failed: {}", id, error);
        }
    }

    UnitReport {
        id: id.to_string(),
        records,
        errors,
        duration_ms,
    }
}

fn summarize(
    reports: &[UnitReport],
    units_skipped: Vec<String>,
    started_at: chrono::DateTime<chrono::Utc>,
    start: Instant,
    max_concurrency: usize,
) -> GatherMetadata {
    let status = reports
        .iter()
        .map(|unit| UnitStatus {
            name: unit.id.clone(),
            records: unit.records.len(),
            errors: unit.errors.iter().map(ToString::to_string).collect(),
            duration_ms: unit.duration_ms,
        })
        .collect();

    let failures = reports
        .iter()
        .flat_map(|unit| {
            unit.errors.iter().map(|e| UnitFailure {
                gatherer: unit.id.clone(),
                error_message: e.to_string(),
            })
        })
        .collect();

    GatherMetadata {
        run_id: Uuid::new_v4(),
        started_at,
        total_duration_ms: elapsed_ms(start),
        units_run: reports.len(),
        units_failed: reports.iter().filter(|unit| unit.failed()).count(),
        units_skipped,
        records_collected: reports.iter().map(|unit| unit.records.len()).sum(),
        max_concurrency,
        collector_version: env!("CARGO_PKG_VERSION").to_string(),
        status,
        failures,
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::accessor::{FakeAccessor, ResourceAccessor};
    use async_trait::async_trait;
    use serde::ser::Error as _;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    struct StaticUnit {
        id: &'static str,
        names: Vec<&'static str>,
    }

    #[async_trait]
    impl GatherUnit for StaticUnit {
        fn id(&self) -> &'static str {
            self.id
        }

        async fn gather_with(&self, _: &GatherContext, _: &dyn ResourceAccessor) -> GatherResult {
            GatherResult::from_records(
                self.names
                    .iter()
                    .map(|name| Record::json(*name, json!({"name": name})))
                    .collect(),
            )
        }
    }

    struct FailingUnit;

    #[async_trait]
    impl GatherUnit for FailingUnit {
        fn id(&self) -> &'static str {
            "test/failing"
        }

        async fn gather_with(&self, _: &GatherContext, _: &dyn ResourceAccessor) -> GatherResult {
            GatherResult::from_error(GatherError::Forbidden {
                resource: "secrets".to_string(),
                reason: "no access".to_string(),
            })
        }
    }

    struct SlowUnit;

    #[async_trait]
    impl GatherUnit for SlowUnit {
        fn id(&self) -> &'static str {
            "test/slow"
        }

        async fn gather_with(&self, ctx: &GatherContext, _: &dyn ResourceAccessor) -> GatherResult {
            let waited = ctx
                .run("slow call", async {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(())
                })
                .await;
            match waited {
                Ok(()) => GatherResult::empty(),
                Err(e) => GatherResult::from_error(e),
            }
        }
    }

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> std::result::Result<S::Ok, S::Error> {
            Err(S::Error::custom("refusing to serialize"))
        }
    }

    struct BrokenRecordUnit;

    #[async_trait]
    impl GatherUnit for BrokenRecordUnit {
        fn id(&self) -> &'static str {
            "test/broken"
        }

        async fn gather_with(&self, _: &GatherContext, _: &dyn ResourceAccessor) -> GatherResult {
            GatherResult::from_records(vec![
                Record::json("broken/bad", Unserializable),
                Record::json("broken/good", json!({"ok": true})),
            ])
        }
    }

    struct ShadowedRecordUnit;

    #[async_trait]
    impl GatherUnit for ShadowedRecordUnit {
        fn id(&self) -> &'static str {
            "test/shadowed"
        }

        async fn gather_with(&self, _: &GatherContext, _: &dyn ResourceAccessor) -> GatherResult {
            GatherResult::from_records(vec![
                Record::json("shared/name", Unserializable),
                Record::json("shared/name", json!({"second": true})),
            ])
        }
    }

    fn gatherer() -> Gatherer {
        Gatherer::with_accessor(Arc::new(FakeAccessor::new()), GatherContext::new())
    }

    fn static_unit(id: &'static str, names: Vec<&'static str>) -> Box<dyn GatherUnit> {
        Box::new(StaticUnit { id, names })
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_other_units() {
        let units: Vec<Box<dyn GatherUnit>> = vec![
            static_unit("test/first", vec!["first/a"]),
            Box::new(FailingUnit),
            static_unit("test/last", vec!["last/a", "last/b"]),
        ];

        let report = GatherRunner::new(RunnerConfig::new().with_max_concurrency(1))
            .run(&gatherer(), &units)
            .await;

        let ids: Vec<_> = report.units.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["test/first", "test/failing", "test/last"]);
        assert_eq!(report.metadata.units_failed, 1);
        assert_eq!(report.metadata.records_collected, 3);
        assert_eq!(report.metadata.failures.len(), 1);
        assert_eq!(report.metadata.failures[0].gatherer, "test/failing");
    }

    #[tokio::test]
    async fn test_disabled_units_are_skipped() {
        let units: Vec<Box<dyn GatherUnit>> = vec![
            static_unit("test/kept", vec!["kept"]),
            static_unit("test/dropped", vec!["dropped"]),
        ];
        let config = RunnerConfig::new().with_disabled(vec!["test/dropped".to_string()]);

        let report = GatherRunner::new(config).run(&gatherer(), &units).await;

        assert_eq!(report.units.len(), 1);
        assert_eq!(report.metadata.units_skipped, vec!["test/dropped"]);
        assert_eq!(report.records().count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unit_timeout_is_unit_scoped() {
        let units: Vec<Box<dyn GatherUnit>> = vec![
            Box::new(SlowUnit),
            static_unit("test/fast", vec!["fast"]),
        ];
        let config = RunnerConfig::new().with_unit_timeout(Duration::from_secs(5));

        let report = GatherRunner::new(config).run(&gatherer(), &units).await;

        assert!(matches!(
            report.units[0].errors.as_slice(),
            [GatherError::Timeout { .. }]
        ));
        assert!(!report.units[1].failed());
    }

    #[tokio::test]
    async fn test_cancelled_run_reports_cancellation() {
        let ctx = GatherContext::new();
        ctx.cancel();
        let gatherer = Gatherer::with_accessor(Arc::new(FakeAccessor::new()), ctx);
        let units: Vec<Box<dyn GatherUnit>> = vec![Box::new(SlowUnit)];

        let report = GatherRunner::default().run(&gatherer, &units).await;

        assert!(matches!(
            report.units[0].errors.as_slice(),
            [GatherError::Cancelled]
        ));
    }

    #[tokio::test]
    async fn test_into_archive_attributes_marshal_failures() {
        let units: Vec<Box<dyn GatherUnit>> = vec![Box::new(BrokenRecordUnit)];
        let report = GatherRunner::default().run(&gatherer(), &units).await;

        let bundle = report.into_archive(&GatherContext::new());

        let paths: Vec<_> = bundle.entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["broken/good.json", METADATA_ENTRY_PATH]);
        assert_eq!(bundle.failures.len(), 1);
        assert_eq!(bundle.failures[0].gatherer, "test/broken");
        assert!(bundle.failures[0].error_message.contains("broken/bad"));
    }

    #[tokio::test]
    async fn test_marshal_failure_is_reflected_in_summary() {
        let units: Vec<Box<dyn GatherUnit>> = vec![
            Box::new(BrokenRecordUnit),
            static_unit("test/ok", vec!["ok"]),
        ];
        let report = GatherRunner::default().run(&gatherer(), &units).await;
        assert_eq!(report.metadata.records_collected, 3);

        let bundle = report.into_archive(&GatherContext::new());
        let summary = bundle
            .entries
            .iter()
            .find(|e| e.path == METADATA_ENTRY_PATH)
            .unwrap();
        let metadata: GatherMetadata = serde_json::from_slice(&summary.bytes).unwrap();

        assert_eq!(metadata.units_failed, 1);
        assert_eq!(metadata.records_collected, 2);
        assert_eq!(metadata.status[0].name, "test/broken");
        assert_eq!(metadata.status[0].records, 1);
        assert_eq!(metadata.status[0].errors.len(), 1);
        assert!(metadata.status[0].errors[0].contains("broken/bad"));
        assert!(metadata.status[1].errors.is_empty());
        assert_eq!(metadata.failures.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_record_does_not_shadow_later_duplicate() {
        let units: Vec<Box<dyn GatherUnit>> = vec![Box::new(ShadowedRecordUnit)];
        let report = GatherRunner::default().run(&gatherer(), &units).await;

        let bundle = report.into_archive(&GatherContext::new());

        let shared: Vec<_> = bundle
            .entries
            .iter()
            .filter(|e| e.path == "shared/name.json")
            .collect();
        assert_eq!(shared.len(), 1);
        let parsed: serde_json::Value = serde_json::from_slice(&shared[0].bytes).unwrap();
        assert_eq!(parsed, json!({"second": true}));
        assert_eq!(bundle.failures.len(), 1);
    }

    #[tokio::test]
    async fn test_into_archive_keeps_first_duplicate() {
        let units: Vec<Box<dyn GatherUnit>> = vec![
            static_unit("test/one", vec!["shared/name"]),
            static_unit("test/two", vec!["shared/name", "unique"]),
        ];
        let report = GatherRunner::default().run(&gatherer(), &units).await;

        let bundle = report.into_archive(&GatherContext::new());
        let shared: Vec<_> = bundle
            .entries
            .iter()
            .filter(|e| e.path == "shared/name.json")
            .collect();
        assert_eq!(shared.len(), 1);
        assert_eq!(bundle.entries.len(), 3);
    }

    #[tokio::test]
    async fn test_metadata_entry_is_valid_json() {
        let units: Vec<Box<dyn GatherUnit>> = vec![
            static_unit("test/ok", vec!["ok"]),
            Box::new(FailingUnit),
        ];
        let report = GatherRunner::default().run(&gatherer(), &units).await;
        let bundle = report.into_archive(&GatherContext::new());

        let summary = bundle
            .entries
            .iter()
            .find(|e| e.path == METADATA_ENTRY_PATH)
            .unwrap();
        let metadata: GatherMetadata = serde_json::from_slice(&summary.bytes).unwrap();

        assert_eq!(metadata.units_run, 2);
        assert_eq!(metadata.status[1].name, "test/failing");
        assert_eq!(metadata.status[1].errors.len(), 1);
        assert_eq!(metadata.collector_version, env!("CARGO_PKG_VERSION"));
    }
}
