//! Time entries and the aggregation over them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tabs_core::{DomainError, DomainResult, Entity, ProjectId, TimeEntryId};

/// Date + time pattern used when rendering entry timestamps (`10/18/26 14:05`).
pub const TIMESTAMP_FORMAT: &str = "%x %H:%M";

/// A recorded or in-progress work interval.
///
/// `stop` is `None` while the timer is running. `delta` is the recorded duration in
/// seconds; it is supplied by whoever closes the entry, never derived here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEntry {
    id: TimeEntryId,
    project_id: ProjectId,
    start: DateTime<Utc>,
    stop: Option<DateTime<Utc>>,
    delta: Option<i64>,
}

/// Fields needed to add a time entry; the id is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTimeEntry {
    pub project_id: ProjectId,
    pub start: DateTime<Utc>,
    pub stop: Option<DateTime<Utc>>,
    pub delta: Option<i64>,
}

impl NewTimeEntry {
    /// Check the interval before anything is persisted.
    pub fn validate(&self) -> DomainResult<()> {
        match self.stop {
            Some(stop) if stop < self.start => Err(DomainError::invariant(format!(
                "time entry stops ({stop}) before it starts ({})",
                self.start
            ))),
            _ => Ok(()),
        }
    }
}

impl TimeEntry {
    /// Build an entry, enforcing `stop >= start` when a stop is present.
    pub fn new(id: TimeEntryId, fields: NewTimeEntry) -> DomainResult<Self> {
        fields.validate()?;
        Ok(Self {
            id,
            project_id: fields.project_id,
            start: fields.start,
            stop: fields.stop,
            delta: fields.delta,
        })
    }

    pub fn project_id(&self) -> ProjectId {
        self.project_id
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn stop(&self) -> Option<DateTime<Utc>> {
        self.stop
    }

    pub fn delta(&self) -> Option<i64> {
        self.delta
    }

    /// An entry without a stop is still running.
    pub fn is_running(&self) -> bool {
        self.stop.is_none()
    }

    pub fn formatted_start(&self) -> String {
        self.start.format(TIMESTAMP_FORMAT).to_string()
    }

    /// Formatted stop, or an empty string while the entry is running.
    pub fn formatted_stop(&self) -> String {
        self.stop
            .map(|stop| stop.format(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_default()
    }

    /// Delta as decimal text, or an empty string when none was recorded.
    pub fn formatted_delta(&self) -> String {
        self.delta.map(|d| d.to_string()).unwrap_or_default()
    }
}

impl Entity for TimeEntry {
    type Id = TimeEntryId;
    const KIND: &'static str = "TimeEntry";

    fn id(&self) -> TimeEntryId {
        self.id
    }
}

/// A time entry joined with its project's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeEntryWithProject {
    pub entry: TimeEntry,
    pub project_name: Option<String>,
}

/// Sum of every recorded delta. Entries without a delta contribute nothing.
///
/// Fails instead of wrapping when the sum leaves the `i64` range.
pub fn total_delta<'a, I>(entries: I) -> DomainResult<i64>
where
    I: IntoIterator<Item = &'a TimeEntry>,
{
    entries
        .into_iter()
        .filter_map(TimeEntry::delta)
        .try_fold(0i64, i64::checked_add)
        .ok_or_else(|| DomainError::invariant("delta total exceeds the i64 range"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, h, m, 0).unwrap()
    }

    fn entry(id: i64, stop: Option<DateTime<Utc>>, delta: Option<i64>) -> TimeEntry {
        TimeEntry::new(
            TimeEntryId::new(id),
            NewTimeEntry {
                project_id: ProjectId::new(1),
                start: at(9, 0),
                stop,
                delta,
            },
        )
        .unwrap()
    }

    #[test]
    fn rejects_stop_before_start() {
        let err = TimeEntry::new(
            TimeEntryId::new(1),
            NewTimeEntry {
                project_id: ProjectId::new(1),
                start: at(10, 0),
                stop: Some(at(9, 59)),
                delta: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn zero_length_interval_is_allowed() {
        let e = entry(1, Some(at(9, 0)), Some(0));
        assert!(!e.is_running());
        assert_eq!(e.formatted_delta(), "0");
    }

    #[test]
    fn formats_timestamps_with_fixed_pattern() {
        let e = entry(1, Some(at(17, 30)), Some(30_600));
        assert_eq!(e.formatted_start(), "03/09/24 09:00");
        assert_eq!(e.formatted_stop(), "03/09/24 17:30");
    }

    #[test]
    fn open_entry_renders_empty_stop_and_delta() {
        let e = entry(1, None, None);
        assert!(e.is_running());
        assert_eq!(e.formatted_stop(), "");
        assert_eq!(e.formatted_delta(), "");
    }

    #[test]
    fn total_skips_missing_deltas() {
        let entries = vec![
            entry(1, Some(at(10, 0)), Some(3600)),
            entry(2, None, None),
            entry(3, Some(at(9, 30)), Some(1800)),
        ];
        assert_eq!(total_delta(&entries), Ok(5400));
        assert_eq!(total_delta(&Vec::<TimeEntry>::new()), Ok(0));
    }

    #[test]
    fn total_refuses_to_wrap_past_i64_max() {
        let entries = vec![entry(1, None, Some(i64::MAX)), entry(2, None, Some(1))];
        let err = total_delta(&entries).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));

        let negative = vec![entry(1, None, Some(i64::MIN)), entry(2, None, Some(-1))];
        assert!(total_delta(&negative).is_err());
    }

    proptest! {
        #[test]
        fn total_matches_sum_of_present_deltas(deltas in proptest::collection::vec(proptest::option::of(0i64..1_000_000), 0..32)) {
            let entries: Vec<TimeEntry> = deltas
                .iter()
                .enumerate()
                .map(|(i, d)| entry(i as i64 + 1, None, *d))
                .collect();
            let expected: i64 = deltas.iter().flatten().sum();
            prop_assert_eq!(total_delta(&entries), Ok(expected));
        }

        #[test]
        fn formatting_never_fails_for_valid_intervals(start in 0i64..4_000_000_000, len in proptest::option::of(0i64..1_000_000)) {
            let start = DateTime::<Utc>::from_timestamp(start, 0).unwrap();
            let stop = len.map(|l| start + chrono::Duration::seconds(l));
            let e = TimeEntry::new(
                TimeEntryId::new(1),
                NewTimeEntry { project_id: ProjectId::new(1), start, stop, delta: len },
            ).unwrap();
            prop_assert!(!e.formatted_start().is_empty());
            prop_assert_eq!(e.formatted_stop().is_empty(), stop.is_none());
        }
    }
}
