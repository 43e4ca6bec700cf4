//! Read path: latest row and trailing history per zone.

use chrono::Duration;
use rtm_core::{normalize_zone, EnrichedRecord, Error, Result, Zone};
use std::collections::BTreeSet;

/// Read-only view over a loaded dataset snapshot.
pub struct DatasetQuery<'a> {
    records: &'a [EnrichedRecord],
    max_history_hours: u32,
}

impl<'a> DatasetQuery<'a> {
    pub fn new(records: &'a [EnrichedRecord], max_history_hours: u32) -> Self {
        Self {
            records,
            max_history_hours,
        }
    }

    /// Distinct zones present, in zone order.
    pub fn zones(&self) -> Vec<Zone> {
        let zones: BTreeSet<Zone> = self.records.iter().map(|r| r.record.zone).collect();
        zones.into_iter().collect()
    }

    /// Most recent row for a zone.
    pub fn latest(&self, raw_zone: &str) -> Result<&'a EnrichedRecord> {
        let zone = self.resolve(raw_zone)?;
        self.records
            .iter()
            .filter(|r| r.record.zone == zone)
            .max_by_key(|r| r.record.timestamp)
            .ok_or_else(|| Error::not_found(format!("no data for zone {zone}")))
    }

    /// Rows for a zone within `hours` of its newest row, ascending by time.
    ///
    /// The window is inclusive: `hours = 24` on hourly data yields 24 rows.
    pub fn history(&self, raw_zone: &str, hours: u32) -> Result<Vec<&'a EnrichedRecord>> {
        if hours == 0 || hours > self.max_history_hours {
            return Err(Error::invalid_query(format!(
                "hours must be between 1 and {}, got {hours}",
                self.max_history_hours
            )));
        }

        let latest = self.latest(raw_zone)?;
        let zone = latest.record.zone;
        let cutoff = latest.record.timestamp - Duration::hours(i64::from(hours) - 1);

        let mut rows: Vec<&'a EnrichedRecord> = self
            .records
            .iter()
            .filter(|r| r.record.zone == zone && r.record.timestamp >= cutoff)
            .collect();
        rows.sort_by_key(|r| r.record.timestamp);
        Ok(rows)
    }

    fn resolve(&self, raw_zone: &str) -> Result<Zone> {
        if self.records.is_empty() {
            return Err(Error::not_found("dataset is empty"));
        }
        normalize_zone(raw_zone)
            .ok_or_else(|| Error::not_found(format!("unknown zone: {raw_zone:?}")))
    }
}
