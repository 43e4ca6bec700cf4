//! Dataset assembly.
//!
//! Joins the per-zone price points with the zone-independent load points on
//! the hour, then forward-fills load gaps within each zone's series.

use rtm_core::{CanonicalRecord, CanonicalTable, LoadPoint, PricePoint, Timestamp, Zone};
use std::collections::HashMap;

/// Build a canonical table from normalized price and load points.
///
/// Output is sorted by (zone, timestamp). A row without a load for its hour
/// takes the previous load of the same zone; leading gaps stay `None`.
pub fn assemble(prices: &[PricePoint], loads: &[LoadPoint]) -> CanonicalTable {
    if prices.is_empty() {
        return Vec::new();
    }

    let load_by_hour: HashMap<Timestamp, f64> = loads
        .iter()
        .map(|point| (point.timestamp, point.system_load))
        .collect();

    let mut table: CanonicalTable = prices
        .iter()
        .map(|point| CanonicalRecord {
            timestamp: point.timestamp,
            zone: point.zone,
            price: Some(point.price),
            system_load: load_by_hour.get(&point.timestamp).copied(),
        })
        .collect();

    table.sort_by_key(|record| record.key());
    forward_fill_load(&mut table);
    table
}

/// Fill missing loads from the previous row of the same zone.
///
/// Expects the table sorted by (zone, timestamp).
pub fn forward_fill_load(table: &mut [CanonicalRecord]) {
    let mut previous: Option<(Zone, f64)> = None;

    for record in table.iter_mut() {
        match (record.system_load, previous) {
            (Some(load), _) => previous = Some((record.zone, load)),
            (None, Some((zone, load))) if zone == record.zone => record.system_load = Some(load),
            (None, _) => previous = None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn hour(h: i64) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(h)
    }

    fn price(zone: Zone, h: i64, price: f64) -> PricePoint {
        PricePoint {
            zone,
            timestamp: hour(h),
            price,
        }
    }

    fn load(h: i64, system_load: f64) -> LoadPoint {
        LoadPoint {
            timestamp: hour(h),
            system_load,
        }
    }

    #[test]
    fn test_join_and_sort() {
        let prices = vec![
            price(Zone::West, 0, 30.0),
            price(Zone::North, 1, 21.0),
            price(Zone::North, 0, 20.0),
        ];
        let loads = vec![load(0, 1000.0), load(1, 1100.0)];

        let table = assemble(&prices, &loads);
        assert_eq!(table.len(), 3);
        assert_eq!(table[0].key(), (Zone::North, hour(0)));
        assert_eq!(table[0].system_load, Some(1000.0));
        assert_eq!(table[1].key(), (Zone::North, hour(1)));
        assert_eq!(table[1].system_load, Some(1100.0));
        assert_eq!(table[2].key(), (Zone::West, hour(0)));
        assert_eq!(table[2].system_load, Some(1000.0));
    }

    #[test]
    fn test_forward_fill_stays_within_zone() {
        let prices = vec![
            price(Zone::North, 0, 20.0),
            price(Zone::North, 1, 21.0),
            price(Zone::North, 2, 22.0),
            price(Zone::West, 1, 30.0),
            price(Zone::West, 2, 31.0),
        ];
        // Only hour 0 has a load.
        let loads = vec![load(0, 1000.0)];

        let table = assemble(&prices, &loads);
        let north: Vec<_> = table.iter().filter(|r| r.zone == Zone::North).collect();
        assert!(north.iter().all(|r| r.system_load == Some(1000.0)));

        // WEST has no prior load of its own to carry.
        let west: Vec<_> = table.iter().filter(|r| r.zone == Zone::West).collect();
        assert!(west.iter().all(|r| r.system_load.is_none()));
    }

    #[test]
    fn test_no_loads() {
        let table = assemble(&[price(Zone::South, 0, 10.0)], &[]);
        assert_eq!(table.len(), 1);
        assert_eq!(table[0].system_load, None);
        assert_eq!(table[0].price, Some(10.0));
    }

    #[test]
    fn test_no_prices() {
        assert!(assemble(&[], &[load(0, 1000.0)]).is_empty());
    }
}
