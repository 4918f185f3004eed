use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::headway::estimate::wait_estimate;
use crate::headway::types::{Direction, LineState, Minutes, Snapshot, TripEvent};
use crate::headway::utility::rounded_mean;

type StopTimes<'a> = BTreeMap<&'a str, Vec<Option<DateTime<Utc>>>>;

/// Rolls the trip events of one partition fetch into per-line direction estimates.
///
/// Stop events are grouped by (line, direction, stop). Each stop gets a
/// [`wait_estimate`], and each direction's estimate is the rounded, unweighted
/// mean of its stops. Directions without stops are left out.
pub fn aggregate_snapshot(trips: &[TripEvent]) -> Snapshot {
    let mut grouped: BTreeMap<&str, BTreeMap<Direction, StopTimes<'_>>> = BTreeMap::new();

    for trip in trips {
        let directions = grouped.entry(trip.line.as_str()).or_default();
        for stop in &trip.stops {
            directions
                .entry(trip.direction)
                .or_default()
                .entry(stop.stop_id.as_str())
                .or_default()
                .push(stop.timestamp);
        }
    }

    let mut snapshot = Snapshot::new();

    for (line, directions) in grouped {
        let state: LineState = directions
            .into_iter()
            .map(|(direction, stops)| {
                let per_stop: Vec<Minutes> =
                    stops.values().map(|times| wait_estimate(times)).collect();
                (direction, rounded_mean(&per_stop))
            })
            .collect();

        if !state.is_empty() {
            snapshot.insert(line.to_string(), state);
        }
    }

    snapshot
}
