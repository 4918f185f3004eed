//! Data types shared by the estimation pipeline.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Whole minutes, used for every wait and headway estimate.
pub type Minutes = u32;

/// Direction of travel as published in the NYCT trip descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    North,
    East,
    South,
    West,
}

/// One stop of a trip update.
///
/// `timestamp` is the predicted arrival, falling back to the departure.
/// `None` means the feed carried neither.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopEvent {
    pub stop_id: String,
    pub timestamp: Option<DateTime<Utc>>,
}

/// One trip's update within a feed snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripEvent {
    pub line: String,
    pub direction: Direction,
    pub stops: Vec<StopEvent>,
}

/// Per-direction estimates for a single line.
///
/// Only directions that had at least one stop in the snapshot are present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LineState {
    directions: BTreeMap<Direction, Minutes>,
}

impl LineState {
    pub fn get(&self, direction: Direction) -> Option<Minutes> {
        self.directions.get(&direction).copied()
    }

    /// The northbound estimate, which drives tier classification.
    pub fn north(&self) -> Option<Minutes> {
        self.get(Direction::North)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Direction, Minutes)> + '_ {
        self.directions.iter().map(|(d, m)| (*d, *m))
    }

    pub fn len(&self) -> usize {
        self.directions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directions.is_empty()
    }

    pub(crate) fn insert(&mut self, direction: Direction, minutes: Minutes) {
        self.directions.insert(direction, minutes);
    }
}

impl FromIterator<(Direction, Minutes)> for LineState {
    fn from_iter<I: IntoIterator<Item = (Direction, Minutes)>>(iter: I) -> Self {
        Self {
            directions: iter.into_iter().collect(),
        }
    }
}

/// Line states computed from a single partition fetch, keyed by line code.
pub type Snapshot = BTreeMap<String, LineState>;
