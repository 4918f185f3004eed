//! Protobuf parser for NYCT subway GTFS Realtime feeds.
//!
//! [`parse_feed`] decodes raw bytes into a [`FeedMessage`]. [`trip_events`]
//! then flattens the trip updates of a decoded feed into [`TripEvent`]s.

use chrono::{DateTime, Utc};
use prost::Message;
use std::collections::HashMap;
use tracing::debug;

use crate::error::DecodeError;
use crate::gtfs_rt::nyct_trip_descriptor::Direction as NyctDirection;
use crate::gtfs_rt::trip_update::StopTimeUpdate;
use crate::gtfs_rt::{FeedMessage, TripUpdate};
use crate::headway::{Direction, StopEvent, TripEvent};

/// Stop ids starting with this letter belong to the Staten Island Railway.
const ISLAND_STOP_PREFIX: char = 'S';

/// Line code reported for every Staten Island Railway trip.
pub const ISLAND_LINE: &str = "SI";

/// Decodes a protobuf-encoded GTFS-RT [`FeedMessage`] from raw bytes.
///
/// # Errors
///
/// Returns an error if the bytes are not valid protobuf for a `FeedMessage`.
pub fn parse_feed(bytes: &[u8]) -> Result<FeedMessage, DecodeError> {
    Ok(FeedMessage::decode(bytes)?)
}

/// Decoding capability handed to the pipeline at startup.
pub trait FeedDecoder: Send + Sync {
    /// Decodes one feed snapshot.
    fn decode(&self, bytes: &[u8]) -> Result<FeedMessage, DecodeError>;

    /// Resolves a raw trip direction code.
    fn direction(&self, code: i32) -> Option<Direction>;
}

/// [`FeedDecoder`] backed by the bundled NYCT schema.
#[derive(Debug, Clone)]
pub struct NyctDecoder {
    directions: HashMap<i32, Direction>,
}

impl NyctDecoder {
    /// Builds the direction-code table from the schema's `Direction` enum.
    pub fn load() -> Self {
        let directions = [
            NyctDirection::North,
            NyctDirection::East,
            NyctDirection::South,
            NyctDirection::West,
        ]
        .into_iter()
        .map(|d| (d as i32, Direction::from(d)))
        .collect();

        Self { directions }
    }
}

impl Default for NyctDecoder {
    fn default() -> Self {
        Self::load()
    }
}

impl FeedDecoder for NyctDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<FeedMessage, DecodeError> {
        parse_feed(bytes)
    }

    fn direction(&self, code: i32) -> Option<Direction> {
        self.directions.get(&code).copied()
    }
}

impl From<NyctDirection> for Direction {
    fn from(d: NyctDirection) -> Self {
        match d {
            NyctDirection::North => Direction::North,
            NyctDirection::East => Direction::East,
            NyctDirection::South => Direction::South,
            NyctDirection::West => Direction::West,
        }
    }
}

/// Decodes `bytes` and extracts its trip events in one step.
pub fn decode_trips(
    decoder: &dyn FeedDecoder,
    bytes: &[u8],
) -> Result<Vec<TripEvent>, DecodeError> {
    let feed = decoder.decode(bytes)?;
    debug!(entity_count = feed.entity.len(), "Feed decoded");
    Ok(trip_events(&feed, decoder))
}

/// Extracts one [`TripEvent`] per trip-update entity, in feed order.
///
/// Entities of other kinds are ignored. Trip updates missing the NYCT train
/// id or carrying an unknown direction code are skipped.
pub fn trip_events(feed: &FeedMessage, decoder: &dyn FeedDecoder) -> Vec<TripEvent> {
    feed.entity
        .iter()
        .filter_map(|entity| {
            let update = entity.trip_update.as_ref()?;
            trip_event(&entity.id, update, decoder)
        })
        .collect()
}

fn trip_event(
    entity_id: &str,
    update: &TripUpdate,
    decoder: &dyn FeedDecoder,
) -> Option<TripEvent> {
    let Some(nyct) = update.trip.nyct_trip_descriptor.as_ref() else {
        debug!(entity_id, "Trip update has no NYCT descriptor, skipping");
        return None;
    };

    let Some(line) = nyct.train_id.as_deref().and_then(line_from_train_id) else {
        debug!(entity_id, train_id = ?nyct.train_id, "No line in train id, skipping");
        return None;
    };

    let Some(direction) = nyct.direction.and_then(|code| decoder.direction(code)) else {
        debug!(entity_id, direction = ?nyct.direction, "Unknown direction code, skipping");
        return None;
    };

    let stops: Vec<StopEvent> = update
        .stop_time_update
        .iter()
        .filter_map(stop_event)
        .collect();

    let line = match stops.first() {
        Some(first) if first.stop_id.starts_with(ISLAND_STOP_PREFIX) => ISLAND_LINE.to_string(),
        _ => line,
    };

    Some(TripEvent {
        line,
        direction,
        stops,
    })
}

/// The line is the second character of the train id, e.g. `"0A 1234+ 207/FAR"`.
fn line_from_train_id(train_id: &str) -> Option<String> {
    train_id.chars().nth(1).map(String::from)
}

fn stop_event(update: &StopTimeUpdate) -> Option<StopEvent> {
    let stop_id = strip_platform_suffix(update.stop_id.as_deref()?);

    let time = update
        .arrival
        .as_ref()
        .and_then(|e| e.time)
        .or_else(|| update.departure.as_ref().and_then(|e| e.time));

    Some(StopEvent {
        stop_id: stop_id.to_string(),
        timestamp: time.and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)),
    })
}

/// Drops the trailing platform direction letter, e.g. `"101N"` becomes `"101"`.
fn strip_platform_suffix(stop_id: &str) -> &str {
    let mut chars = stop_id.chars();
    chars.next_back();
    chars.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gtfs_rt::trip_update::StopTimeEvent;
    use crate::gtfs_rt::{
        FeedEntity, FeedHeader, NyctTripDescriptor, TripDescriptor, VehiclePosition,
    };

    fn stop(stop_id: &str, arrival: Option<i64>, departure: Option<i64>) -> StopTimeUpdate {
        StopTimeUpdate {
            stop_id: Some(stop_id.to_string()),
            arrival: arrival.map(|time| StopTimeEvent {
                time: Some(time),
                ..Default::default()
            }),
            departure: departure.map(|time| StopTimeEvent {
                time: Some(time),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn trip_entity(
        id: &str,
        train_id: &str,
        direction: i32,
        stops: Vec<StopTimeUpdate>,
    ) -> FeedEntity {
        FeedEntity {
            id: id.to_string(),
            trip_update: Some(TripUpdate {
                trip: TripDescriptor {
                    nyct_trip_descriptor: Some(NyctTripDescriptor {
                        train_id: Some(train_id.to_string()),
                        is_assigned: Some(true),
                        direction: Some(direction),
                    }),
                    ..Default::default()
                },
                stop_time_update: stops,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn feed(entity: Vec<FeedEntity>) -> FeedMessage {
        FeedMessage {
            header: FeedHeader {
                gtfs_realtime_version: "1.0".to_string(),
                timestamp: Some(1_700_000_000),
                ..Default::default()
            },
            entity,
        }
    }

    #[test]
    fn test_parse_empty_bytes_returns_default_feed() {
        // An empty byte array decodes to a FeedMessage with default values
        let feed = parse_feed(&[]).unwrap();
        assert_eq!(feed.header.gtfs_realtime_version, "");
        assert!(feed.entity.is_empty());
    }

    #[test]
    fn test_parse_invalid_bytes() {
        let invalid_bytes = vec![0xFF, 0xFE, 0x00, 0x01];
        assert!(parse_feed(&invalid_bytes).is_err());
    }

    #[test]
    fn test_parse_roundtrip_keeps_nyct_descriptor() {
        let encoded =
            feed(vec![trip_entity("1", "0A 1234+ 207/FAR", 1, vec![])]).encode_to_vec();
        let parsed = parse_feed(&encoded).unwrap();

        let nyct = parsed.entity[0]
            .trip_update
            .as_ref()
            .and_then(|u| u.trip.nyct_trip_descriptor.as_ref())
            .unwrap();
        assert_eq!(nyct.train_id.as_deref(), Some("0A 1234+ 207/FAR"));
        assert_eq!(nyct.direction, Some(NyctDirection::North as i32));
    }

    #[test]
    fn test_direction_table() {
        let decoder = NyctDecoder::load();
        assert_eq!(decoder.direction(1), Some(Direction::North));
        assert_eq!(decoder.direction(2), Some(Direction::East));
        assert_eq!(decoder.direction(3), Some(Direction::South));
        assert_eq!(decoder.direction(4), Some(Direction::West));
        assert_eq!(decoder.direction(0), None);
        assert_eq!(decoder.direction(9), None);
    }

    #[test]
    fn test_trip_event_fields() {
        let decoder = NyctDecoder::load();
        let feed = feed(vec![trip_entity(
            "1",
            "0A 1234+ 207/FAR",
            3,
            vec![stop("A02S", Some(1_700_000_060), Some(1_700_000_090))],
        )]);

        let events = trip_events(&feed, &decoder);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].line, "A");
        assert_eq!(events[0].direction, Direction::South);
        assert_eq!(events[0].stops[0].stop_id, "A02");
        assert_eq!(
            events[0].stops[0].timestamp,
            DateTime::<Utc>::from_timestamp(1_700_000_060, 0)
        );
    }

    #[test]
    fn test_departure_used_when_arrival_missing() {
        let decoder = NyctDecoder::load();
        let feed = feed(vec![trip_entity(
            "1",
            "01 0915 SFY/242",
            1,
            vec![
                stop("142N", None, Some(1_700_000_300)),
                stop("139N", None, None),
            ],
        )]);

        let events = trip_events(&feed, &decoder);
        let stops = &events[0].stops;
        assert_eq!(stops.len(), 2);
        assert_eq!(
            stops[0].timestamp,
            DateTime::<Utc>::from_timestamp(1_700_000_300, 0)
        );
        assert_eq!(stops[1].stop_id, "139");
        assert_eq!(stops[1].timestamp, None);
    }

    #[test]
    fn test_island_stop_overrides_line() {
        let decoder = NyctDecoder::load();
        let feed = feed(vec![trip_entity(
            "1",
            "0A 1234+ 207/FAR",
            1,
            vec![stop("S10N", Some(1_700_000_000), None)],
        )]);

        let events = trip_events(&feed, &decoder);
        assert_eq!(events[0].line, ISLAND_LINE);
        assert_eq!(events[0].stops[0].stop_id, "S10");
    }

    #[test]
    fn test_non_trip_entities_are_ignored() {
        let decoder = NyctDecoder::load();
        let vehicle = FeedEntity {
            id: "2".to_string(),
            vehicle: Some(VehiclePosition::default()),
            ..Default::default()
        };
        let feed = feed(vec![
            vehicle,
            trip_entity("1", "0E 0800 JAM/WTC", 1, vec![stop("E01N", None, None)]),
        ]);

        let events = trip_events(&feed, &decoder);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].line, "E");
    }

    #[test]
    fn test_malformed_trips_are_skipped() {
        let decoder = NyctDecoder::load();
        let no_descriptor = FeedEntity {
            id: "3".to_string(),
            trip_update: Some(TripUpdate::default()),
            ..Default::default()
        };
        let feed = feed(vec![
            no_descriptor,
            trip_entity("4", "0", 1, vec![]),
            trip_entity("5", "0G 0700 CRS/CNQ", 42, vec![]),
        ]);

        assert!(trip_events(&feed, &decoder).is_empty());
    }

    #[test]
    fn test_decode_trips_propagates_decode_error() {
        let decoder = NyctDecoder::load();
        assert!(decode_trips(&decoder, &[0xFF, 0xFE, 0x00, 0x01]).is_err());
    }

    #[test]
    fn test_strip_platform_suffix() {
        assert_eq!(strip_platform_suffix("101N"), "101");
        assert_eq!(strip_platform_suffix("N"), "");
        assert_eq!(strip_platform_suffix(""), "");
    }
}
