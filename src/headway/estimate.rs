use chrono::{DateTime, Timelike, Utc};

use super::types::Minutes;
use super::utility::rounded_mean;

/// Estimates the wait in minutes at one (line, direction, stop) from the
/// timestamps observed there in a single snapshot.
///
/// Timestamps may arrive in any order; absent ones are ignored.
///
/// | Observations | Estimate                                         |
/// |--------------|--------------------------------------------------|
/// | 0            | 0                                                |
/// | 1            | minute-of-hour of that timestamp                 |
/// | n >= 2       | rounded mean of the n-1 consecutive gaps, sorted |
///
/// The single-observation case reports a clock minute, not a duration. Downstream
/// tiers have always been computed from this value, so it is kept as is.
pub fn wait_estimate(timestamps: &[Option<DateTime<Utc>>]) -> Minutes {
    let mut sorted: Vec<DateTime<Utc>> = timestamps.iter().flatten().copied().collect();
    sorted.sort_unstable();

    match sorted.as_slice() {
        [] => 0,
        [only] => only.minute(),
        _ => {
            let gaps: Vec<Minutes> = sorted
                .windows(2)
                .map(|pair| gap_minutes(pair[0], pair[1]))
                .collect();
            rounded_mean(&gaps)
        }
    }
}

/// Absolute whole minutes between two instants, truncating partial minutes.
fn gap_minutes(earlier: DateTime<Utc>, later: DateTime<Utc>) -> Minutes {
    let minutes = (later - earlier).num_minutes().unsigned_abs();
    Minutes::try_from(minutes).unwrap_or(Minutes::MAX)
}
