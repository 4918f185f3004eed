use serde::Serialize;
use std::collections::BTreeMap;

use crate::headway::types::{LineState, Minutes};

/// Coarse service level of a line, derived from its northbound estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ServiceTier {
    Rapid,
    Frequent,
    Degraded,
}

/// Static name and description of a tier, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TierInfo {
    pub name: &'static str,
    pub desc: &'static str,
}

/// Lines grouped by tier. Tiers with no lines are absent.
pub type TieredView = BTreeMap<ServiceTier, BTreeMap<String, LineState>>;

impl ServiceTier {
    pub const ALL: [ServiceTier; 3] = [
        ServiceTier::Rapid,
        ServiceTier::Frequent,
        ServiceTier::Degraded,
    ];

    /// Maps an estimate in minutes onto a tier.
    ///
    /// | Minutes | Tier     |
    /// |---------|----------|
    /// | <= 6    | Rapid    |
    /// | <= 12   | Frequent |
    /// | > 12    | Degraded |
    pub fn classify(minutes: Minutes) -> Self {
        match minutes {
            m if m <= 6 => ServiceTier::Rapid,
            m if m <= 12 => ServiceTier::Frequent,
            _ => ServiceTier::Degraded,
        }
    }

    pub fn info(&self) -> TierInfo {
        match self {
            ServiceTier::Rapid => TierInfo {
                name: "Rapid",
                desc: "Every 6 mins or less",
            },
            ServiceTier::Frequent => TierInfo {
                name: "Frequent",
                desc: "Every 6-12 mins",
            },
            ServiceTier::Degraded => TierInfo {
                name: "Degraded",
                desc: "Every 13+ mins",
            },
        }
    }
}

/// Groups lines by the tier of their northbound estimate.
///
/// Lines without a northbound estimate are left out of every tier.
pub fn classify_lines<'a, I>(lines: I) -> TieredView
where
    I: IntoIterator<Item = (&'a String, &'a LineState)>,
{
    let mut view = TieredView::new();

    for (line, state) in lines {
        let Some(north) = state.north() else {
            continue;
        };
        view.entry(ServiceTier::classify(north))
            .or_default()
            .insert(line.clone(), state.clone());
    }

    view
}
