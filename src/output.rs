//! Output formatting for the tier view.
//!
//! Supports JSON rendering of the current tiers and of the static tier metadata.

use anyhow::Result;
use serde_json::{Value, json};
use tracing::debug;

use crate::headway::{ServiceTier, TieredView};

/// Tiers in display order, slowest first.
const DISPLAY_ORDER: [ServiceTier; 3] = [
    ServiceTier::Degraded,
    ServiceTier::Frequent,
    ServiceTier::Rapid,
];

/// Renders the tier view as JSON: every tier with its metadata and lines,
/// including tiers that currently have no lines.
pub fn render_view(view: &TieredView) -> Value {
    let categories: Vec<Value> = DISPLAY_ORDER
        .iter()
        .map(|tier| {
            let info = tier.info();
            json!({
                "name": info.name,
                "desc": info.desc,
                "lines": view.get(tier).cloned().unwrap_or_default(),
            })
        })
        .collect();

    json!({ "categories": categories })
}

/// Renders the static tier metadata as JSON.
pub fn render_tiers() -> Value {
    let tiers: Vec<_> = DISPLAY_ORDER.iter().map(ServiceTier::info).collect();
    json!(tiers)
}

/// Logs the tier view as pretty-printed JSON at debug level.
pub fn log_view_json(view: &TieredView) -> Result<()> {
    debug!("{}", serde_json::to_string_pretty(&render_view(view))?);
    Ok(())
}
