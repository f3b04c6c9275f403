//! Wire-to-model reshaping referenced by `events.json`

use crate::models::UpdateStreamItem;

/// Server clock offset from UTC, seconds
pub const SERVER_UTC_OFFSET_SECS: f64 = 7200.0;

/// `updateStream` rows `(asset, server timestamp, value)` to UTC items
pub fn update_stream(rows: Vec<(String, f64, f64)>) -> Vec<UpdateStreamItem> {
    rows.into_iter()
        .map(|(asset, timestamp, value)| UpdateStreamItem {
            asset,
            timestamp: timestamp - SERVER_UTC_OFFSET_SECS,
            value,
        })
        .collect()
}
