//! Payload records referenced by `events.json`
//!
//! Field names follow the wire (camelCase). `isDemo` is sent as `0`/`1`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==================== OUTBOUND ====================

/// Payload of the `auth` emit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationData {
    pub session: String,
    pub is_demo: u8,
    pub uid: i64,
    pub platform: i64,
    pub is_fast_history: bool,
    pub is_optimized: bool,
}

impl AuthorizationData {
    /// Web platform id used by the browser client
    pub const PLATFORM_WEB: i64 = 2;

    pub fn new(session: impl Into<String>, uid: i64, is_demo: bool) -> Self {
        Self {
            session: session.into(),
            is_demo: u8::from(is_demo),
            uid,
            platform: Self::PLATFORM_WEB,
            is_fast_history: true,
            is_optimized: true,
        }
    }
}

/// Payload of `changeSymbol`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeSymbolRequest {
    pub asset: String,
    /// Candle period in seconds
    pub period: i64,
}

impl ChangeSymbolRequest {
    pub fn new(asset: impl Into<String>, period: i64) -> Self {
        Self {
            asset: asset.into(),
            period,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderAction {
    Call,
    Put,
}

/// Payload of `openOrder`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenOrderRequest {
    pub asset: String,
    pub amount: i64,
    pub action: OrderAction,
    pub is_demo: u8,
    /// Echoed back on the resulting deal
    pub request_id: i64,
    pub option_type: i64,
    /// Expiration in seconds
    pub time: i64,
}

// ==================== INBOUND ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessUpdateBalance {
    pub is_demo: u8,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateHistoryFastEvent {
    pub asset: String,
    pub period: i64,
    /// `[timestamp, value, ...]` rows as sent by the server
    pub history: Vec<Vec<f64>>,
}

/// One quote of `updateStream`, timestamp in UTC seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateStreamItem {
    pub asset: String,
    pub timestamp: f64,
    pub value: f64,
}

impl UpdateStreamItem {
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        let millis = (self.timestamp * 1000.0).round();
        if !millis.is_finite() {
            return None;
        }
        DateTime::from_timestamp_millis(millis as i64)
    }
}

/// Opened or closed deal of `updateOpenedDeals` / `updateClosedDeals`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub id: String,
    pub open_time: f64,
    pub close_time: f64,
    pub open_timestamp: i64,
    #[serde(default)]
    pub close_timestamp: Option<i64>,
    #[serde(default)]
    pub refund_time: Option<f64>,
    #[serde(default)]
    pub refund_timestamp: Option<i64>,
    pub uid: i64,
    pub amount: f64,
    pub profit: f64,
    pub percent_profit: f64,
    pub percent_loss: f64,
    pub open_price: f64,
    #[serde(default)]
    pub close_price: Option<f64>,
    pub command: i64,
    pub asset: String,
    pub is_demo: u8,
    pub copy_ticket: String,
    #[serde(default)]
    pub open_ms: Option<i64>,
    #[serde(default)]
    pub close_ms: Option<i64>,
    #[serde(default)]
    pub option_type: Option<i64>,
    pub is_rollover: bool,
    pub is_copy_signal: bool,
    #[serde(rename = "isAI")]
    pub is_ai: bool,
    pub currency: String,
    #[serde(default, rename = "amountUSD")]
    pub amount_usd: Option<f64>,
    #[serde(default)]
    pub request_id: Option<i64>,
}

impl Deal {
    pub fn is_demo(&self) -> bool {
        self.is_demo != 0
    }
}
