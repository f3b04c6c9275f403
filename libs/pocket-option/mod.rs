//! Pocket Option streaming client
//!
//! The typed surface of [`PocketOptionClient`] is generated at build time
//! from `events.json`:
//!
//! ```ignore
//! let client = PocketOptionClient::new(&settings)?;
//! client.on_update_stream(|items: Vec<UpdateStreamItem>| async move {
//!     for item in items {
//!         tracing::info!(asset = %item.asset, value = item.value, "quote");
//!     }
//!     Ok(())
//! });
//! client
//!     .connect_and_authorize(PocketOptionClient::connect_options(&settings), &credentials)
//!     .await?;
//! client.emit_subscribe_symbol("AUDCAD_otc").await?;
//! ```

pub mod client;
pub mod config;
pub mod logging;
pub mod models;
pub mod transforms;

pub use client::{PocketOptionClient, DEFAULT_ORIGIN, DEFAULT_URL, DEFAULT_USER_AGENT};
pub use config::{ClientSettings, ConfigError, Credentials, CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH};
pub use logging::init_tracing;
pub use models::*;
