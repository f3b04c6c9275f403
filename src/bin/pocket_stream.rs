//! Pocket Option stream
//!
//! Connects with the credentials from the environment (`PO_SESSION`,
//! `PO_UID`, optional `PO_IS_DEMO`, `.env` supported), authorizes, loads the
//! account state, subscribes to the configured symbol and logs everything
//! the server sends until Ctrl+C.
//!
//! Configuration: `config/client.yaml`, or `POCKET_OPTION_CONFIG_PATH`, or
//! the first command line argument.

use anyhow::{Context, Result};
use pocket_option_stream::bin_common::{
    load_config_from_env, parse_args, wait_for_shutdown, BinaryRunner, ConfigType, RunConfig,
};
use pocket_option_stream::eventsockets::{sync_listener, ClientEvent, ListenerResult, Value};
use pocket_option_stream::pocket_option::{
    init_tracing, ChangeSymbolRequest, ClientSettings, Credentials, Deal, PocketOptionClient, SuccessUpdateBalance,
    UpdateHistoryFastEvent, UpdateStreamItem,
};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Pause between authorization and the initial loads
const AUTH_SETTLE: Duration = Duration::from_secs(5);
/// Pause between the initial loads and the subscriptions
const LOAD_SETTLE: Duration = Duration::from_secs(2);

struct PocketStream {
    run_config: RunConfig,
    settings: ClientSettings,
    credentials: Credentials,
    client: PocketOptionClient,
}

impl PocketStream {
    fn new(settings: ClientSettings, credentials: Credentials) -> Result<Self> {
        let client = PocketOptionClient::new(&settings).context("failed to build client")?;
        Ok(Self {
            run_config: RunConfig::new("Pocket Option stream").with_stats_interval(60),
            settings,
            credentials,
            client,
        })
    }

    fn register_listeners(&self) {
        self.client
            .on_success_update_balance(sync_listener(|balance: SuccessUpdateBalance| -> ListenerResult {
                info!(balance = balance.balance, demo = balance.is_demo, "Balance");
                Ok(())
            }));

        self.client.on_update_stream(sync_listener(|items: Vec<UpdateStreamItem>| -> ListenerResult {
            for item in items {
                let at = item
                    .datetime()
                    .map(|dt| dt.format("%H:%M:%S%.3f").to_string())
                    .unwrap_or_default();
                info!(asset = %item.asset, value = item.value, at = %at, "Quote");
            }
            Ok(())
        }));

        self.client
            .on_update_history_new_fast(sync_listener(|event: UpdateHistoryFastEvent| -> ListenerResult {
                info!(asset = %event.asset, period = event.period, rows = event.history.len(), "History");
                Ok(())
            }));

        self.client.on_update_opened_deals(sync_listener(|deals: Vec<Deal>| -> ListenerResult {
            info!(count = deals.len(), "Opened deals");
            Ok(())
        }));

        self.client.on_update_closed_deals(sync_listener(|deals: Vec<Deal>| -> ListenerResult {
            let profit: f64 = deals.iter().map(|deal| deal.profit).sum();
            info!(count = deals.len(), profit, "Closed deals");
            Ok(())
        }));

        self.client
            .on_any(sync_listener(|(event, payload): (String, Value)| -> ListenerResult {
                debug!(event = %event, payload = %payload, "New message");
                Ok(())
            }));
    }

    /// Log lifecycle events from the client's event channel
    fn spawn_lifecycle_logger(&self) {
        let client = self.client.client().clone();
        std::thread::spawn(move || {
            while let Ok(event) = client.recv_event() {
                match event {
                    ClientEvent::Connected => info!("Connected to server"),
                    ClientEvent::Disconnected => warn!("Disconnected from server"),
                    ClientEvent::Reconnecting(attempt) => info!(attempt, "Reconnecting"),
                    ClientEvent::Error(message) => error!(error = %message, "Client error"),
                }
            }
            debug!("Lifecycle event stream closed");
        });
    }
}

impl BinaryRunner for PocketStream {
    async fn run(&mut self) -> Result<()> {
        self.register_listeners();
        self.spawn_lifecycle_logger();

        let options = PocketOptionClient::connect_options(&self.settings);
        self.client
            .connect_and_authorize(options, &self.credentials)
            .await
            .with_context(|| format!("failed to connect to {}", self.settings.url))?;

        if let Some(sid) = self.client.take_session_id() {
            info!(sid = %sid, "Session established");
        }

        tokio::time::sleep(AUTH_SETTLE).await;
        self.client.emit_indicator_load().await?;
        self.client.emit_favorite_load().await?;
        self.client.emit_price_alert_load().await?;

        tokio::time::sleep(LOAD_SETTLE).await;
        let subscription = &self.settings.subscription;
        self.client.emit_subscribe_symbol(subscription.asset.clone()).await?;
        self.client
            .emit_change_symbol(ChangeSymbolRequest::new(subscription.asset.clone(), subscription.period))
            .await?;
        self.client.emit_subscribe_for(subscription.asset.clone()).await?;
        info!(asset = %subscription.asset, period = subscription.period, "Subscribed");

        wait_for_shutdown(self.client.client(), self.run_config.stats_interval()).await;
        Ok(())
    }

    fn config(&self) -> &RunConfig {
        &self.run_config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args();
    let config_type = match args.first() {
        Some(path) => ConfigType::Custom(path.clone()),
        None => ConfigType::Client,
    };
    let config_path = load_config_from_env(config_type);

    let settings = if config_path.exists() {
        ClientSettings::load(&config_path)
            .with_context(|| format!("failed to load {}", config_path.display()))?
    } else {
        ClientSettings::default()
    };
    init_tracing(&settings.log_level);

    if !config_path.exists() {
        warn!("{} not found, using defaults", config_path.display());
    }
    settings.log();

    let credentials = Credentials::from_env().context("missing Pocket Option credentials")?;

    let mut app = PocketStream::new(settings, credentials)?;
    app.execute().await
}
