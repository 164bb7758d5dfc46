// MIT License - Copyright (c) 2026 dsc2mqtt contributors
// MQTT bridge

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{FixedOffset, Local, NaiveDateTime, Utc};
use clap::Parser;
use figment::providers::{Env, Format, Toml};
use figment::Figment;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use serde::Deserialize;
use tokio::signal::unix::{signal, SignalKind};
use tokio::time::{interval, timeout, Duration, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use dsc_bridge::{PanelEvent, PanelSession, SessionConfig, ZoneState};

const MQTT_STATE_ON: &str = "ON";
const MQTT_STATE_OFF: &str = "OFF";
const PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);

/// Config sections that can be overridden from the environment as `<SECTION>_<KEY>`.
const ENV_SECTIONS: [&str; 3] = ["logger", "dsc", "mqtt"];

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "dsc2mqtt")]
#[command(about = "Bridge between a DSC alarm panel serial interface and MQTT")]
struct Cli {
    /// Path to the TOML configuration file. Built-in defaults are used when omitted;
    /// environment variables (DSC_PORT, MQTT_HOST, ...) override either.
    #[arg(long)]
    config: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Config {
    logger: LoggerToml,
    dsc: DscToml,
    mqtt: MqttToml,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct LoggerToml {
    /// Filter used when RUST_LOG is not set
    level: String,
    encoding: LogEncoding,
    /// Console encoding only
    color: bool,
}

impl Default for LoggerToml {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            encoding: LogEncoding::Console,
            color: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum LogEncoding {
    #[default]
    Console,
    Json,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct DscToml {
    port: String,
    baud: u32,
    /// 0 disables the periodic full status request
    full_update_interval_secs: u64,
    time_zone: String,
    ack_timeout_ms: u64,
}

impl Default for DscToml {
    fn default() -> Self {
        Self {
            port: "/dev/alarmsystem".to_string(),
            baud: 9600,
            full_update_interval_secs: 3600,
            time_zone: "Local".to_string(),
            ack_timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct MqttToml {
    host: String,
    port: u16,
    username: String,
    password: String,
    client_id: String,
    topic: String,
}

impl Default for MqttToml {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            username: "mqtt".to_string(),
            password: "mqtt".to_string(),
            client_id: "dscmqtt".to_string(),
            topic: "dsc/zone".to_string(),
        }
    }
}

/// Load configuration from multiple sources
///
/// Priority (highest to lowest):
/// 1. Environment variables (`DSC_PORT`, `MQTT_CLIENT_ID`, ...)
/// 2. The TOML file given with `--config`
/// 3. Default values
fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut figment = Figment::new();
    if let Some(path) = path {
        if !path.is_file() {
            anyhow::bail!("Config file {} not found", path.display());
        }
        figment = figment.merge(Toml::file(path));
    }
    for section in ENV_SECTIONS {
        figment = figment.merge(section_env(section));
    }

    figment
        .extract()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {e}"))
}

/// `DSC_FULL_UPDATE_INTERVAL_SECS` -> `dsc.full_update_interval_secs`
fn section_env(section: &'static str) -> Env {
    Env::prefixed(&format!("{}_", section.to_ascii_uppercase()))
        .map(move |key| format!("{section}.{}", key.as_str().to_ascii_lowercase()).into())
}

fn build_session_config(dsc: &DscToml) -> SessionConfig {
    SessionConfig::builder()
        .port(&dsc.port)
        .baud_rate(dsc.baud)
        .ack_timeout_ms(dsc.ack_timeout_ms)
        .span(tracing::info_span!("panel", port = %dsc.port))
        .build()
}

/// Time zone used when pushing the clock to the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PanelTimeZone {
    Local,
    Fixed(FixedOffset),
}

impl PanelTimeZone {
    fn now(&self) -> NaiveDateTime {
        match self {
            PanelTimeZone::Local => Local::now().naive_local(),
            PanelTimeZone::Fixed(offset) => Utc::now().with_timezone(offset).naive_local(),
        }
    }
}

impl FromStr for PanelTimeZone {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "" | "Local" | "local" => Ok(PanelTimeZone::Local),
            "UTC" | "utc" | "Z" => {
                let utc = FixedOffset::east_opt(0).context("zero offset")?;
                Ok(PanelTimeZone::Fixed(utc))
            }
            other => FixedOffset::from_str(other)
                .map(PanelTimeZone::Fixed)
                .map_err(|e| anyhow::anyhow!("Invalid time zone {other:?}: {e}")),
        }
    }
}

fn init_logging(logger: &LoggerToml) {
    // RUST_LOG wins over the config file (e.g. RUST_LOG=dsc_bridge=debug).
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logger.level));

    match logger.encoding {
        LogEncoding::Json => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(env_filter)
                .init();
        }
        // systemd journal already adds timestamps, so omit them when running under systemd
        LogEncoding::Console if std::env::var_os("JOURNAL_STREAM").is_some() => {
            tracing_subscriber::fmt()
                .without_time()
                .with_ansi(false)
                .with_env_filter(env_filter)
                .init();
        }
        LogEncoding::Console => {
            tracing_subscriber::fmt()
                .with_ansi(logger.color)
                .with_env_filter(env_filter)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// MQTT
// ---------------------------------------------------------------------------

fn zone_topic(base: &str, zone_id: &str) -> String {
    format!("{base}/{zone_id}")
}

fn zone_payload(state: ZoneState) -> &'static str {
    match state {
        ZoneState::Open => MQTT_STATE_ON,
        ZoneState::Closed => MQTT_STATE_OFF,
    }
}

/// Publish a retained message, giving up after [`PUBLISH_TIMEOUT`].
async fn publish(client: &AsyncClient, topic: &str, payload: &str) {
    match timeout(
        PUBLISH_TIMEOUT,
        client.publish(topic, QoS::AtMostOnce, true, payload.to_string()),
    )
    .await
    {
        Ok(Ok(())) => debug!("Published {payload} to {topic}"),
        Ok(Err(e)) => error!("Could not publish to {topic}: {e}"),
        Err(_) => error!("Timed out publishing to {topic}"),
    }
}

fn connect_mqtt(mqtt: &MqttToml) -> (AsyncClient, rumqttc::EventLoop) {
    let mut opts = MqttOptions::new(&mqtt.client_id, &mqtt.host, mqtt.port);
    opts.set_keep_alive(Duration::from_secs(30));
    opts.set_clean_session(true);
    if !mqtt.username.is_empty() {
        opts.set_credentials(&mqtt.username, &mqtt.password);
    }
    AsyncClient::new(opts, 64)
}

/// Drive the MQTT connection; resubscribes after every broker (re)connect.
async fn run_mqtt_eventloop(mut eventloop: rumqttc::EventLoop, client: AsyncClient, topic: String) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                info!("MQTT: connected, subscribing to {topic}");
                if let Err(e) = client.subscribe(&topic, QoS::AtMostOnce).await {
                    error!("Failed to subscribe to {topic}: {e}");
                }
            }
            Ok(Event::Incoming(Packet::Publish(msg))) => {
                debug!(
                    "MQTT message on {}: {}",
                    msg.topic,
                    String::from_utf8_lossy(&msg.payload)
                );
            }
            Ok(_) => {}
            Err(e) => {
                error!("MQTT event loop error: {e}");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Panel event dispatch
// ---------------------------------------------------------------------------

/// What the dispatch loop should do after handling an event.
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop(String),
}

async fn handle_panel_event(
    event: PanelEvent,
    client: &AsyncClient,
    topic: &str,
    panel: &Arc<PanelSession>,
    time_zone: PanelTimeZone,
) -> Flow {
    match event {
        PanelEvent::Zone { state, id } => {
            publish(client, &zone_topic(topic, &id), zone_payload(state)).await;
            info!(state = %state, id = %id, "Zone state");
        }
        PanelEvent::Version { version } => {
            info!("Panel software version {version}, updating clock");
            let panel = Arc::clone(panel);
            tokio::spawn(async move {
                let now = time_zone.now();
                info!("Updating panel time to {now}");
                if let Err(e) = panel.request_time_update(now).await {
                    warn!("Time update failed: {e}");
                }
            });
        }
        PanelEvent::Unknown { code } => {
            info!(code = %code, "Panel message");
        }
        PanelEvent::Error(e) if e.is_fatal() => {
            error!("Panel connection lost: {e}");
            return Flow::Stop(e.to_string());
        }
        PanelEvent::Error(e) => {
            error!("DSC error: {e}");
        }
    }
    Flow::Continue
}

fn spawn_full_update_task(panel: Arc<PanelSession>, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            info!("Requesting full update");
            if let Err(e) = panel.request_full_status().await {
                warn!("Full status request failed: {e}");
            }
        }
    })
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_logging(&config.logger);

    let time_zone: PanelTimeZone = config.dsc.time_zone.parse()?;

    let panel = PanelSession::open(build_session_config(&config.dsc))
        .await
        .context("Could not initialize DSC panel")?;
    let panel = Arc::new(panel);
    info!("Panel connected on {}", config.dsc.port);

    let (client, eventloop) = connect_mqtt(&config.mqtt);
    let topic = config.mqtt.topic.clone();
    let mqtt_handle = tokio::spawn(run_mqtt_eventloop(eventloop, client.clone(), topic.clone()));

    let full_update_handle = match config.dsc.full_update_interval_secs {
        0 => None,
        secs => Some(spawn_full_update_task(
            Arc::clone(&panel),
            Duration::from_secs(secs),
        )),
    };

    let mut sigterm = signal(SignalKind::terminate())?;
    let events = panel.event_stream();

    info!("Bridge running. Send SIGINT/SIGTERM to stop.");
    let outcome = loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    break Err(anyhow::anyhow!("Panel event queue closed"));
                };
                if let Flow::Stop(reason) =
                    handle_panel_event(event, &client, &topic, &panel, time_zone).await
                {
                    break Err(anyhow::anyhow!("Panel reader stopped: {reason}"));
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received SIGINT, shutting down...");
                break Ok(());
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down...");
                break Ok(());
            }
        }
    };

    if let Some(handle) = full_update_handle {
        handle.abort();
        let _ = handle.await;
    }
    if let Err(e) = client.disconnect().await {
        debug!("MQTT disconnect: {e}");
    }
    mqtt_handle.abort();

    match Arc::try_unwrap(panel) {
        Ok(panel) => {
            if let Err(e) = panel.close().await {
                warn!("Error closing panel session: {e}");
            }
        }
        Err(_arc) => {
            warn!("Could not unwrap panel Arc for clean close (tasks still hold references)");
        }
    }

    info!("Shutdown complete");
    outcome
}
