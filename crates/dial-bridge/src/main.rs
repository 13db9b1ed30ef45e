//! dial-bridge — entry point.
//!
//! A headless relay between one Bluetooth-LE smart dial and any number of
//! WebSocket clients.  Gestures, firmware, and battery state fan out to
//! every connected client as short text frames; client text flows back to
//! the device as LED-matrix display commands.
//!
//! # Usage
//!
//! ```text
//! dial-bridge [OPTIONS]
//!
//! Options:
//!   --port <PORT>          WebSocket listener port [default: 9030]
//!   --bind <ADDR>          Bind address [default: 0.0.0.0]
//!   --device-name <PREFIX> Only connect to devices whose name starts with PREFIX
//!   --config <PATH>        TOML config file (flags override it)
//!   --simulate             Use the built-in simulated dial
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable                 | Meaning                     |
//! |--------------------------|-----------------------------|
//! | `DIAL_RELAY_PORT`        | WebSocket listener port     |
//! | `DIAL_RELAY_BIND`        | Bind address                |
//! | `DIAL_RELAY_DEVICE_NAME` | Device name prefix filter   |
//! | `DIAL_RELAY_CONFIG`      | Config file path            |
//!
//! Log verbosity comes from `RUST_LOG`, falling back to the config file's
//! `log_level`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dial_core::DeviceDescriptor;

use dial_bridge::application::bridge::RelayBridge;
use dial_bridge::domain::config::RelayConfig;
use dial_bridge::domain::events::RelayEvent;
use dial_bridge::infrastructure::device::simulated::{
    DialProfile, SimulatedConnector, SimulatedDiscovery,
};
use dial_bridge::infrastructure::device::{DeviceConnector, DeviceDiscovery};
use dial_bridge::infrastructure::socket::WsServer;

// ── CLI ───────────────────────────────────────────────────────────────────────

/// WebSocket gesture relay for a BLE smart dial.
#[derive(Debug, Parser)]
#[command(
    name = "dial-bridge",
    about = "Relays smart-dial gestures to WebSocket clients and client text back to the dial's display",
    version
)]
struct Cli {
    /// TCP port for the WebSocket server.
    #[arg(long, env = "DIAL_RELAY_PORT")]
    port: Option<u16>,

    /// IP address to bind the WebSocket server to.
    #[arg(long, env = "DIAL_RELAY_BIND")]
    bind: Option<String>,

    /// Only connect to devices whose advertised name starts with this prefix.
    #[arg(long = "device-name", env = "DIAL_RELAY_DEVICE_NAME")]
    device_name: Option<String>,

    /// Path to a TOML config file.  CLI flags override its values.
    #[arg(long, env = "DIAL_RELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Run against the built-in simulated dial instead of a BLE transport.
    #[arg(long)]
    simulate: bool,
}

impl Cli {
    /// Resolves the layered configuration: file (or defaults), then flags.
    fn into_relay_config(self) -> anyhow::Result<(RelayConfig, bool)> {
        let mut config = RelayConfig::load(self.config.as_deref())
            .context("loading configuration file")?;

        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(bind) = self.bind {
            config.server.bind = bind;
        }
        if let Some(prefix) = self.device_name {
            config.device.name_prefix = Some(prefix);
        }
        Ok((config, self.simulate))
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (config, simulate) = cli.into_relay_config()?;

    // `RUST_LOG` wins; otherwise the config file's level applies.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    let bind_addr = config.ws_bind_addr().context("resolving bind address")?;
    info!(
        "dial relay starting — ws {}, device filter {:?}",
        bind_addr, config.device.name_prefix
    );

    // The single relay event channel: every asynchronous source sends, the
    // bridge loop is the only consumer.
    let (events_tx, events_rx) = mpsc::channel::<RelayEvent>(64);

    let (discovery, connector) = if simulate {
        info!("using the simulated dial (--simulate)");
        let descriptor = DeviceDescriptor::new("sim:00:00:00:00:01", "Dial Simulator");
        let discovery: Box<dyn DeviceDiscovery> = Box::new(SimulatedDiscovery::new(
            events_tx.clone(),
            descriptor,
            Duration::from_millis(500),
        ));
        let connector: Box<dyn DeviceConnector> = Box::new(SimulatedConnector::new(
            events_tx.clone(),
            DialProfile {
                gesture_interval: Some(Duration::from_secs(1)),
                ..DialProfile::default()
            },
        ));
        (discovery, connector)
    } else {
        anyhow::bail!(
            "no Bluetooth transport is linked into this build; run with --simulate, \
             or wire a DeviceDiscovery/DeviceConnector adapter \
             (see dial_bridge::infrastructure::device and the GATT profile in dial_core::ble)"
        );
    };

    let server = WsServer::new(bind_addr, events_tx.clone());
    let bridge = RelayBridge::new(
        config,
        discovery,
        connector,
        Box::new(server),
        events_rx,
    );

    // Ctrl-C becomes a Shutdown event, so teardown runs on the same loop as
    // everything else.
    let shutdown_tx = events_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            let _ = shutdown_tx.send(RelayEvent::Shutdown).await;
        }
    });

    bridge.run().await?;

    info!("dial relay stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_leave_overrides_unset() {
        let cli = Cli::parse_from(["dial-bridge"]);
        assert_eq!(cli.port, None);
        assert_eq!(cli.bind, None);
        assert_eq!(cli.device_name, None);
        assert!(!cli.simulate);
    }

    #[test]
    fn test_cli_port_override() {
        let cli = Cli::parse_from(["dial-bridge", "--port", "9000"]);
        assert_eq!(cli.port, Some(9000));
    }

    #[test]
    fn test_cli_simulate_flag() {
        let cli = Cli::parse_from(["dial-bridge", "--simulate"]);
        assert!(cli.simulate);
    }

    #[test]
    fn test_into_relay_config_defaults() {
        let cli = Cli::parse_from(["dial-bridge"]);
        let (config, simulate) = cli.into_relay_config().unwrap();
        assert_eq!(config, RelayConfig::default());
        assert!(!simulate);
    }

    #[test]
    fn test_into_relay_config_applies_flag_overrides() {
        let cli = Cli::parse_from([
            "dial-bridge",
            "--port",
            "9000",
            "--bind",
            "127.0.0.1",
            "--device-name",
            "Dial",
        ]);
        let (config, _) = cli.into_relay_config().unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.bind, "127.0.0.1");
        assert_eq!(config.device.name_prefix.as_deref(), Some("Dial"));
    }

    #[test]
    fn test_into_relay_config_missing_file_is_an_error() {
        let cli = Cli::parse_from(["dial-bridge", "--config", "/nonexistent/relay.toml"]);
        assert!(cli.into_relay_config().is_err());
    }

    #[test]
    fn test_bind_addr_resolution_from_overrides() {
        let cli = Cli::parse_from(["dial-bridge", "--port", "9000", "--bind", "127.0.0.1"]);
        let (config, _) = cli.into_relay_config().unwrap();
        assert_eq!(
            config.ws_bind_addr().unwrap().to_string(),
            "127.0.0.1:9000"
        );
    }
}
