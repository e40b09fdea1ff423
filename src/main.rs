use clap::Parser;
use mcumgr_serial_bridge::config::{Config, ConfigError, ConfigLoader, LogFormat};
use mcumgr_serial_bridge::{
    logging, Bridge, BridgeError, BridgeOptions, ChannelAdapter, SerialChannel,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Bridge a microcontroller's serial console to stdout and its mcumgr frames \
             to a pseudo-terminal.",
    long_about = "Reads the device's UART, prints console text to stdout and serves mcumgr \
                  frames on a pseudo-terminal whose path is printed at startup. Point the \
                  mcumgr client at that path; its requests are written to the device unchanged."
)]
struct Args {
    /// Serial device connected to the microcontroller.
    #[arg(short, long)]
    device: Option<String>,

    /// Serial baud rate.
    #[arg(short, long)]
    baud: Option<u32>,

    /// UDP port reserved for the network-facing mcumgr bridge.
    #[arg(short, long)]
    port: Option<u16>,

    /// Configuration file; skips the default search locations.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter directive, e.g. "debug" or "mcumgr=info,warn".
    #[arg(long)]
    log_level: Option<String>,

    /// Log output format.
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

impl Args {
    /// File and environment first, then flags on top.
    fn load_config(&self) -> Result<Config, ConfigError> {
        let loader = match self.config {
            Some(ref path) => ConfigLoader::load_from(path)?,
            None => ConfigLoader::load()?,
        };
        let mut config = loader.into_config();

        if let Some(ref device) = self.device {
            config.serial.device = device.clone();
        }
        if let Some(baud) = self.baud {
            config.serial.baud_rate = baud;
        }
        if let Some(port) = self.port {
            config.bridge.udp_port = port;
        }
        if let Some(ref level) = self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    logging::init_logging(&config.logging);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "bridge stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<(), BridgeError> {
    let endpoint = open_endpoint(&config)?;
    println!("Use {} for pty", endpoint.name());

    let serial = SerialChannel::open(&config.serial.device, config.serial.port_configuration())
        .map_err(BridgeError::SerialOpen)?;
    info!(
        device = %config.serial.device,
        baud = config.serial.baud_rate,
        udp_port = config.bridge.udp_port,
        "serial device open"
    );

    let bridge = Bridge::new(Box::new(serial), endpoint, BridgeOptions::from(&config));
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    let mut task =
        tokio::task::spawn_blocking(move || bridge.run(&mut std::io::stdout(), flag));

    tokio::select! {
        res = &mut task => {
            res??;
        }
        _ = shutdown_signal() => {
            // The demux loop notices within one serial read timeout.
            shutdown.store(true, Ordering::Relaxed);
            task.await??;
        }
    }

    Ok(())
}

#[cfg(unix)]
fn open_endpoint(config: &Config) -> Result<Box<dyn ChannelAdapter>, BridgeError> {
    let pty = mcumgr_serial_bridge::PtyChannel::open(config.bridge.endpoint_timeout())
        .map_err(BridgeError::EndpointOpen)?;
    Ok(Box::new(pty))
}

#[cfg(not(unix))]
fn open_endpoint(_config: &Config) -> Result<Box<dyn ChannelAdapter>, BridgeError> {
    Err(BridgeError::EndpointOpen(
        mcumgr_serial_bridge::ChannelError::config("pseudo-terminals require a unix host"),
    ))
}

// --- Graceful Shutdown Handler ---
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("signal received, shutting down");
}
