use anyhow::Result;
use clap::Parser;
use serde_json::json;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use ugreen_exporter::{config::Config, entities::registry::Cadence, nas::UgreenNas, server};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/Default.toml")]
    config: String,

    /// NAS host (overrides config)
    #[arg(long, env = "UGREEN_HOST")]
    nas_host: Option<String>,

    /// NAS username (overrides config)
    #[arg(long, env = "UGREEN_USERNAME")]
    nas_username: Option<String>,

    /// NAS password (overrides config)
    #[arg(long, env = "UGREEN_PASSWORD", hide_env_values = true)]
    nas_password: Option<String>,

    /// Port to listen on for metrics
    #[arg(short, long, env = "EXPORTER_PORT", default_value = "9100")]
    port: u16,

    /// Address to bind to
    #[arg(short, long, env = "EXPORTER_ADDR", default_value = "0.0.0.0")]
    addr: String,

    /// Discover and refresh once, print the values as JSON and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!(
        "Starting UGREEN NAS Prometheus Exporter v{}",
        env!("CARGO_PKG_VERSION")
    );

    let args = Args::parse();

    let mut config = Config::load(&args.config)?;

    if let Some(host) = args.nas_host {
        config.nas.host = host;
    }
    if let Some(username) = args.nas_username {
        config.nas.username = username;
    }
    if let Some(password) = args.nas_password {
        config.nas.password = secrecy::SecretString::new(password.into());
    }
    config.server.port = args.port;
    config.server.addr = args.addr;

    info!("Configuration loaded successfully");
    info!("NAS: {}", config.nas.base_url());

    if args.once {
        let nas = UgreenNas::connect(&config.nas).await?;
        let report = json!({
            "capabilities": nas.capabilities(),
            "config": nas.refresh(Cadence::Config).await,
            "state": nas.refresh(Cadence::State).await,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    info!(
        "Metrics endpoint: http://{}:{}/metrics",
        config.server.addr, config.server.port
    );

    if let Err(e) = server::start(config).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
