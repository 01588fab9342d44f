use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use amppkg::{load_config, HttpServer, Packager};

#[derive(Parser)]
#[command(name = "amppkg")]
#[command(about = "AMP signed-exchange packager", long_about = None)]
struct Args {
    /// Path to the config toml file.
    #[arg(long, default_value = "amppkg.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "amppkg=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = load_config(&args.config)
        .with_context(|| format!("loading config from {}", args.config.display()))?;

    tracing::info!(
        port = config.port,
        local_only = config.local_only,
        packager_base = %config.packager_base,
        url_sets = config.url_set.len(),
        "configuration loaded"
    );

    let cert_pem = fs::read_to_string(&config.cert_file)
        .with_context(|| format!("reading CertFile {}", config.cert_file))?;
    let key_pem = fs::read_to_string(&config.key_file)
        .with_context(|| format!("reading KeyFile {}", config.key_file))?;
    let packager = Packager::new(&config, &cert_pem, &key_pem)?;

    let addr: IpAddr = if config.local_only {
        Ipv4Addr::LOCALHOST.into()
    } else {
        Ipv4Addr::UNSPECIFIED.into()
    };
    let listener = TcpListener::bind((addr, config.port))
        .await
        .with_context(|| format!("binding to {addr}:{}", config.port))?;

    HttpServer::new(packager).run(listener).await?;

    tracing::info!("shutdown complete");
    Ok(())
}
