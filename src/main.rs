//! Rota Client - Entry Point
//!
//! Fetches every URL given on the command line through the configured proxy
//! pool, then prints the pool health as JSON. Ctrl+C cancels outstanding work.

use anyhow::Context;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rota_client::{ClientConfig, ProxyClient, RotaError};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let urls: Vec<String> = std::env::args().skip(1).collect();
    if urls.is_empty() {
        anyhow::bail!("usage: rota-client <url>...");
    }

    let config = ClientConfig::from_env().context("failed to load configuration")?;
    info!(
        "Configuration loaded: {} proxies, budget {}",
        config.proxies.len(),
        config.retry_budget
    );

    let client = ProxyClient::new(config).context("failed to build client")?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Shutdown signal received, cancelling requests");
            on_signal.cancel();
        }
    });

    for url in &urls {
        let request = client
            .request(http::Method::GET, url)
            .with_context(|| format!("invalid URL {}", url))?;

        match client.execute_with_cancel(request, &cancel).await {
            Ok(response) => println!(
                "{} {} via {} ({} bytes)",
                response.status(),
                url,
                response.proxy().unwrap_or("direct"),
                response.bytes().len()
            ),
            Err(RotaError::Cancelled) => {
                println!("{} cancelled", url);
                break;
            }
            Err(e) => {
                error!("Request to {} failed: {}", url, e);
                println!("{} failed: {}", url, e);
            }
        }
    }

    if !client.is_direct() {
        let snapshot = serde_json::to_string_pretty(&client.health_snapshot())
            .context("failed to serialize health snapshot")?;
        println!("{}", snapshot);
    }

    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "rota_client=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
