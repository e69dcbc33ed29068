use flowcalc::{api, config};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // RUST_LOG wins, otherwise info
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stdout)
        .with_target(false)
        .init();

    info!("Flow calculator starting...");

    let cfg = config::load()?;
    info!("  Network: {} (chain {})", cfg.network.name, cfg.network.chain_id);
    info!("  Buffer time: {}s", cfg.buffer_time_seconds);
    info!("  Minimum balance: {} wei", cfg.minimum_balance_wei);
    info!("  Port: {}", cfg.port);

    let api_handle = tokio::spawn(api::serve(cfg));

    tokio::select! {
        res = api_handle => match res {
            Ok(Ok(_)) => info!("API exited cleanly"),
            Ok(Err(e)) => error!("API error: {:?}", e),
            Err(e) => error!("API task panicked: {:?}", e),
        },
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received, stopping...");
        }
    }

    info!("Flow calculator stopped.");
    Ok(())
}
