use clap::Parser;
use conditional_dns_application::ports::DnsCachePort;
use conditional_dns_domain::CliOverrides;
use conditional_dns_infrastructure::dns::cache::coarse_clock;
use std::time::Duration;
use tracing::info;

mod bootstrap;
mod di;
mod server;

#[derive(Parser)]
#[command(name = "conditional-dns")]
#[command(version)]
#[command(about = "Conditional DNS forwarder - splits queries between a filtering and an unfiltered upstream")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// DNS listen port
    #[arg(long)]
    port: Option<u16>,

    /// Serve DNS over UDP
    #[arg(long)]
    udp: bool,

    /// Serve DNS over TCP
    #[arg(long)]
    tcp: bool,

    /// Bind address
    #[arg(short = 'b', long)]
    bind: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Also write logs to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<String>,

    /// Validate the configuration and exit
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cli_overrides = CliOverrides {
        port: cli.port,
        bind_address: cli.bind.clone(),
        udp: cli.udp,
        tcp: cli.tcp,
        log_level: cli.log_level.clone(),
        log_file: cli.log_file.clone(),
    };

    let config = bootstrap::load_config(cli.config.as_deref(), cli_overrides)?;

    if cli.check_config {
        println!("Configuration OK");
        return Ok(());
    }

    let _log_guard = bootstrap::init_logging(&config.logging)?;

    info!("Starting conditional-dns v{}", env!("CARGO_PKG_VERSION"));

    let dns_services = di::DnsServices::new(&config)?;

    tokio::spawn(async {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        loop {
            interval.tick().await;
            coarse_clock::tick();
        }
    });

    tokio::select! {
        result = server::start_dns_server(&config.server, dns_services.handler.clone()) => {
            result?;
        }
        _ = server::shutdown_signal() => {
            info!("Shutting down DNS listeners");
        }
    }

    if let Some(cache) = &dns_services.cache {
        let metrics = cache.cache_metrics_snapshot();
        info!(
            entries = metrics.total_entries,
            hits = metrics.hits,
            misses = metrics.misses,
            evictions = metrics.evictions,
            coalesced = metrics.coalesced,
            hit_rate = format!("{:.1}%", metrics.hit_rate),
            "Cache statistics"
        );
    }

    info!("Server shutdown complete");
    Ok(())
}
