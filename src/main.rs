/// Main entry point for the Yahoo! map MCP server
///
/// This file sets up logging, parses command line arguments, and starts the
/// server on the selected transport (HTTP by default, or stdio).

use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use yahoo_map_mcp::upstream::{
    DEFAULT_GEOCODE_URL, DEFAULT_LOCAL_SEARCH_URL, DEFAULT_REVERSE_GEOCODE_URL,
};
use yahoo_map_mcp::{AppConfig, Transport, UpstreamEndpoints, YahooMapServer};

/// Command line arguments for the Yahoo! map MCP server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Transport to serve MCP on
    #[arg(long, value_enum, default_value_t = Transport::Http)]
    transport: Transport,

    /// Address to bind the HTTP server to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port for the HTTP server
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// Comma-separated CORS origins (any origin when unset)
    #[arg(long, env = "ALLOWED_ORIGINS", value_delimiter = ',')]
    allowed_origins: Vec<String>,

    /// Timeout for each map API request, in seconds
    #[arg(long, default_value_t = 10)]
    upstream_timeout_secs: u64,

    #[arg(long, default_value = DEFAULT_LOCAL_SEARCH_URL)]
    local_search_url: String,

    #[arg(long, default_value = DEFAULT_GEOCODE_URL)]
    geocode_url: String,

    #[arg(long, default_value = DEFAULT_REVERSE_GEOCODE_URL)]
    reverse_geocode_url: String,

    /// Idle time after which a paging session is forgotten, in seconds
    #[arg(long, default_value_t = 300, value_parser = clap::value_parser!(i64).range(1..))]
    paging_ttl_secs: i64,

    /// How often expired paging sessions are swept, in seconds
    #[arg(long, default_value_t = 60)]
    sweep_interval_secs: u64,

    /// Yahoo! application id used by the stdio transport
    #[arg(long, env = "YAHOO_APP_ID", hide_env_values = true)]
    api_key: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose output (implies debug)
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn into_config(self) -> AppConfig {
        AppConfig {
            transport: self.transport,
            host: self.host,
            port: self.port,
            allowed_origins: self
                .allowed_origins
                .into_iter()
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            upstream_timeout: Duration::from_secs(self.upstream_timeout_secs),
            endpoints: UpstreamEndpoints {
                local_search: self.local_search_url,
                geocode: self.geocode_url,
                reverse_geocode: self.reverse_geocode_url,
            },
            paging_ttl: chrono::Duration::seconds(self.paging_ttl_secs),
            sweep_interval: Duration::from_secs(self.sweep_interval_secs),
            api_key: self.api_key,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Set up logging based on command line flags
    let log_level = if args.verbose {
        "debug"
    } else if args.debug {
        "info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("yahoo_map_mcp={},tower_http={}", log_level, log_level))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr) // Send logs to stderr, not stdout
        .init();

    let config = args.into_config();
    info!(transport = ?config.transport, "Starting Yahoo! map MCP server");

    let server = YahooMapServer::new(config)?;
    server.run().await?;

    info!("Yahoo! map MCP server shutdown complete");
    Ok(())
}
