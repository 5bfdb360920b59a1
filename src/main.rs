use adsbridge::services::logger::{LogLevel, Logger};
use adsbridge::services::settings::{normalize_api_version, parse_host_list, Settings};
use clap::Parser;

/// MCP server for the Meta Marketing API, speaking JSON-RPC over stdio.
#[derive(Parser)]
#[command(name = "adsbridge")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Graph API access token (overrides META_ACCESS_TOKEN)
    #[arg(long)]
    access_token: Option<String>,
    /// Graph API version, e.g. v21.0 (overrides META_API_VERSION)
    #[arg(long)]
    api_version: Option<String>,
    /// Comma-separated image host order (overrides ADS_IMAGE_HOSTS)
    #[arg(long)]
    image_hosts: Option<String>,
    /// error, warn, info or debug
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut settings = Settings::from_env();
    if let Some(token) = cli.access_token.filter(|t| !t.trim().is_empty()) {
        settings.access_token = Some(token.trim().to_string());
    }
    if let Some(version) = cli.api_version {
        settings.api_version = normalize_api_version(&version);
    }
    if let Some(hosts) = cli.image_hosts {
        settings.image_hosts = parse_host_list(&hosts);
    }
    let logger = Logger::new("adsbridge").with_level(LogLevel::parse(&cli.log_level));

    if let Err(err) = adsbridge::mcp::server::run_stdio(settings, logger.clone()).await {
        logger.error(
            "Server stopped",
            Some(&serde_json::json!({"code": err.code, "message": err.message})),
        );
        std::process::exit(1);
    }
}
