use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::infra::config::{Config, Mode, Overrides};

#[derive(Parser)]
#[command(name = "minecraft-mcp-bot")]
#[command(about = "Minecraft bot exposed as MCP tools")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub opts: GlobalOpts,
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Flags shared by every subcommand; they override file and environment settings.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Minecraft server host
    #[arg(long, global = true)]
    pub host: Option<String>,
    /// Minecraft server port
    #[arg(long, global = true)]
    pub port: Option<u16>,
    /// Bot username
    #[arg(long, global = true)]
    pub username: Option<String>,
    /// MCP transport
    #[arg(long, global = true, value_enum)]
    pub mode: Option<Mode>,
    /// Port for the streamable HTTP transport
    #[arg(long, global = true)]
    pub http_port: Option<u16>,
    /// Address of the game-client bridge
    #[arg(long = "bridge", global = true)]
    pub bridge_addr: Option<String>,
    /// TOML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

impl From<&GlobalOpts> for Overrides {
    fn from(o: &GlobalOpts) -> Self {
        Overrides {
            config_file: o.config.clone(),
            host: o.host.clone(),
            port: o.port,
            username: o.username.clone(),
            mode: o.mode,
            http_port: o.http_port,
            bridge_addr: o.bridge_addr.clone(),
        }
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Join the game and serve MCP (default)
    Serve,
    /// Resolve and print the effective configuration
    Validate,
    /// Health check a running HTTP-mode server
    Health {
        /// Service URL to check
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,
    },
    /// Show service status and the local configuration
    Status {
        /// Service URL to check
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,
    },
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();

    run_commands(&cli.opts, cli.command.unwrap_or(Commands::Serve)).await
}

pub async fn run_commands(opts: &GlobalOpts, command: Commands) -> ExitCode {
    match command {
        Commands::Serve => {
            let cfg = match Config::load(&opts.into()) {
                Ok(cfg) => cfg,
                Err(e) => {
                    tracing::error!("Invalid configuration: {e}");
                    return ExitCode::FAILURE;
                }
            };
            match crate::infra::boot::run_server(cfg).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    tracing::error!("Fatal error: {e:#}");
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Validate => match validate_config(opts) {
            Ok(rendered) => {
                println!("✅ Configuration is valid\n\n{rendered}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Configuration validation failed: {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Health { url } => match health_check(&url).await {
            Ok(_) => {
                println!("✅ Service is healthy");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Health check failed: {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Status { url } => match show_status(&url, opts).await {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("❌ Status check failed: {}", e);
                ExitCode::FAILURE
            }
        },
    }
}

async fn health_check(url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/healthz", url))
        .timeout(std::time::Duration::from_millis(500))
        .send()
        .await?;

    if response.status().is_success() {
        Ok(())
    } else {
        Err(format!("HTTP {}", response.status()).into())
    }
}

/// Returns the resolved configuration rendered as TOML.
fn validate_config(opts: &GlobalOpts) -> Result<String, Box<dyn std::error::Error>> {
    let cfg = Config::load(&opts.into())?;
    Ok(toml::to_string_pretty(&cfg)?)
}

async fn show_status(url: &str, opts: &GlobalOpts) -> Result<(), Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();

    let health_response = client
        .get(format!("{}/healthz", url))
        .timeout(std::time::Duration::from_secs(5))
        .send()
        .await?;

    println!(
        "🏥 Health Status: {}",
        if health_response.status().is_success() {
            "✅ Healthy"
        } else {
            "❌ Unhealthy"
        }
    );

    let init_response = client
        .post(format!("{}/mcp", url))
        .header("content-type", "application/json")
        .header("accept", "application/json, text/event-stream")
        .json(&serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "protocolVersion": "2025-03-26",
                "capabilities": {},
                "clientInfo": { "name": "minecraft-mcp-bot-cli", "version": env!("CARGO_PKG_VERSION") }
            }
        }))
        .timeout(std::time::Duration::from_millis(500))
        .send()
        .await;

    match init_response {
        Ok(resp) if resp.status().is_success() => {
            println!("🔧 MCP endpoint: ✅ Available");
        }
        Ok(resp) => {
            println!("🔧 MCP endpoint: ❌ HTTP {}", resp.status());
        }
        Err(_) => {
            println!("🔧 MCP endpoint: ❌ Unavailable");
        }
    }

    println!("\n📋 Local configuration:");
    match Config::load(&opts.into()) {
        Ok(cfg) => {
            println!("  Mode: {}", cfg.mcp.mode);
            println!(
                "  Minecraft: {}:{} as {}",
                cfg.server.host, cfg.server.port, cfg.server.username
            );
            println!("  Bridge: {}", cfg.bridge.addr);
        }
        Err(e) => println!("  ❌ {e}"),
    }
    println!(
        "  Log Level: {}",
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into())
    );

    Ok(())
}
