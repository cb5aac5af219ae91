//! enodeb-acsd main application

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use enodeb_acsd::{
    acs_server::AcsServer,
    config::AcsConfig,
    data_model::EnodebDataModel,
    desired_config::NoopPostprocessor,
    timer::TokioEventLoop,
    utils::setup_logging,
    Result,
};

#[derive(Parser)]
#[command(name = "enodeb-acsd")]
#[command(about = "TR-069/CWMP auto-configuration server for LTE eNodeB devices")]
#[command(version = enodeb_acsd::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the ACS daemon
    Start,
    /// Validate configuration
    ValidateConfig,
    /// Generate default configuration
    GenerateConfig {
        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_configuration(&cli).await?;
    let _log_guard = setup_logging(&config.logging)?;

    info!("Starting {} v{}", enodeb_acsd::NAME, enodeb_acsd::VERSION);
    info!("Description: {}", enodeb_acsd::DESCRIPTION);

    match &cli.command {
        Some(Commands::Start) | None => run_daemon(config).await,
        Some(Commands::ValidateConfig) => validate_configuration(&config).await,
        Some(Commands::GenerateConfig { output }) => generate_default_config(output.clone()).await,
    }
}

async fn load_configuration(cli: &Cli) -> Result<AcsConfig> {
    let config = if let Some(config_path) = &cli.config {
        info!("Loading configuration from: {}", config_path.display());
        AcsConfig::load_from_file(config_path)?
    } else {
        info!("No configuration file specified, trying environment variables");
        match AcsConfig::load_from_env() {
            Ok(config) => config,
            Err(_) => {
                info!("No environment configuration found, using defaults");
                AcsConfig::default_config()
            }
        }
    };

    config.validate()?;
    info!("Configuration loaded and validated successfully");

    Ok(config)
}

async fn run_daemon(config: AcsConfig) -> Result<()> {
    info!(
        address = %config.general.listen_address,
        port = config.general.listen_port,
        "initializing ACS server"
    );

    let server = AcsServer::new(
        config,
        Arc::new(EnodebDataModel::new()),
        Arc::new(NoopPostprocessor),
        Arc::new(TokioEventLoop),
    );

    // The CWMP wire codec and HTTP transport are out of scope for this
    // crate (see DESIGN.md); `AcsServer::dispatch` is the seam a transport
    // layer calls into per inbound SOAP envelope. Here we just keep the
    // server alive so its per-device actors can be driven by tests or an
    // embedding application.
    let server = Arc::new(server);
    tokio::signal::ctrl_c().await.map_err(|e| {
        enodeb_acsd::Error::internal(format!("failed to listen for shutdown signal: {}", e))
    })?;

    info!(devices = server.device_count(), "shutdown signal received");
    Ok(())
}

async fn validate_configuration(config: &AcsConfig) -> Result<()> {
    info!("Validating configuration...");

    config.validate()?;

    println!("Configuration is valid");
    println!("  Node ID: {}", config.general.node_id);
    println!("  Listen address: {}:{}", config.general.listen_address, config.general.listen_port);
    println!("  Periodic inform interval: {}s", config.general.periodic_inform_interval);
    println!("  PLMNs configured: {}", config.operator.plmns.len());
    println!(
        "  Timers: rem_wait={}s reboot_inform={}s post_reboot_settle={}s",
        config.timers.rem_wait_timeout, config.timers.reboot_inform_timeout, config.timers.post_reboot_settle
    );

    Ok(())
}

async fn generate_default_config(output_path: Option<PathBuf>) -> Result<()> {
    let config = AcsConfig::default_config();
    let toml_content = toml::to_string_pretty(&config)
        .map_err(|e| enodeb_acsd::Error::internal(format!("Failed to serialize config: {}", e)))?;

    match output_path {
        Some(path) => {
            std::fs::write(&path, toml_content)?;
            println!("Default configuration written to: {}", path.display());
        }
        None => {
            println!("{}", toml_content);
        }
    }

    Ok(())
}
