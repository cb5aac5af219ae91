//! enodebd-acsctl - operator CLI for a running ACS daemon

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "enodebd-acsctl")]
#[command(about = "Operator CLI for enodeb-acsd")]
#[command(version = enodeb_acsd::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// ACS management host to connect to
    #[arg(short = 'H', long, default_value = "localhost")]
    host: String,

    /// Management port
    #[arg(short, long, default_value = "48080")]
    port: u16,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a device's current state and status
    Status {
        /// Device identifier
        device_id: String,
    },
    /// Force a device through an immediate reboot cycle
    ForceReboot {
        /// Device identifier
        device_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Status { device_id } => show_status(&cli, device_id).await,
        Commands::ForceReboot { device_id } => force_reboot(&cli, device_id).await,
    }
}

// These commands connect to a running daemon's management endpoint, which
// is outside this crate's scope (see DESIGN.md); they report what they
// would do against `AcsServer::dispatch`/`force_reboot` once a transport
// is wired in.

async fn show_status(cli: &Cli, device_id: &str) -> Result<(), Box<dyn std::error::Error>> {
    println!(
        "Would query status for device '{}' at {}:{} (management API not wired up)",
        device_id, cli.host, cli.port
    );
    Ok(())
}

async fn force_reboot(cli: &Cli, device_id: &str) -> Result<(), Box<dyn std::error::Error>> {
    println!(
        "Would force reboot for device '{}' at {}:{} (management API not wired up)",
        device_id, cli.host, cli.port
    );
    Ok(())
}
