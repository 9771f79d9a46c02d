mod bootstrap;
mod server;
mod supervisor;
mod systemd;

use bootstrap::{init_logging, load_config};
use clap::{Parser, Subcommand};
use dnsward_domain::Config;
use tracing::error;

#[derive(Parser)]
#[command(name = "dnsward")]
#[command(version)]
#[command(about = "DNS-over-TLS forwarder with blocklist filtering for a LAN")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to the configuration file.
    #[arg(long, default_value = "config.json", global = true)]
    config: String,
}

#[derive(Subcommand)]
enum Command {
    /// Run the resolver.
    Run,
    /// Write a default configuration file and exit.
    WriteDefaultConfig,
    /// Render a systemd unit file to stdout and exit.
    WriteSystemdUnitFile,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run => {
            let config = load_config(&cli.config)?;
            init_logging(&config);

            if let Err(error) = supervisor::run(config).await {
                error!(%error, "dnsward exited with an error");
                return Err(error);
            }

            Ok(())
        }
        Command::WriteDefaultConfig => {
            Config::write_default(&cli.config)?;
            println!("wrote default configuration to {}", cli.config);
            Ok(())
        }
        Command::WriteSystemdUnitFile => {
            let exe_path = std::env::current_exe()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|_| "/usr/local/bin/dnsward".to_string());
            print!("{}", systemd::render_unit_file(&exe_path));
            Ok(())
        }
    }
}
