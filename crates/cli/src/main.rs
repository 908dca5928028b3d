use anyhow::Context;
use bookshelf_kernel::Settings;
use clap::{Parser, Subcommand};

/// Book, user, and comment REST API
#[derive(Debug, Parser)]
#[command(name = "bookshelf", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Connect to the record store and serve the HTTP API
    Serve,
    /// Verify configuration and record store connectivity, then exit
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load bookshelf settings")?;
    bookshelf_telemetry::init(&settings.telemetry)?;

    match cli.command {
        Command::Serve => {
            tracing::info!(
                env = ?settings.environment,
                port = settings.server.port,
                "bookshelf serve starting"
            );
            bookshelf_app::run(settings).await
        }
        Command::Check => {
            let store = bookshelf_app::connect_store(&settings).await?;
            store
                .ping()
                .await
                .context("record store did not answer ping")?;
            println!("record store reachable");
            Ok(())
        }
    }
}
