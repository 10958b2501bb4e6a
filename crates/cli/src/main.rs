use clap::{Parser, Subcommand};

mod commands;

use commands::PopulateArgs;

#[derive(Parser)]
#[command(name = "footprint")]
#[command(about = "Order-flow footprint aggregation for OHLCV candles", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Populate candles with order-flow computed from trades
    Populate(PopulateArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Populate(args) => {
            commands::run_populate(&args)?;
        }
    }

    Ok(())
}
