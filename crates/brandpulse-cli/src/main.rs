mod render;
mod report;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::report::ReportArgs;

#[derive(Debug, Parser)]
#[command(name = "brandpulse")]
#[command(about = "Brand reputation report from news and social sentiment")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch, score and summarize coverage of a brand
    Report(ReportArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("usage: brandpulse report --brand <NAME>  (see --help for options)");
        return Ok(());
    };

    dotenvy::dotenv().ok();
    let config = brandpulse_core::load_app_config_from_env()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match command {
        Commands::Report(args) => report::run_report(&config, &args).await?,
    }

    Ok(())
}
