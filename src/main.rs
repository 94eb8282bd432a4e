use anyhow::Result;
use clap::Parser;
use homebudget::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    homebudget::logging::init_tracing(cli.verbose);
    cli.run().await
}
