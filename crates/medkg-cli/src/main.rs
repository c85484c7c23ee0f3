use std::process::ExitCode;

use clap::Parser;
use medkg_cli::{load_dotenv, tracing_setup, try_main, Cli};

#[tokio::main]
async fn main() -> color_eyre::Result<ExitCode> {
    color_eyre::install()?;
    load_dotenv(None);
    let cli = Cli::parse();
    let _guard = tracing_setup::init_tracing()?;
    try_main(cli).await
}
