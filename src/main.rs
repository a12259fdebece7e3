use clap::Parser;
use std::process;
use stockwise::Cli;
use tracing_subscriber::EnvFilter;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(err) = stockwise::run(cli) {
        eprintln!("Error: {:#}", err);
        process::exit(1);
    }
}
