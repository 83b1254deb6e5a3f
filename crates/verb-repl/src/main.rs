use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

fn main() -> miette::Result<()> {
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!("cli: {cli:?}");

    cli.run()
}
