use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = chargectl::cli::Cli::parse();

    let default_filter = if cli.verbose {
        "chargectl=debug"
    } else {
        "chargectl=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let exit_code = chargectl::run(cli).await;
    std::process::exit(exit_code);
}
