use clap::Parser;
use presentation::cli::{ChatApp, Cli};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr; stdout carries only chat output.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!("banter v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let mut app = ChatApp::new()?;
    app.run(cli).await?;
    Ok(())
}
