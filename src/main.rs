//! presence-light binary entry point.

use presence_light::cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse_args();
    let config = cli.config.as_deref();

    let result = match cli.command {
        Commands::Run(args) => presence_light::cli::run::handle_run(config, args).await,
        Commands::Login => presence_light::cli::auth::handle_login(config).await,
        Commands::Logout => presence_light::cli::auth::handle_logout(config).await,
        Commands::Settings => presence_light::cli::run::handle_settings(config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
