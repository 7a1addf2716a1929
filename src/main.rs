use clap::Parser;
use poly_sentinel::cli::{config_report, thresholds_report, Cli, Commands};
use poly_sentinel::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
            eprintln!("Using default configuration");
            let mut config = Config::default();
            config.apply_env_overrides(|key| std::env::var(key).ok())?;
            config
        }
    };

    // Initialize telemetry
    let _telemetry = poly_sentinel::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            tracing::info!("Starting monitoring mode");
            args.execute(&config).await?;
        }
        Commands::Scan(args) => {
            tracing::info!("Running single scan");
            args.execute(&config).await?;
        }
        Commands::Thresholds => {
            println!("Detection thresholds:");
            println!("{}", thresholds_report(&config));
        }
        Commands::Config => {
            println!("Current configuration:");
            println!("{}", config_report(&config));
        }
    }

    Ok(())
}
