use clap::Parser;
use eris::cli::{Cli, Commands};
use eris::types::config::Config;
use eris::ErisResult;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> ErisResult<()> {
    let cli = Cli::parse();

    // Load configuration first (no logging yet)
    let config = if cli.config.exists() {
        Config::load(&cli.config).unwrap_or_else(|e| {
            eprintln!("Invalid configuration ({}), using defaults", e);
            Config::default_config()
        })
    } else {
        Config::default_config()
    };

    // CLI flags take precedence over config
    let log_level = if cli.quiet {
        "error".to_string()
    } else if cli.verbose {
        "debug".to_string()
    } else {
        config.general.log_level.clone()
    };

    let filter = match format!("eris={}", log_level).parse() {
        Ok(directive) => EnvFilter::from_default_env().add_directive(directive),
        Err(_) => EnvFilter::new("eris=info"),
    };

    let (text_layer, json_layer) = if config.general.log_format == "json" {
        (None, Some(fmt::layer().json().with_writer(std::io::stderr)))
    } else {
        (Some(fmt::layer().with_writer(std::io::stderr)), None)
    };

    tracing_subscriber::registry()
        .with(text_layer)
        .with(json_layer)
        .with(filter)
        .init();

    tracing::debug!("Configuration loaded from: {}", cli.config.display());

    match cli.command {
        Commands::Init { path } => {
            eris::cli::commands::init(path).await?;
        }
        Commands::Chat => {
            eris::cli::commands::chat(&config).await?;
        }
        Commands::Ask {
            text,
            rating,
            reply,
        } => {
            eris::cli::commands::ask(&text, rating, reply, &config).await?;
        }
        Commands::Teach { input, reply } => {
            eris::cli::commands::teach(&input, &reply, &config).await?;
        }
        Commands::Rules { limit } => {
            eris::cli::commands::rules(limit, &config).await?;
        }
        Commands::Seed => {
            eris::cli::commands::seed(&config).await?;
        }
        Commands::Export { output } => {
            eris::cli::commands::export_rules(&output, &config).await?;
        }
        Commands::Import { input, overwrite } => {
            eris::cli::commands::import_rules(&input, overwrite, &config).await?;
        }
        Commands::Config => {
            eris::cli::commands::config_cmd(&cli.config).await?;
        }
        Commands::Version => {
            eris::cli::commands::version();
        }
    }

    Ok(())
}
