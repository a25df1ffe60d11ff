use clap::Parser;
use nnue_eval::cli::{Cli, Commands};
use nnue_eval::types::config::Config;
use nnue_eval::EvalResult;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> EvalResult<()> {
    let cli = Cli::parse();

    // Load configuration first (no logging yet)
    let config = if cli.config.exists() {
        Config::load(&cli.config).unwrap_or_else(|_| Config::default_config())
    } else {
        Config::default_config()
    };

    // Determine log level: CLI flags take precedence over config
    let log_level = if cli.quiet {
        "error".to_string()
    } else if cli.verbose {
        "debug".to_string()
    } else {
        config.general.log_level.clone()
    };

    let filter = EnvFilter::from_default_env().add_directive(
        format!("nnue_eval={}", log_level)
            .parse()
            .unwrap_or_else(|_| "nnue_eval=info".parse().expect("fallback directive is valid")),
    );

    if config.general.log_format == "json" {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }

    tracing::debug!("Configuration loaded from: {}", cli.config.display());

    match cli.command {
        Commands::Init { path } => {
            nnue_eval::cli::commands::init(path)?;
        }
        Commands::Inspect { file, json } => {
            nnue_eval::cli::commands::inspect(&file, json)?;
        }
        Commands::Verify { file } => {
            nnue_eval::cli::commands::verify(file, &config)?;
        }
        Commands::Export { from, output } => {
            nnue_eval::cli::commands::export(from, output, &config)?;
        }
        Commands::Version => {
            nnue_eval::cli::commands::version();
        }
    }

    Ok(())
}
