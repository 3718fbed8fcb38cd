//! CLI entry point - the composition root.

use clap::{CommandFactory, Parser};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use vani_cli::handlers::{self, read::ReadArgs};
use vani_cli::{Cli, CliError, Commands};
use vani_voice::{PlaybackConfig, load_config};

/// Priority: `--verbose` > `RUST_LOG` > default (warn).
fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("vani_voice=debug,vani_cli=debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact(),
        )
        .try_init()?;
    Ok(())
}

async fn dispatch(config: PlaybackConfig, command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Detect { text, file } => {
            handlers::detect::execute(text, file.as_deref())?;
        }
        Commands::Voices {
            ready_after,
            no_voices,
        } => {
            handlers::voices::execute(config, ready_after, no_voices).await?;
        }
        Commands::Read {
            source,
            rate,
            voice,
            from,
            no_interactive,
            ready_after,
        } => {
            let args = ReadArgs {
                source,
                rate,
                voice,
                from,
                interactive: !no_interactive,
                ready_after,
            };
            handlers::read::execute(config, args).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config = match cli.config.as_deref().map(load_config).transpose() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            let e = CliError::from(e);
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    };

    if let Err(e) = dispatch(config, command).await {
        tracing::debug!(error = ?e, "Command failed");
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
    Ok(())
}
