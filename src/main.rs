//! Despertador - alarm state coordinator
//!
//! Keeps an alarm-clock device and its owner in sync without a push channel:
//! - the device reports `trigger` / `ack` and polls `status`
//! - the owner sends `stop` from the app
//! - `serve` runs the HTTP service both sides talk to

use std::time::Duration;

use anyhow::Result;
use clap::{CommandFactory, Parser};

use despertador::cli::{AlarmClient, Cli, Commands, ConfigCommands, Display, LogCommands};
use despertador::daemon;

/// Main entry point
#[tokio::main]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(&cli);

    // Execute command
    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
///
/// `RUST_LOG` wins; otherwise the service logs at `info` and client commands
/// only log warnings unless `--verbose` is given.
fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{fmt, EnvFilter};

    let serving = matches!(cli.command, Some(Commands::Serve(_)));
    let default_level = if cli.verbose || serving { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = fmt().with_env_filter(filter).with_target(false);
    if serving {
        builder.init();
    } else {
        builder.without_time().init();
    }
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    if cli.verbose {
        tracing::info!(server = %cli.server, "Verbose mode enabled");
    }

    let Some(command) = cli.command else {
        // No command provided, show help
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Serve(args) => {
            daemon::run(args.to_config(), daemon::shutdown_signal()).await?;
        }
        Commands::Trigger(args) => {
            let response = client(&cli.server)?.trigger(&args.device_id).await?;
            Display::show_alarm_result(&args.device_id, &response);
        }
        Commands::Stop(args) => {
            let response = client(&cli.server)?.request_stop(&args.device_id).await?;
            Display::show_alarm_result(&args.device_id, &response);
        }
        Commands::Ack(args) => {
            let response = client(&cli.server)?.acknowledge(&args.device_id).await?;
            Display::show_alarm_result(&args.device_id, &response);
        }
        Commands::Status(args) => {
            let response = client(&cli.server)?.status(&args.device_id).await?;
            Display::show_status(&args.device_id, &response);
        }
        Commands::Watch(args) => {
            let client = client(&cli.server)?;
            let health = client.health().await?;
            Display::show_health(&health);

            let acknowledged = client
                .watch(
                    &args.device_id,
                    Duration::from_millis(args.interval_ms),
                    args.max_polls,
                    |poll, outcome| Display::show_poll(&args.device_id, poll, outcome),
                )
                .await?;
            Display::show_watch_summary(&args.device_id, acknowledged);
        }
        Commands::Config(ConfigCommands::Get(args)) => {
            let response = client(&cli.server)?.get_config(&args.device_id).await?;
            Display::show_config(&response);
        }
        Commands::Config(ConfigCommands::Set(args)) => {
            let response = client(&cli.server)?
                .update_config(&args.device_id, &args.to_update())
                .await?;
            Display::show_config(&response);
        }
        Commands::Log(LogCommands::Add(args)) => {
            let response = client(&cli.server)?.append_log(&args.to_entry()).await?;
            Display::show_log_recorded(&response);
        }
        Commands::Log(LogCommands::List(args)) => {
            let response = client(&cli.server)?
                .list_logs(args.device_id.as_deref(), args.to_query())
                .await?;
            Display::show_logs(&response);
        }
        Commands::Completions { shell } => {
            generate_completions(shell);
        }
    }

    Ok(())
}

/// Creates a client for the configured server URL.
fn client(server: &str) -> Result<AlarmClient> {
    Ok(AlarmClient::with_server_url(server)?)
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================
