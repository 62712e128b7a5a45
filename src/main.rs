mod api;
mod auth;
mod cli;
mod commands;
mod config;
mod error;
mod progress;

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::api::clients::LiveApiClient;
use crate::api::polling::PollSettings;
use crate::auth::{AuthClient, TerminalPrompt};
use crate::config::{AppConfig, ConfigFile, ConfigOperations};

fn init_tracing(verbose: u8) {
    let default_filter = match verbose {
        0 => "twvds=warn",
        1 => "twvds=info",
        _ => "twvds=debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Command-line flags win over the config file.
fn poll_settings(cli: &Cli, app_config: &AppConfig) -> PollSettings {
    let interval = cli
        .poll_interval_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| app_config.poll_interval());
    let timeout = match cli.timeout {
        Some(0) => None,
        Some(secs) => Some(Duration::from_secs(secs)),
        None => app_config.poll_timeout(),
    };
    PollSettings {
        interval,
        timeout,
        ..Default::default()
    }
}

/// Authenticates once for this invocation and builds the API client.
async fn get_client(config_file: &ConfigFile, app_config: &AppConfig) -> Result<LiveApiClient> {
    let base_url = app_config.api_url()?;
    let exchanger = AuthClient::new(&base_url)?;
    let auth = auth::bootstrap(config_file, &exchanger, &TerminalPrompt).await?;
    debug!(%base_url, "authenticated");
    Ok(LiveApiClient::new(&base_url, &auth)?)
}

/// Dispatches one command. The config file is only read by commands that use it.
async fn run(cli: Cli, config_file: &ConfigFile) -> Result<()> {
    if let Commands::Completion(args) = &cli.command {
        return commands::completion::handle_completion_command(args.shell);
    }
    if let Commands::Logout = cli.command {
        return commands::login::logout(config_file).await;
    }

    let app_config = config_file.load_config().await?;
    let settings = poll_settings(&cli, &app_config);
    debug!(path = ?config_file.path(), ?settings, "configuration loaded");

    match cli.command {
        Commands::Login => {
            let exchanger = AuthClient::new(&app_config.api_url()?)?;
            commands::login::login(config_file, &exchanger, &TerminalPrompt).await?;
        }
        Commands::Logout | Commands::Completion(_) => {}
        Commands::Balance => {
            let client = get_client(config_file, &app_config).await?;
            commands::catalog::handle_balance_command(&client).await?;
        }
        Commands::Vds(args) => {
            let client = get_client(config_file, &app_config).await?;
            commands::vds::handle_vds_command(args.command, &client, &settings).await?;
        }
        Commands::Backup(args) => {
            let client = get_client(config_file, &app_config).await?;
            commands::backup::handle_backup_command(args.command, &client).await?;
        }
        Commands::Db(args) => {
            let client = get_client(config_file, &app_config).await?;
            commands::db::handle_db_command(args.command, &client, &settings).await?;
        }
        Commands::Os(args) => {
            let client = get_client(config_file, &app_config).await?;
            commands::catalog::handle_os_command(args.command, &client).await?;
        }
        Commands::Presets(args) => {
            let client = get_client(config_file, &app_config).await?;
            commands::catalog::handle_presets_command(args.command, &client).await?;
        }
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_file = ConfigFile::default_location()?;
    run(cli, &config_file).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PollSection;

    #[test]
    fn test_poll_settings_precedence() {
        let app_config = AppConfig {
            poll: Some(PollSection {
                interval_ms: Some(250),
                timeout_secs: Some(60),
            }),
            ..Default::default()
        };

        let cli = Cli::parse_from(["twvds", "vds", "list"]);
        let settings = poll_settings(&cli, &app_config);
        assert_eq!(settings.interval, Duration::from_millis(250));
        assert_eq!(settings.timeout, Some(Duration::from_secs(60)));

        let cli = Cli::parse_from(["twvds", "--timeout", "0", "--poll-interval-ms", "10", "vds", "list"]);
        let settings = poll_settings(&cli, &app_config);
        assert_eq!(settings.interval, Duration::from_millis(10));
        assert_eq!(settings.timeout, None);
    }

    #[tokio::test]
    async fn test_completion_ignores_malformed_config() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_file = ConfigFile::at(temp_dir.path());
        std::fs::create_dir_all(config_file.path().parent().unwrap()).unwrap();
        std::fs::write(config_file.path(), "{ not json").unwrap();

        let cli = Cli::parse_from(["twvds", "completion", "bash"]);
        run(cli, &config_file).await.unwrap();

        let cli = Cli::parse_from(["twvds", "balance"]);
        let err = run(cli, &config_file).await.unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse config file"));
    }
}
