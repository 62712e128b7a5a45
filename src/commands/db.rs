use anyhow::{Context, Result};
use tracing::info;

use crate::api::polling::{Convergence, PollSettings, Resource, wait_for};
use crate::api::traits::TimewebApi;
use crate::api::types::{CreateDatabaseRequest, DB_STATUS_STARTED};
use crate::cli::DbCommand;
use crate::commands::{SpinnerFactory, print_table};
use crate::progress::Spinner;

const DEFAULT_HASH_TYPE: &str = "caching_sha2";

/// Handles the `db` command.
pub async fn handle_db_command<T: TimewebApi>(
    command: DbCommand,
    client: &T,
    settings: &PollSettings,
) -> Result<()> {
    handle_db_command_with_progress(command, client, settings, Spinner::new).await
}

pub async fn handle_db_command_with_progress<T: TimewebApi>(
    command: DbCommand,
    client: &T,
    settings: &PollSettings,
    spinner: SpinnerFactory,
) -> Result<()> {
    match command {
        DbCommand::List => {
            let databases = client.list_databases().await?;
            if databases.is_empty() {
                println!("No databases found.");
                return Ok(());
            }
            let rows: Vec<Vec<String>> = databases
                .iter()
                .map(|db| {
                    vec![
                        db.id.to_string(),
                        db.status.clone(),
                        db.name.clone(),
                        db.db_type.clone(),
                        db.host.clone().unwrap_or_default(),
                        db.login.clone().unwrap_or_default(),
                    ]
                })
                .collect();
            print_table(&["ID", "STATUS", "NAME", "TYPE", "HOST", "LOGIN"], &rows);
            Ok(())
        }
        DbCommand::Create {
            name,
            db_type,
            preset,
            login,
            password,
        } => {
            let password = match password {
                Some(password) => password,
                None => rpassword::prompt_password("Database password: ")
                    .context("Failed to read database password")?,
            };
            let request = CreateDatabaseRequest {
                login: login.unwrap_or_else(|| name.clone()),
                name,
                password,
                db_type,
                hash_type: DEFAULT_HASH_TYPE.to_string(),
                preset_id: preset,
            };
            let id = client.create_database(&request).await?;
            info!(id, "database creation accepted");
            println!("Creating database '{}' with ID {id}.", request.name);
            let progress = spinner(&format!("Provisioning database {id}..."));
            wait_for(
                client,
                Resource::Database(id),
                Convergence::Status(DB_STATUS_STARTED),
                settings,
                &progress,
            )
            .await?;
            println!("Database {id} is started.");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::clients::tests::{FakeApiClient, Step};
    use std::time::Duration;

    #[tokio::test]
    async fn test_create_waits_for_started() {
        let client = FakeApiClient {
            clone_id: 3,
            ..FakeApiClient::with_db_script(&[Step::Status("creating"), Step::Status("started")])
        };
        let settings = PollSettings {
            interval: Duration::ZERO,
            timeout: None,
            max_attempts: Some(10),
            ..Default::default()
        };

        handle_db_command_with_progress(
            DbCommand::Create {
                name: "shop".to_string(),
                db_type: "mysql".to_string(),
                preset: 1,
                login: None,
                password: Some("secret".to_string()),
            },
            &client,
            &settings,
            |_| Spinner::hidden(),
        )
        .await
        .unwrap();

        assert_eq!(client.recorded_actions(), vec!["create db shop"]);
        assert_eq!(client.fetch_count(), 2);
    }
}
