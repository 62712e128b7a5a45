use std::io::BufRead;

use anyhow::Result;
use tracing::info;

use crate::api::clients::resolve_group_id;
use crate::api::polling::{Convergence, PollSettings, Resource, wait_for};
use crate::api::traits::TimewebApi;
use crate::api::types::{CreateVdsRequest, VDS_STATUS_OFF, VDS_STATUS_ON, status_label};
use crate::cli::VdsCommand;
use crate::commands::{SpinnerFactory, ask, choose_server, print_servers};
use crate::error::AppError;
use crate::progress::Spinner;

/// Handles the `vds` command against stdin and a visible spinner.
pub async fn handle_vds_command<T: TimewebApi>(
    command: VdsCommand,
    client: &T,
    settings: &PollSettings,
) -> Result<()> {
    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    handle_vds_command_with_io(command, client, settings, &mut input, Spinner::new).await
}

/// Internal function that accepts injected input and progress rendering.
pub async fn handle_vds_command_with_io<T: TimewebApi, R: BufRead>(
    command: VdsCommand,
    client: &T,
    settings: &PollSettings,
    input: &mut R,
    spinner: SpinnerFactory,
) -> Result<()> {
    match command {
        VdsCommand::List => list(client).await,
        VdsCommand::Show { id } => show(client, id).await,
        VdsCommand::Start { id } => {
            let id = resolve_id(client, id, input).await?;
            client.start_vds(id).await?;
            println!("Start requested for server {id}.");
            let progress = spinner(&format!("Starting server {id}..."));
            wait_for(
                client,
                Resource::Vds(id),
                Convergence::Status(VDS_STATUS_ON),
                settings,
                &progress,
            )
            .await?;
            println!("Server {id} is running.");
            Ok(())
        }
        VdsCommand::Stop { id } => {
            let id = resolve_id(client, id, input).await?;
            client.stop_vds(id).await?;
            println!("Shutdown requested for server {id}.");
            let progress = spinner(&format!("Stopping server {id}..."));
            wait_for(
                client,
                Resource::Vds(id),
                Convergence::Status(VDS_STATUS_OFF),
                settings,
                &progress,
            )
            .await?;
            println!("Server {id} is stopped.");
            Ok(())
        }
        VdsCommand::Clone { id } => {
            let id = resolve_id(client, id, input).await?;
            let new_id = client.clone_vds(id).await?;
            println!("Cloning server {id} into new server {new_id}.");
            let progress = spinner(&format!("Waiting for clone {new_id}..."));
            wait_for(
                client,
                Resource::Vds(new_id),
                Convergence::Status(VDS_STATUS_ON),
                settings,
                &progress,
            )
            .await?;
            println!("Clone {new_id} of server {id} is running.");
            Ok(())
        }
        VdsCommand::Remove { id, yes } => {
            let id = resolve_id(client, id, input).await?;
            if !yes {
                let answer = ask(input, &format!("Delete server {id}? [y/N] "))?;
                if !matches!(answer.to_lowercase().as_str(), "y" | "yes") {
                    println!("Aborted.");
                    return Ok(());
                }
            }
            client.remove_vds(id).await?;
            println!("Removal requested for server {id}.");
            let progress = spinner(&format!("Removing server {id}..."));
            wait_for(client, Resource::Vds(id), Convergence::Absent, settings, &progress).await?;
            println!("Server {id} has been removed.");
            Ok(())
        }
        VdsCommand::Create {
            name,
            os,
            preset,
            comment,
        } => {
            let group_id = resolve_group_id(client).await?;
            let request = CreateVdsRequest {
                name,
                comment,
                os_id: os,
                preset_id: preset,
                group_id,
                is_local_network: false,
            };
            let new_id = client.create_vds(&request).await?;
            info!(new_id, group_id, "server creation accepted");
            println!("Creating server '{}' with ID {new_id}.", request.name);
            let progress = spinner(&format!("Provisioning server {new_id}..."));
            wait_for(
                client,
                Resource::Vds(new_id),
                Convergence::Status(VDS_STATUS_ON),
                settings,
                &progress,
            )
            .await?;
            println!("Server {new_id} is running.");
            Ok(())
        }
    }
}

/// Uses the given id, or asks the user to pick one from the server list.
async fn resolve_id<T: TimewebApi, R: BufRead>(
    client: &T,
    id: Option<u64>,
    input: &mut R,
) -> Result<u64> {
    match id {
        Some(id) => Ok(id),
        None => {
            let servers = client.list_vds().await?;
            choose_server(&servers, input)
        }
    }
}

async fn list<T: TimewebApi>(client: &T) -> Result<()> {
    let servers = client.list_vds().await?;
    if servers.is_empty() {
        println!("No servers found.");
        return Ok(());
    }
    print_servers(&servers);
    Ok(())
}

async fn show<T: TimewebApi>(client: &T, id: u64) -> Result<()> {
    let server = client
        .get_vds(id)
        .await?
        .ok_or_else(|| AppError::InvalidArgs(format!("server {id} not found")))?;

    println!("ID:      {}", server.id);
    println!("Name:    {}", server.name);
    println!("State:   {}", status_label(&server.status));
    println!("IP:      {}", server.ip.as_deref().unwrap_or("-"));
    println!("CPU:     {}", server.configuration.cpu);
    println!("RAM:     {} MB", server.configuration.ram);
    println!("Disk:    {} MB", server.configuration.disk_size);
    if let Some(comment) = server.comment.as_deref().filter(|c| !c.is_empty()) {
        println!("Comment: {comment}");
    }
    Ok(())
}
