use anyhow::Result;

use crate::api::clients::system_disk_id;
use crate::api::traits::TimewebApi;
use crate::cli::BackupCommand;
use crate::commands::print_table;

/// Handles the `backup` command. Backups always target the server's system disk.
pub async fn handle_backup_command<T: TimewebApi>(command: BackupCommand, client: &T) -> Result<()> {
    match command {
        BackupCommand::List { vds } => {
            let disk_id = system_disk_id(client, vds).await?;
            let backups = client.list_backups(vds, disk_id).await?;
            if backups.is_empty() {
                println!("No backups for server {vds}.");
                return Ok(());
            }
            let rows: Vec<Vec<String>> = backups
                .iter()
                .map(|backup| {
                    vec![
                        backup.id.to_string(),
                        backup.name.clone(),
                        backup.status.clone(),
                        backup.size.to_string(),
                        backup
                            .created_at
                            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                            .unwrap_or_default(),
                        backup.comment.clone().unwrap_or_default(),
                    ]
                })
                .collect();
            print_table(
                &["ID", "NAME", "STATUS", "SIZE MB", "CREATED", "COMMENT"],
                &rows,
            );
            Ok(())
        }
        BackupCommand::Create { vds, comment } => {
            let disk_id = system_disk_id(client, vds).await?;
            client
                .create_backup(vds, disk_id, comment.as_deref())
                .await?;
            println!("Backup of server {vds} (disk {disk_id}) requested.");
            Ok(())
        }
        BackupCommand::Remove { vds, backup } => {
            let disk_id = system_disk_id(client, vds).await?;
            client.remove_backup(vds, disk_id, backup).await?;
            println!("Backup {backup} of server {vds} removed.");
            Ok(())
        }
    }
}
