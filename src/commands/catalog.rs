use anyhow::Result;

use crate::api::traits::TimewebApi;
use crate::api::types::{DbPreset, OsImage, VdsPreset};
use crate::cli::{OsCommand, PresetsCommand};
use crate::commands::print_table;

pub async fn handle_balance_command<T: TimewebApi>(client: &T) -> Result<()> {
    let finances = client.get_balance().await?;
    println!("Balance: {:.2} {}", finances.balance, finances.currency);
    if let Some(cost) = finances.monthly_cost {
        println!("Monthly cost: {:.2} {}", cost, finances.currency);
    }
    if let Some(hours) = finances.hours_left {
        println!("Enough for: {} days ({hours} hours)", hours / 24);
    }
    Ok(())
}

pub async fn handle_os_command<T: TimewebApi>(command: OsCommand, client: &T) -> Result<()> {
    match command {
        OsCommand::List => {
            let images = client.list_os().await?;
            print_table(&["ID", "FAMILY", "NAME", "VERSION"], &os_rows(&images));
            Ok(())
        }
    }
}

pub async fn handle_presets_command<T: TimewebApi>(
    command: PresetsCommand,
    client: &T,
) -> Result<()> {
    match command {
        PresetsCommand::Vds => {
            let presets = client.list_vds_presets().await?;
            print_table(
                &["ID", "PRICE", "CPU", "RAM MB", "DISK MB", "DESCRIPTION"],
                &vds_preset_rows(&presets),
            );
        }
        PresetsCommand::Db => {
            let presets = client.list_db_presets().await?;
            print_table(
                &["ID", "PRICE", "TYPE", "DESCRIPTION"],
                &db_preset_rows(&presets),
            );
        }
    }
    Ok(())
}

fn os_rows(images: &[OsImage]) -> Vec<Vec<String>> {
    images
        .iter()
        .map(|os| {
            vec![
                os.id.to_string(),
                os.family.clone(),
                os.name.clone(),
                os.version.clone(),
            ]
        })
        .collect()
}

fn vds_preset_rows(presets: &[VdsPreset]) -> Vec<Vec<String>> {
    presets
        .iter()
        .map(|p| {
            vec![
                p.id.to_string(),
                format!("{:.2}", p.price),
                p.cpu.to_string(),
                p.ram.to_string(),
                p.disk.to_string(),
                p.description_short.clone(),
            ]
        })
        .collect()
}

fn db_preset_rows(presets: &[DbPreset]) -> Vec<Vec<String>> {
    presets
        .iter()
        .map(|p| {
            vec![
                p.id.to_string(),
                format!("{:.2}", p.price),
                p.db_type.clone(),
                p.description_short.clone(),
            ]
        })
        .collect()
}
