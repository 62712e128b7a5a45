pub mod backup;
pub mod catalog;
pub mod completion;
pub mod db;
pub mod login;
pub mod vds;

use std::io::{BufRead, Write};

use anyhow::Result;

use crate::api::types::Server;
use crate::error::AppError;
use crate::progress::Spinner;

/// Builds the spinner shown while an operation converges.
pub type SpinnerFactory = fn(&str) -> Spinner;

/// Prints `prompt`, then reads one trimmed line.
pub fn ask<R: BufRead + ?Sized>(input: &mut R, prompt: &str) -> Result<String> {
    print!("{prompt}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Lists the servers and asks which one to act on.
pub fn choose_server<R: BufRead + ?Sized>(servers: &[Server], input: &mut R) -> Result<u64> {
    if servers.is_empty() {
        return Err(AppError::InvalidArgs("no servers found; pass a server ID".to_string()).into());
    }
    print_servers(servers);
    let answer = ask(input, "Server ID: ")?;
    let id: u64 = answer
        .parse()
        .map_err(|_| AppError::InvalidArgs(format!("'{answer}' is not a server ID")))?;
    if !servers.iter().any(|server| server.id == id) {
        return Err(AppError::InvalidArgs(format!("server {id} is not in the list")).into());
    }
    Ok(id)
}

pub fn print_servers(servers: &[Server]) {
    let rows: Vec<Vec<String>> = servers
        .iter()
        .map(|server| {
            vec![
                server.id.to_string(),
                crate::api::types::status_label(&server.status).to_string(),
                server.name.clone(),
                server.ip.clone().unwrap_or_default(),
                server.configuration.cpu.to_string(),
                server.configuration.ram.to_string(),
                server.configuration.disk_size.to_string(),
            ]
        })
        .collect();
    print_table(
        &["ID", "STATE", "NAME", "IP", "CPU", "RAM MB", "DISK MB"],
        &rows,
    );
}

/// Prints rows under left-aligned headers, each column as wide as its widest cell.
pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let header_line: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(header, &width)| format!("{header:<width$}"))
        .collect();
    println!("{}", header_line.join(" ").trim_end());
    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    println!("{}", rule.join(" "));

    for row in rows {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect();
        println!("{}", line.join(" ").trim_end());
    }
}
