use clap::{ArgAction, Parser, Subcommand};
use clap_complete::Shell;

/// Manage Timeweb Cloud servers and databases from the terminal.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Delay between status checks while waiting for an operation to finish
    #[arg(long, global = true, value_name = "MS")]
    pub poll_interval_ms: Option<u64>,

    /// Give up waiting for an operation after this many seconds (0 waits forever)
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Store new credentials, replacing any saved ones
    Login,

    /// Forget the saved credentials
    Logout,

    /// Show the account balance
    Balance,

    /// Manage virtual servers
    Vds(VdsArgs),

    /// Manage server backups
    Backup(BackupArgs),

    /// Manage databases
    Db(DbArgs),

    /// Browse the OS image catalog
    Os(OsArgs),

    /// Show pricing presets
    Presets(PresetsArgs),

    /// Generate shell completions
    Completion(CompletionArgs),
}

// --- Argument Structs ---

#[derive(Parser, Debug)]
pub struct VdsArgs {
    #[command(subcommand)]
    pub command: VdsCommand,
}

#[derive(Subcommand, Debug)]
pub enum VdsCommand {
    /// List all servers
    List,
    /// Show details of a single server
    Show {
        /// Server ID
        id: u64,
    },
    /// Start a server and wait until it is running
    Start {
        /// Server ID; chosen interactively when omitted
        id: Option<u64>,
    },
    /// Shut down a server and wait until it is stopped
    Stop {
        /// Server ID; chosen interactively when omitted
        id: Option<u64>,
    },
    /// Clone a server and wait until the copy is running
    Clone {
        /// Server ID; chosen interactively when omitted
        id: Option<u64>,
    },
    /// Delete a server and wait until it is gone
    Remove {
        /// Server ID; chosen interactively when omitted
        id: Option<u64>,
        /// Do not ask for confirmation
        #[arg(long, short)]
        yes: bool,
    },
    /// Create a server and wait until it is running
    Create {
        /// Server name
        #[arg(long)]
        name: String,
        /// OS image ID (see `os list`)
        #[arg(long)]
        os: u64,
        /// Preset ID (see `presets vds`)
        #[arg(long)]
        preset: u64,
        /// Free-form comment
        #[arg(long)]
        comment: Option<String>,
    },
}

#[derive(Parser, Debug)]
pub struct BackupArgs {
    #[command(subcommand)]
    pub command: BackupCommand,
}

#[derive(Subcommand, Debug)]
pub enum BackupCommand {
    /// List backups of a server's system disk
    List {
        /// Server ID
        vds: u64,
    },
    /// Take a backup of a server's system disk
    #[command(alias = "snapshot")]
    Create {
        /// Server ID
        vds: u64,
        /// Comment stored with the backup
        #[arg(long)]
        comment: Option<String>,
    },
    /// Delete a backup
    Remove {
        /// Server ID
        vds: u64,
        /// Backup ID
        backup: u64,
    },
}

#[derive(Parser, Debug)]
pub struct DbArgs {
    #[command(subcommand)]
    pub command: DbCommand,
}

#[derive(Subcommand, Debug)]
pub enum DbCommand {
    /// List all databases
    List,
    /// Create a database and wait until it is started
    Create {
        /// Database name
        #[arg(long)]
        name: String,
        /// Engine, e.g. "mysql5", "mysql", "postgres"
        #[arg(long = "type")]
        db_type: String,
        /// Preset ID (see `presets db`)
        #[arg(long)]
        preset: u64,
        /// Database user; defaults to the database name
        #[arg(long)]
        login: Option<String>,
        /// Database password; prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
}

#[derive(Parser, Debug)]
pub struct OsArgs {
    #[command(subcommand)]
    pub command: OsCommand,
}

#[derive(Subcommand, Debug)]
pub enum OsCommand {
    /// List available OS images
    List,
}

#[derive(Parser, Debug)]
pub struct PresetsArgs {
    #[command(subcommand)]
    pub command: PresetsCommand,
}

#[derive(Subcommand, Debug)]
pub enum PresetsCommand {
    /// Server presets
    Vds,
    /// Database presets
    Db,
}

#[derive(Parser, Debug)]
pub struct CompletionArgs {
    /// The shell to generate completions for
    #[clap(value_enum)]
    pub shell: Shell,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_start_with_and_without_id() {
        let cli = Cli::parse_from(["twvds", "vds", "start", "42"]);
        match cli.command {
            Commands::Vds(VdsArgs {
                command: VdsCommand::Start { id },
            }) => assert_eq!(id, Some(42)),
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = Cli::parse_from(["twvds", "vds", "start"]);
        assert!(matches!(
            cli.command,
            Commands::Vds(VdsArgs {
                command: VdsCommand::Start { id: None }
            })
        ));
    }

    #[test]
    fn test_global_poll_flags() {
        let cli = Cli::parse_from([
            "twvds",
            "vds",
            "remove",
            "7",
            "--yes",
            "--timeout",
            "0",
            "--poll-interval-ms",
            "500",
            "-vv",
        ]);
        assert_eq!(cli.timeout, Some(0));
        assert_eq!(cli.poll_interval_ms, Some(500));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_snapshot_alias() {
        let cli = Cli::parse_from(["twvds", "backup", "snapshot", "42"]);
        assert!(matches!(
            cli.command,
            Commands::Backup(BackupArgs {
                command: BackupCommand::Create { vds: 42, .. }
            })
        ));
    }

    #[test]
    fn test_non_numeric_id_is_rejected() {
        assert!(Cli::try_parse_from(["twvds", "vds", "stop", "web-1"]).is_err());
    }
}
