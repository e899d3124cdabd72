// ABOUTME: Command-line interface definitions using clap
// ABOUTME: Defines the subcommand tree and global connection flags with env fallbacks

use crate::auth::SessionArgs;
use crate::model::{BackupAction, BackupListType, PermissionLevel, RestoreType};
use crate::util::parse_key_value;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "bsm")]
#[command(about = "Command-line client for Bedrock Server Manager", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Manager base URL, e.g. http://127.0.0.1:11325
    #[arg(long, global = true, env = "BSM_BASE_URL")]
    pub base_url: Option<String>,

    /// Bearer token (overrides stored session)
    #[arg(long, global = true, env = "BSM_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    #[arg(long, global = true, env = "BSM_USERNAME")]
    pub username: Option<String>,

    #[arg(long, global = true, env = "BSM_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Override config file location
    #[arg(long, global = true, env = "BSM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "BSM_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Skip TLS certificate verification
    #[arg(long, global = true, env = "BSM_NO_VERIFY_SSL")]
    pub no_verify_ssl: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn session_args(&self) -> SessionArgs {
        SessionArgs {
            base_url: self.base_url.clone(),
            token: self.token.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            no_verify_ssl: self.no_verify_ssl,
            timeout_secs: self.timeout,
        }
    }

    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "bsm=debug,bsm_client=debug",
            _ => "trace",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ServerArg {
    /// Target server name
    #[arg(short, long = "server")]
    pub server: String,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Log in and out of the manager
    #[command(subcommand)]
    Auth(AuthCommand),

    /// Manage server instances
    #[command(subcommand)]
    Server(ServerCommand),

    /// Create, list, restore and prune backups
    #[command(subcommand)]
    Backup(BackupCommand),

    /// Export, reset and install worlds
    #[command(subcommand)]
    World(WorldCommand),

    /// Install addons
    #[command(subcommand)]
    Addon(AddonCommand),

    /// List content archives available to the manager
    #[command(subcommand)]
    Content(ContentCommand),

    /// Manage the global player list
    #[command(subcommand)]
    Player(PlayerCommand),

    /// Manage a server's allowlist
    #[command(subcommand)]
    Allowlist(AllowlistCommand),

    /// Manage a server's player permissions
    #[command(subcommand)]
    Permissions(PermissionsCommand),

    /// Manage global manager settings
    #[command(subcommand)]
    Settings(SettingsCommand),

    /// Manage plugins
    #[command(subcommand)]
    Plugin(PluginCommand),

    /// Manager info and resource monitoring
    #[command(subcommand)]
    System(SystemCommand),

    /// Manage the download cache
    #[command(subcommand)]
    Downloads(DownloadsCommand),
}

#[derive(Subcommand, Debug, Clone)]
pub enum AuthCommand {
    /// Log in and store the session token
    Login,
    /// Log out and forget the stored token
    Logout,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ServerCommand {
    /// List all servers
    List,
    /// Show running status, version and process info
    Status(ServerArg),
    Start(ServerArg),
    Stop(ServerArg),
    Restart(ServerArg),
    /// Check for and apply updates
    Update(ServerArg),
    /// Delete all data for a server
    Delete {
        #[command(flatten)]
        target: ServerArg,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Install a new server instance
    Install {
        /// Name for the new server
        name: String,
        /// LATEST, PREVIEW or a specific version
        #[arg(long = "server-version", default_value = "LATEST")]
        version: String,
        /// Replace an existing server with the same name
        #[arg(long)]
        overwrite: bool,
        /// Return right after the install is queued
        #[arg(long)]
        no_wait: bool,
    },
    /// Send a console command to a running server
    SendCommand {
        #[command(flatten)]
        target: ServerArg,
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
    /// Show server.properties
    Properties(ServerArg),
    /// Update server.properties entries (key=value)
    SetProperty {
        #[command(flatten)]
        target: ServerArg,
        #[arg(required = true, value_parser = parse_key_value)]
        properties: Vec<(String, String)>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum BackupCommand {
    List {
        #[command(flatten)]
        target: ServerArg,
        /// world, properties, allowlist or permissions
        #[arg(long = "type", default_value = "world")]
        backup_type: BackupListType,
    },
    Create {
        #[command(flatten)]
        target: ServerArg,
        /// world, config or all
        #[arg(long = "type", default_value = "all")]
        backup_type: BackupAction,
        /// Config file to back up when type is config
        #[arg(long)]
        file: Option<String>,
    },
    /// Restore a backup file, or the latest of everything with --type all
    Restore {
        #[command(flatten)]
        target: ServerArg,
        #[arg(long = "type")]
        restore_type: RestoreType,
        #[arg(long)]
        file: Option<String>,
    },
    /// Prune old backups using the manager's retention settings
    Prune(ServerArg),
}

#[derive(Subcommand, Debug, Clone)]
pub enum WorldCommand {
    Export(ServerArg),
    Reset {
        #[command(flatten)]
        target: ServerArg,
        #[arg(short, long)]
        yes: bool,
    },
    Install {
        #[command(flatten)]
        target: ServerArg,
        /// World archive name from `bsm content worlds`
        file: String,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum AddonCommand {
    Install {
        #[command(flatten)]
        target: ServerArg,
        /// Addon archive name from `bsm content addons`
        file: String,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ContentCommand {
    Worlds,
    Addons,
}

#[derive(Subcommand, Debug, Clone)]
pub enum PlayerCommand {
    /// Scan server logs for players
    Scan,
    List,
    /// Add players as Name:XUID
    Add {
        #[arg(required = true)]
        players: Vec<String>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum AllowlistCommand {
    List(ServerArg),
    Add {
        #[command(flatten)]
        target: ServerArg,
        #[arg(required = true)]
        players: Vec<String>,
        /// Let these players join even when the server is full
        #[arg(long)]
        ignore_limit: bool,
    },
    Remove {
        #[command(flatten)]
        target: ServerArg,
        #[arg(required = true)]
        players: Vec<String>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum PermissionsCommand {
    List(ServerArg),
    Set {
        #[command(flatten)]
        target: ServerArg,
        #[arg(long)]
        xuid: String,
        /// visitor, member or operator
        #[arg(long)]
        level: PermissionLevel,
        #[arg(long)]
        name: Option<String>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum SettingsCommand {
    List,
    /// Set a setting; the value is parsed as JSON when possible
    Set { key: String, value: String },
    Reload,
}

#[derive(Subcommand, Debug, Clone)]
pub enum PluginCommand {
    List,
    Enable { name: String },
    Disable { name: String },
    Reload,
    /// Fire a custom plugin event with an optional JSON object payload
    TriggerEvent {
        event: String,
        #[arg(long)]
        payload: Option<String>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum SystemCommand {
    /// Show manager version and OS
    Info,
    /// Poll CPU and memory usage of a server until Ctrl+C
    Monitor {
        #[command(flatten)]
        target: ServerArg,
        /// Seconds between refreshes
        #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u64).range(1..))]
        interval: u64,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum DownloadsCommand {
    Prune {
        /// Directory on the manager host to prune
        directory: String,
        /// Number of newest archives to keep
        #[arg(long)]
        keep: Option<u32>,
    },
}
